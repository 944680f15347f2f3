// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! meshxfer CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use meshxfer::anchor::{extract_islands, largest_island};
use meshxfer::cli::{init_logging, Reporter};
use meshxfer::config::{AnchorConfig, EngineConfig, TransferDirection};
use meshxfer::io;
use meshxfer::pipeline::{PairSummary, TransferPipeline};
use meshxfer::transfer::{Report, ReportSink, Tee, TracingSink};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "meshxfer")]
#[command(about = "Cross-mesh correspondence and attribute transfer", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./meshxfer.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    RiggedToCache,
    RiggedToRigged,
}

impl From<Direction> for TransferDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::RiggedToCache => TransferDirection::RiggedToCache,
            Direction::RiggedToRigged => TransferDirection::RiggedToRigged,
        }
    }
}

#[derive(clap::Args)]
struct MatchArgs {
    /// Model pair kind
    #[arg(short, long, value_enum)]
    direction: Option<Direction>,

    /// Target-to-source scale factor
    #[arg(short, long)]
    scale: Option<f64>,

    /// Run matching on all cores
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair the objects of a scene snapshot and print the pairing
    Match {
        /// Scene snapshot (JSON)
        scene: PathBuf,

        #[command(flatten)]
        args: MatchArgs,
    },

    /// Transfer materials, UVs and weights, then place the face locator
    Transfer {
        /// Scene snapshot(s) (JSON)
        #[arg(required = true)]
        scenes: Vec<PathBuf>,

        /// Output scene (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output directory for batch runs
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        #[command(flatten)]
        args: MatchArgs,

        /// Skip material and UV transfer
        #[arg(long)]
        no_materials: bool,

        /// Skip UV transfer
        #[arg(long)]
        no_uv: bool,

        /// Skip weight transfer
        #[arg(long)]
        no_weights: bool,

        /// Remove stale target groups first
        #[arg(long)]
        purge: bool,

        /// Locator object to re-parent to the face anchor
        #[arg(long)]
        locator: Option<String>,

        /// Vertex group marking the face (defaults to the locator's bone)
        #[arg(long, requires = "locator")]
        face_group: Option<String>,

        /// Source face object (found automatically when omitted)
        #[arg(long, requires = "locator")]
        face_object: Option<String>,
    },

    /// List the islands of an object's vertex group
    Islands {
        /// Scene snapshot (JSON)
        scene: PathBuf,

        /// Object id
        #[arg(short, long)]
        object: String,

        /// Vertex group; vertices weighted 1.0 are the candidates (all vertices when omitted)
        #[arg(short, long)]
        group: Option<String>,

        /// Look the object up in the target model
        #[arg(long)]
        target: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Match { scene, args } => {
            let config = apply_match_args(load_config(cli.config.as_deref())?, &args);
            match_command(&scene, config, cli.verbose)?;
        }
        Commands::Transfer {
            scenes,
            output,
            out_dir,
            summary,
            args,
            no_materials,
            no_uv,
            no_weights,
            purge,
            locator,
            face_group,
            face_object,
        } => {
            let mut config = apply_match_args(load_config(cli.config.as_deref())?, &args);
            config.transfer_materials &= !no_materials;
            config.transfer_uv &= !no_uv;
            config.transfer_weights &= !no_weights;
            config.purge_stale_groups |= purge;
            if let Some(locator) = locator {
                let mut anchor = config.anchor.take().unwrap_or_else(|| AnchorConfig::new(&locator));
                anchor.locator = locator;
                anchor.face_group = face_group.or(anchor.face_group);
                anchor.face_object = face_object.or(anchor.face_object);
                config.anchor = Some(anchor);
            }
            config.validate()?;

            if scenes.len() > 1 && output.is_some() {
                bail!("--output takes a single scene; use --out-dir for batches");
            }
            let outputs: Vec<PathBuf> = scenes
                .iter()
                .map(|s| output.clone().unwrap_or_else(|| output_path(s, out_dir.as_deref())))
                .collect();
            transfer_command(&scenes, &outputs, summary.as_deref(), config, cli.verbose)?;
        }
        Commands::Islands {
            scene,
            object,
            group,
            target,
        } => {
            islands_command(&scene, &object, group.as_deref(), target)?;
        }
        Commands::Version => {
            println!("meshxfer v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let mut config = EngineConfig::from_file(path)?;
            config.apply_env()?;
            Ok(config)
        }
        None => EngineConfig::load(),
    }
}

fn apply_match_args(mut config: EngineConfig, args: &MatchArgs) -> EngineConfig {
    if let Some(direction) = args.direction {
        config.direction = direction.into();
    }
    if let Some(scale) = args.scale {
        config.scale_factor = Some(scale);
    }
    config.parallel |= args.parallel;
    config
}

/// `<out_dir>/<name>` or `<stem>.transferred.json` beside the input
fn output_path(scene: &Path, out_dir: Option<&Path>) -> PathBuf {
    match (out_dir, scene.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => {
            let stem = scene
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scene".to_string());
            scene.with_file_name(format!("{}.transferred.json", stem))
        }
    }
}

fn match_command(scene_path: &Path, config: EngineConfig, verbose: bool) -> Result<()> {
    if verbose {
        Reporter::report_info(&format!(
            "Direction {}, scale {}",
            config.direction.as_str(),
            config.scale()
        ));
    }
    let scene = io::load_scene(scene_path)?;
    let pipeline = TransferPipeline::new(config);
    let mut report = Report::new();

    let start = Instant::now();
    let pairs = pipeline
        .match_objects(&scene, &mut report)
        .with_context(|| format!("Matching failed for {:?}", scene_path))?;
    let duration = start.elapsed();

    let summaries: Vec<PairSummary> = pairs
        .iter()
        .map(|pair| PairSummary::from_pair(pair, &scene))
        .collect();
    Reporter::report_pairs(&scene_path.display().to_string(), &summaries, duration);
    Reporter::report_warnings(report.warnings());
    Ok(())
}

fn transfer_command(
    scenes: &[PathBuf],
    outputs: &[PathBuf],
    summary_path: Option<&Path>,
    config: EngineConfig,
    verbose: bool,
) -> Result<()> {
    let pipeline = TransferPipeline::new(config);
    let progress = (scenes.len() > 1).then(|| Reporter::progress_bar(scenes.len()));
    let mut failed = 0;

    for (scene_path, output) in scenes.iter().zip(outputs) {
        if let Some(ref pb) = progress {
            pb.set_message(scene_path.display().to_string());
        }

        let mut report = Report::new();
        let start = Instant::now();
        let result = io::load_scene(scene_path).and_then(|mut scene| {
            let summary = if verbose {
                let mut tracing_sink = TracingSink;
                let mut tee = Tee {
                    first: &mut report,
                    second: &mut tracing_sink,
                };
                pipeline.run(&mut scene, &mut tee as &mut dyn ReportSink)?
            } else {
                pipeline.run(&mut scene, &mut report)?
            };
            io::save_scene(&scene, output)?;
            Ok(summary)
        });
        let duration = start.elapsed();

        match result {
            Ok(summary) => {
                if progress.is_none() {
                    Reporter::report_summary(&scene_path.display().to_string(), &summary, duration);
                    Reporter::report_warnings(report.warnings());
                    Reporter::success(&format!("Wrote {}", output.display()));
                }
                info!(scene = %scene_path.display(), output = %output.display(), "scene written");
                if let Some(path) = summary_path {
                    let path = if scenes.len() > 1 {
                        output.with_extension("summary.json")
                    } else {
                        path.to_path_buf()
                    };
                    io::save_summary(&summary, &path)?;
                }
            }
            Err(e) => {
                failed += 1;
                Reporter::report_error(&format!("{}: {:#}", scene_path.display(), e));
            }
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
        println!(
            "{} {}/{} scenes transferred",
            "Summary:".bold(),
            scenes.len() - failed,
            scenes.len()
        );
    }
    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn islands_command(scene_path: &Path, object: &str, group: Option<&str>, target: bool) -> Result<()> {
    let scene = io::load_scene(scene_path)?;
    let model = if target { &scene.target } else { &scene.source };
    let object = model
        .find(object)
        .with_context(|| format!("Object '{}' not found in {:?}", object, scene_path))?;

    let candidates: Vec<usize> = match group {
        Some(name) => {
            let g = object
                .mesh
                .group_index(name)
                .with_context(|| format!("Object '{}' has no group '{}'", object.id, name))?;
            object.mesh.vertices_with_weight(g, 1.0)
        }
        None => (0..object.mesh.vertex_count()).collect(),
    };

    let islands = extract_islands(&candidates, &object.mesh.faces);
    Reporter::report_islands(&object.id, &islands);
    if let Some(largest) = largest_island(&islands) {
        Reporter::report_info(&format!("Largest island: {} vertices", largest.len()));
    }
    Ok(())
}
