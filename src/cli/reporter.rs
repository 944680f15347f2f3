// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::matching::PairConfidence;
use crate::pipeline::{PairSummary, TransferSummary};
use crate::transfer::{Severity, Warning};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report the pairing table
    pub fn report_pairs(file: &str, pairs: &[PairSummary], duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Scene:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        for pair in pairs {
            let ratio = match pair.ratio {
                Some(r) => format!("{:.1}%", r * 100.0),
                None => "ordered".to_string(),
            };
            let confidence = Self::confidence_label(pair.confidence);
            println!(
                "  {} {} {}  {} {}",
                pair.source.cyan(),
                "→".bright_black(),
                pair.target.cyan(),
                ratio.bright_black(),
                confidence
            );
        }
        println!(
            "\n  {} {}   {} {}",
            "Pairs:".bright_black(),
            pairs.len().to_string().cyan(),
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report a full transfer run
    pub fn report_summary(file: &str, summary: &TransferSummary, duration: Duration) {
        Self::report_pairs(file, &summary.pairs, duration);

        println!("{}", "Transfer:".bold());
        println!(
            "  {} {}",
            "Faces matched:".bright_black(),
            summary.faces_matched().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Weights written:".bright_black(),
            summary.weights_written().to_string().cyan()
        );
        if summary.groups_purged > 0 {
            println!(
                "  {} {}",
                "Groups purged:".bright_black(),
                summary.groups_purged.to_string().yellow()
            );
        }
        if let Some(anchor) = &summary.anchor {
            println!(
                "  {} {} {:?} at ({:.4}, {:.4}, {:.4})",
                "Anchor:".bright_black(),
                anchor.face_object.cyan(),
                anchor.vertices,
                anchor.anchor.x,
                anchor.anchor.y,
                anchor.anchor.z
            );
        }

        let low: Vec<&PairSummary> = summary.low_confidence_pairs().collect();
        if !low.is_empty() {
            Self::report_warning(&format!(
                "{} pair(s) chosen from several candidates: {}",
                low.len(),
                low.iter()
                    .map(|p| p.source.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    /// Print collected warnings, most severe first
    pub fn report_warnings(warnings: &[Warning]) {
        if warnings.is_empty() {
            return;
        }
        let mut sorted: Vec<&Warning> = warnings.iter().collect();
        sorted.sort_by_key(|w| std::cmp::Reverse(w.severity));
        println!("\n{} ({})", "Warnings:".bold(), warnings.len());
        for warning in sorted {
            let line = warning.to_string();
            match warning.severity {
                Severity::Error => println!("  {}", line.red()),
                Severity::Warning => println!("  {}", line.yellow()),
                Severity::Info => println!("  {}", line.bright_black()),
            }
        }
    }

    /// Report islands of one object
    pub fn report_islands(object: &str, islands: &[Vec<usize>]) {
        println!("{} {}", "Object:".bold(), object.cyan());
        println!(
            "  {} {}",
            "Islands:".bright_black(),
            islands.len().to_string().cyan()
        );
        for (i, island) in islands.iter().enumerate() {
            let preview: Vec<String> = island.iter().take(8).map(|v| v.to_string()).collect();
            let more = if island.len() > 8 { ", …" } else { "" };
            println!(
                "  {:>4}  {:>6} {}  [{}{}]",
                i,
                island.len(),
                "vertices".bright_black(),
                preview.join(", "),
                more
            );
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    /// Progress bar for a batch of scenes
    pub fn progress_bar(len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    fn confidence_label(confidence: PairConfidence) -> ColoredString {
        match confidence {
            PairConfidence::Ordered => "ordered".bright_black(),
            PairConfidence::Unique => "unique".green(),
            PairConfidence::NameMatch => "by name".green(),
            PairConfidence::FirstCandidate => "first candidate".yellow(),
        }
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
