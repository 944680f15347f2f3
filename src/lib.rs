// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! meshxfer
//!
//! Cross-mesh correspondence and attribute transfer. Pairs the objects of two
//! models that differ by a known scale, copies skin weights, UV layers and
//! face materials across the pairs, and re-parents a locator to a
//! three-vertex anchor on the face mesh.

pub mod anchor;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod matching;
pub mod pipeline;
pub mod transfer;

pub use config::{AnchorConfig, EngineConfig, TransferDirection};
pub use error::{TransferError, TransferResult};
pub use geometry::{Mesh, MeshObject, Model, Scene};
pub use matching::{BulkObjectMatcher, Correspondence, CorrespondenceMatcher, SpatialHashIndex};
pub use pipeline::{TransferPipeline, TransferSummary};
pub use transfer::{Report, ReportSink, TracingSink};

use anyhow::Result;
use std::path::Path;

/// Load a scene snapshot, run the pipeline over it and return the mutated
/// scene with its summary. Warnings go to `sink`.
pub fn transfer_file(
    path: impl AsRef<Path>,
    config: &EngineConfig,
    sink: &mut dyn ReportSink,
) -> Result<(Scene, TransferSummary)> {
    let mut scene = io::load_scene(path.as_ref())?;
    let summary = TransferPipeline::new(config.clone()).run(&mut scene, sink)?;
    Ok((scene, summary))
}
