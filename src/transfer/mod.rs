// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Attribute transfer - weights, UV layers and materials through a correspondence

pub mod materials;
pub mod report;
pub mod uv;
pub mod weights;

pub use materials::{transfer_material_slots, transfer_materials_by_centroid, MaterialTransferStats};
pub use report::{Report, ReportSink, Severity, Tee, TracingSink, Warning, WarningKind};
pub use uv::{layer_names, transfer_uv, MAX_UV_LAYERS};
pub use weights::{excluded_groups, purge_stale_groups, transfer_weights, WeightTransferStats};

/// Object ids of the pair being processed, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairContext<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

impl<'a> PairContext<'a> {
    pub fn new(source: &'a str, target: &'a str) -> Self {
        Self { source, target }
    }
}
