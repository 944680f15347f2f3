// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Material slot linking and per-face material transfer by face centroid

use super::report::{ReportSink, Severity, Warning, WarningKind};
use super::PairContext;
use crate::geometry::Mesh;
use crate::matching::{CorrespondenceMatcher, SpatialHashIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTransferStats {
    /// Target faces that received a material index
    pub matched: usize,
    pub source_faces: usize,
    pub target_faces: usize,
    /// Target faces whose centroid bucket had several source faces
    pub ambiguous: usize,
}

impl MaterialTransferStats {
    pub fn is_complete(&self) -> bool {
        self.matched >= self.source_faces
    }
}

/// Give `target` the same material slot list as `source`
pub fn transfer_material_slots(source: &Mesh, target: &mut Mesh) {
    target.materials = source.materials.clone();
}

/// Copy per-face material indices from `source` faces to the `target` faces
/// whose scaled centroid lands on them unambiguously.
///
/// Unmatched target faces keep their index. Partial coverage is reported as
/// a warning with `(matched, source faces)`; it is never an error.
pub fn transfer_materials_by_centroid(
    source: &Mesh,
    target: &mut Mesh,
    scale: f64,
    pair: PairContext<'_>,
    sink: &mut dyn ReportSink,
) -> MaterialTransferStats {
    let matcher = CorrespondenceMatcher::new();
    let index = SpatialHashIndex::build(&source.face_centroids(), matcher.cell_size());
    let correspondence = matcher.match_against(&index, &target.face_centroids(), scale);

    for (t, s) in correspondence.iter() {
        target.faces[t].material_index = source.faces[s].material_index;
    }

    let stats = MaterialTransferStats {
        matched: correspondence.matched(),
        source_faces: source.face_count(),
        target_faces: target.face_count(),
        ambiguous: correspondence.ambiguous(),
    };
    debug!(
        source = pair.source,
        target = pair.target,
        matched = stats.matched,
        source_faces = stats.source_faces,
        "face materials transferred"
    );

    if stats.ambiguous > 0 {
        sink.report(
            Warning::new(
                WarningKind::AmbiguousCorrespondence,
                "faces with coincident centroids left unchanged",
            )
            .with_severity(Severity::Info)
            .with_context([pair.source, pair.target])
            .with_counts(stats.ambiguous, stats.target_faces),
        );
    }
    if !stats.is_complete() {
        sink.report(
            Warning::new(
                WarningKind::PartialCoverage,
                format!(
                    "face materials partially transferred (target has {} faces)",
                    stats.target_faces
                ),
            )
            .with_context([pair.source, pair.target])
            .with_counts(stats.matched, stats.source_faces),
        );
    }
    stats
}
