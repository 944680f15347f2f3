// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end run: pair objects, copy materials and UVs, copy weights, place
//! the face locator

use crate::anchor::{locate_anchor, AnchorResult};
use crate::config::EngineConfig;
use crate::error::{TransferError, TransferResult};
use crate::geometry::Scene;
use crate::matching::{name_context, BulkObjectMatcher, CorrespondenceMatcher, ObjectPair, PairConfidence};
use crate::transfer::{
    excluded_groups, layer_names, purge_stale_groups, transfer_material_slots,
    transfer_materials_by_centroid, transfer_uv, transfer_weights, PairContext, ReportSink, Warning,
    WarningKind,
};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

/// Per-pair outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub source: String,
    pub target: String,
    /// Vertex match ratio from pairing; absent for ordered pairs
    pub ratio: Option<f64>,
    pub confidence: PairConfidence,
    /// Target faces that received a material index
    pub faces_matched: Option<usize>,
    pub uv_layers: usize,
    /// Target vertices mapped for weight transfer
    pub vertices_matched: Option<usize>,
    pub weights_written: usize,
}

impl PairSummary {
    /// Entry for an accepted pair before any transfer
    pub fn from_pair(pair: &ObjectPair, scene: &Scene) -> Self {
        Self {
            source: scene.source.objects[pair.source].id.clone(),
            target: scene.target.objects[pair.target].id.clone(),
            ratio: pair.ratio,
            confidence: pair.confidence,
            faces_matched: None,
            uv_layers: 0,
            vertices_matched: None,
            weights_written: 0,
        }
    }
}

/// Outcome of [`TransferPipeline::run`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub pairs: Vec<PairSummary>,
    pub groups_purged: usize,
    pub anchor: Option<AnchorResult>,
}

impl TransferSummary {
    pub fn weights_written(&self) -> usize {
        self.pairs.iter().map(|p| p.weights_written).sum()
    }

    pub fn faces_matched(&self) -> usize {
        self.pairs.iter().filter_map(|p| p.faces_matched).sum()
    }

    /// Pairs decided by taking the first of several candidates
    pub fn low_confidence_pairs(&self) -> impl Iterator<Item = &PairSummary> {
        self.pairs.iter().filter(|p| p.confidence.is_low())
    }
}

/// Runs all configured steps over a [`Scene`]
#[derive(Debug, Clone)]
pub struct TransferPipeline {
    config: EngineConfig,
}

impl TransferPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pair the scene's objects only
    pub fn match_objects(
        &self,
        scene: &Scene,
        sink: &mut dyn ReportSink,
    ) -> TransferResult<Vec<ObjectPair>> {
        let direction = self.config.direction;
        BulkObjectMatcher::new(self.config.scale())
            .with_threshold(self.config.accept_threshold)
            .with_tie_break(direction.tie_break())
            .with_ordered_fast_path(direction.allows_ordered_pairing())
            .with_parallel(self.config.parallel)
            .match_objects(&scene.source.objects, &scene.target.objects, sink)
    }

    /// Run every enabled step, mutating the target model and the hierarchy.
    ///
    /// Fails on an invalid mesh, when no object pair is accepted, when weight
    /// transfer finds no vertex correspondence for any pair, or when the
    /// anchor cannot be placed. Everything else degrades to warnings.
    pub fn run(&self, scene: &mut Scene, sink: &mut dyn ReportSink) -> TransferResult<TransferSummary> {
        let span = info_span!("transfer", direction = self.config.direction.as_str());
        let _enter = span.enter();

        scene.validate()?;
        let scale = self.config.scale();
        let pairs = self.match_objects(scene, sink)?;
        let names = name_context(&pairs, &scene.source.objects, &scene.target.objects);

        let mut summary = TransferSummary {
            pairs: pairs.iter().map(|pair| PairSummary::from_pair(pair, scene)).collect(),
            ..TransferSummary::default()
        };

        if self.config.transfer_materials {
            self.transfer_materials(scene, &pairs, &mut summary, sink);
        }
        if self.config.transfer_weights {
            self.transfer_weights(scene, &pairs, &mut summary, sink)?;
        }
        if let Some(anchor) = &self.config.anchor {
            let result = locate_anchor(
                &scene.source,
                &mut scene.target,
                &pairs,
                &names,
                &mut scene.objects,
                anchor,
                scale,
            )?;
            summary.anchor = Some(result);
        }

        info!(
            pairs = summary.pairs.len(),
            faces = summary.faces_matched(),
            weights = summary.weights_written(),
            "transfer complete"
        );
        Ok(summary)
    }

    fn transfer_materials(
        &self,
        scene: &mut Scene,
        pairs: &[ObjectPair],
        summary: &mut TransferSummary,
        sink: &mut dyn ReportSink,
    ) {
        let scale = self.config.scale();
        let clear_uv = self.config.direction.clears_target_uv();
        for (pair, entry) in pairs.iter().zip(summary.pairs.iter_mut()) {
            let source = &scene.source.objects[pair.source];
            let target = &mut scene.target.objects[pair.target];
            let context = PairContext::new(&source.id, &target.id);

            transfer_material_slots(&source.mesh, &mut target.mesh);
            if self.config.transfer_uv {
                entry.uv_layers = transfer_uv(
                    &source.mesh,
                    &mut target.mesh,
                    &layer_names(&source.mesh),
                    clear_uv,
                    context,
                    sink,
                );
            }
            let stats = transfer_materials_by_centroid(&source.mesh, &mut target.mesh, scale, context, sink);
            entry.faces_matched = Some(stats.matched);
        }
    }

    fn transfer_weights(
        &self,
        scene: &mut Scene,
        pairs: &[ObjectPair],
        summary: &mut TransferSummary,
        sink: &mut dyn ReportSink,
    ) -> TransferResult<()> {
        let scale = self.config.scale();
        let excluded = excluded_groups(
            &self.config.reserved_groups,
            scene.source.skeleton.iter().chain(&scene.target.skeleton),
        );
        let matcher = CorrespondenceMatcher::new().with_parallel(self.config.parallel);

        let mut purged: AHashSet<usize> = AHashSet::new();
        let mut any_mapped = false;
        for (pair, entry) in pairs.iter().zip(summary.pairs.iter_mut()) {
            let source = &scene.source.objects[pair.source];
            let target = &mut scene.target.objects[pair.target];

            if self.config.purge_stale_groups && purged.insert(pair.target) {
                summary.groups_purged += purge_stale_groups(&mut target.mesh, &excluded);
            }

            let correspondence = matcher.match_vertices(&source.mesh, &target.mesh, scale);
            let (matched, total) = (correspondence.matched(), correspondence.target_count());
            entry.vertices_matched = Some(matched);
            if correspondence.is_empty() {
                sink.report(
                    Warning::new(
                        WarningKind::PartialCoverage,
                        "no vertex correspondence, weights not transferred",
                    )
                    .with_context([source.id.as_str(), target.id.as_str()])
                    .with_counts(0, total),
                );
                continue;
            }
            if matched < total {
                sink.report(
                    Warning::new(
                        WarningKind::PartialCoverage,
                        format!(
                            "weights partially transferred ({} vertices ambiguous)",
                            correspondence.ambiguous()
                        ),
                    )
                    .with_context([source.id.as_str(), target.id.as_str()])
                    .with_counts(matched, total),
                );
            }
            any_mapped = true;
            let stats = transfer_weights(&source.mesh, &mut target.mesh, &correspondence, &excluded);
            entry.weights_written = stats.weights_written;
            debug!(
                source = %source.id,
                target = %target.id,
                groups = stats.groups,
                weights = stats.weights_written,
                "weights transferred"
            );
        }

        if !any_mapped {
            return Err(TransferError::EmptyCorrespondence { pairs: pairs.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferDirection;
    use crate::geometry::{Face, Mesh, MeshObject, Model};
    use crate::transfer::Report;
    use nalgebra::Point3;

    fn quad() -> Mesh {
        let mut mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![
                Face::with_material(vec![0, 1, 2], 1),
                Face::with_material(vec![0, 2, 3], 0),
            ],
        );
        mesh.materials = vec!["Skin".into(), "Cloth".into()];
        let g = mesh.ensure_group("Arm");
        mesh.set_weight(0, g, 0.5);
        mesh.set_weight(2, g, 1.0);
        mesh
    }

    fn scene() -> Scene {
        let source = Model {
            objects: vec![MeshObject::new("Body", quad())],
            skeleton: vec!["Head".into()],
        };
        let mut target_mesh = quad().scaled(1.0);
        target_mesh.groups.clear();
        target_mesh.weights = vec![Default::default(); 4];
        for face in &mut target_mesh.faces {
            face.material_index = 0;
        }
        target_mesh.materials.clear();
        let target = Model {
            objects: vec![MeshObject::new("Body.001", target_mesh)],
            skeleton: Vec::new(),
        };
        Scene::new(source, target)
    }

    fn config() -> EngineConfig {
        EngineConfig {
            direction: TransferDirection::RiggedToRigged,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_run_copies_materials_and_weights() {
        let mut scene = scene();
        let mut report = Report::new();
        let summary = TransferPipeline::new(config()).run(&mut scene, &mut report).unwrap();

        assert_eq!(summary.pairs.len(), 1);
        assert_eq!(summary.pairs[0].faces_matched, Some(2));
        assert_eq!(summary.weights_written(), 2);
        let target = &scene.target.objects[0].mesh;
        assert_eq!(target.materials, vec!["Skin".to_string(), "Cloth".to_string()]);
        assert_eq!(target.faces[0].material_index, 1);
        let g = target.group_index("Arm").unwrap();
        assert_eq!(target.weight(2, g), Some(1.0));
        assert_eq!(target.weight(1, g), None);
        assert!(report.is_clean());
    }

    #[test]
    fn test_disabled_steps_leave_target_alone() {
        let mut scene = scene();
        let config = EngineConfig {
            transfer_materials: false,
            transfer_weights: false,
            ..config()
        };
        let mut report = Report::new();
        let summary = TransferPipeline::new(config).run(&mut scene, &mut report).unwrap();
        assert_eq!(summary.pairs[0].faces_matched, None);
        assert!(scene.target.objects[0].mesh.groups.is_empty());
    }

    #[test]
    fn test_no_pairs_is_fatal() {
        let mut scene = scene();
        scene.target.objects[0].mesh.positions[0] = Point3::new(9.0, 9.0, 9.0);
        scene.target.objects[0].mesh.positions[1] = Point3::new(8.0, 9.0, 9.0);
        let mut report = Report::new();
        let err = TransferPipeline::new(config()).run(&mut scene, &mut report).unwrap_err();
        assert!(matches!(
            err,
            TransferError::BatchMatchFailure {
                matched: 0,
                source_count: 1,
                target_count: 1
            }
        ));
    }

    #[test]
    fn test_invalid_mesh_rejected_before_matching() {
        let mut scene = scene();
        scene.target.objects[0].mesh.faces.push(Face::new(vec![0, 1, 99]));
        let mut report = Report::new();
        let err = TransferPipeline::new(config()).run(&mut scene, &mut report).unwrap_err();
        assert!(matches!(err, TransferError::InvalidMesh { .. }));
    }
}
