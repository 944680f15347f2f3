// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Point and face correspondence between two scaled point sets

use super::spatial_hash::{Lookup, SpatialHashIndex, CELL_SIZE};
use crate::geometry::Mesh;
use nalgebra::Point3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Match ratio a correspondence must strictly exceed to be trusted
pub const ACCEPT_THRESHOLD: f64 = 0.95;

/// Which cells a target point probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// The query point's own cell
    #[default]
    Cell,
    /// The query point's cell and its 26 neighbours
    Neighborhood,
}

/// Partial mapping from target ids to source ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    mapping: Vec<Option<usize>>,
    matched: usize,
    ambiguous: usize,
}

impl Correspondence {
    fn from_lookups(lookups: Vec<Lookup>) -> Self {
        let mut matched = 0;
        let mut ambiguous = 0;
        let mapping = lookups
            .into_iter()
            .map(|lookup| match lookup {
                Lookup::Unique(id) => {
                    matched += 1;
                    Some(id)
                }
                Lookup::Ambiguous(_) => {
                    ambiguous += 1;
                    None
                }
                Lookup::Miss => None,
            })
            .collect();
        Self {
            mapping,
            matched,
            ambiguous,
        }
    }

    /// Source id mapped to `target`, if any
    pub fn source_of(&self, target: usize) -> Option<usize> {
        self.mapping.get(target).copied().flatten()
    }

    /// `(target, source)` for every mapped target
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mapping
            .iter()
            .enumerate()
            .filter_map(|(t, s)| s.map(|s| (t, s)))
    }

    /// Size of the target set
    pub fn target_count(&self) -> usize {
        self.mapping.len()
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Targets left unmapped because their bucket had several contributors
    pub fn ambiguous(&self) -> usize {
        self.ambiguous
    }

    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }

    /// `matched / |targets|`, zero for an empty target set
    pub fn match_ratio(&self) -> f64 {
        if self.mapping.is_empty() {
            0.0
        } else {
            self.matched as f64 / self.mapping.len() as f64
        }
    }

    pub fn is_accepted(&self, threshold: f64) -> bool {
        self.match_ratio() > threshold
    }
}

/// Resolves target points against an index built over source points
#[derive(Debug, Clone, Copy)]
pub struct CorrespondenceMatcher {
    cell_size: f64,
    probe: ProbeMode,
    parallel: bool,
}

impl Default for CorrespondenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrespondenceMatcher {
    pub fn new() -> Self {
        Self {
            cell_size: CELL_SIZE,
            probe: ProbeMode::Cell,
            parallel: false,
        }
    }

    pub fn with_probe(mut self, probe: ProbeMode) -> Self {
        self.probe = probe;
        self
    }

    /// Resolve target points on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Index `source` unscaled and resolve every `target * scale` against it
    pub fn match_points(
        &self,
        source: &[Point3<f64>],
        target: &[Point3<f64>],
        scale: f64,
    ) -> Correspondence {
        let index = SpatialHashIndex::build(source, self.cell_size);
        self.match_against(&index, target, scale)
    }

    /// Resolve every `target * scale` against a prebuilt index
    pub fn match_against(
        &self,
        index: &SpatialHashIndex,
        target: &[Point3<f64>],
        scale: f64,
    ) -> Correspondence {
        let resolve = |p: &Point3<f64>| match self.probe {
            ProbeMode::Cell => index.resolve(p, scale),
            ProbeMode::Neighborhood => index.resolve_neighborhood(p, scale),
        };
        let lookups: Vec<Lookup> = if self.parallel {
            target.par_iter().map(resolve).collect()
        } else {
            target.iter().map(resolve).collect()
        };
        Correspondence::from_lookups(lookups)
    }

    /// Vertex correspondence, target vertex -> source vertex
    pub fn match_vertices(&self, source: &Mesh, target: &Mesh, scale: f64) -> Correspondence {
        self.match_points(&source.positions, &target.positions, scale)
    }

    /// Face correspondence by centroid, target face -> source face
    pub fn match_faces(&self, source: &Mesh, target: &Mesh, scale: f64) -> Correspondence {
        self.match_points(&source.face_centroids(), &target.face_centroids(), scale)
    }
}
