// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology counts used as a coarse equality filter between meshes

use super::Mesh;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Undirected edge between two vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    v0: usize,
    v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        // Always store edges with smaller index first for consistent hashing
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

/// Unique undirected edges of all polygons
pub fn collect_edges(mesh: &Mesh) -> AHashSet<Edge> {
    let mut edges = AHashSet::new();
    for face in &mesh.faces {
        let n = face.vertices.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = face.vertices[i];
            let b = face.vertices[(i + 1) % n];
            if a != b {
                edges.insert(Edge::new(a, b));
            }
        }
    }
    edges
}

/// (vertex, edge, face, loop) counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopologySignature {
    pub vertices: usize,
    pub edges: usize,
    pub faces: usize,
    pub loops: usize,
}

impl TopologySignature {
    pub fn of(mesh: &Mesh) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            edges: collect_edges(mesh).len(),
            faces: mesh.face_count(),
            loops: mesh.loop_count(),
        }
    }
}

impl fmt::Display for TopologySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v={} e={} f={} l={}",
            self.vertices, self.edges, self.faces, self.loops
        )
    }
}
