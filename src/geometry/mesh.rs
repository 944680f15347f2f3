// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon mesh with skin weights, UV layers and material slots

use crate::error::{TransferError, TransferResult};
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Polygon defined by vertex indices, plus its material slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: Vec<usize>,
    #[serde(default)]
    pub material_index: u32,
}

impl Face {
    pub fn new(vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            material_index: 0,
        }
    }

    pub fn with_material(vertices: Vec<usize>, material_index: u32) -> Self {
        Self {
            vertices,
            material_index,
        }
    }

    /// Number of face corners (loops)
    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Named UV layer, one coordinate per face corner in face order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvLayer {
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub active_render: bool,
    pub coords: Vec<Point2<f32>>,
}

impl UvLayer {
    pub fn new(name: impl Into<String>, coords: Vec<Point2<f32>>) -> Self {
        Self {
            name: name.into(),
            active: false,
            active_render: false,
            coords,
        }
    }
}

/// Polygon mesh in its local frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
    /// Vertex group names, indexed by group id
    #[serde(default)]
    pub groups: Vec<String>,
    /// Per-vertex group id -> weight
    #[serde(default)]
    pub weights: Vec<BTreeMap<usize, f32>>,
    #[serde(default)]
    pub uv_layers: Vec<UvLayer>,
    /// Material slot names, indexed by `Face::material_index`
    #[serde(default)]
    pub materials: Vec<String>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(positions: Vec<Point3<f64>>, faces: Vec<Face>) -> Self {
        Self {
            positions,
            faces,
            ..Self::default()
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        index
    }

    /// Add a face and return its index
    pub fn add_face(&mut self, face: Face) -> usize {
        let index = self.faces.len();
        self.faces.push(face);
        index
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Total number of face corners
    pub fn loop_count(&self) -> usize {
        self.faces.iter().map(Face::corner_count).sum()
    }

    /// Arithmetic mean of a face's vertex positions
    pub fn face_centroid(&self, face: usize) -> Point3<f64> {
        let vertices = &self.faces[face].vertices;
        if vertices.is_empty() {
            return Point3::origin();
        }
        let sum = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, &v| acc + self.positions[v].coords);
        Point3::from(sum / vertices.len() as f64)
    }

    pub fn face_centroids(&self) -> Vec<Point3<f64>> {
        (0..self.faces.len()).map(|f| self.face_centroid(f)).collect()
    }

    /// Copy of this mesh with every position multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Mesh {
        let mut mesh = self.clone();
        for p in &mut mesh.positions {
            *p = Point3::from(p.coords * factor);
        }
        mesh
    }

    /// Transform positions into another frame
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for p in &mut self.positions {
            *p = matrix.transform_point(p);
        }
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == name)
    }

    /// Return the id of the named group, creating it if missing
    pub fn ensure_group(&mut self, name: &str) -> usize {
        match self.group_index(name) {
            Some(index) => index,
            None => {
                self.groups.push(name.to_string());
                self.groups.len() - 1
            }
        }
    }

    /// Remove a group and its weights, shifting higher group ids down
    pub fn remove_group(&mut self, group: usize) {
        if group >= self.groups.len() {
            return;
        }
        self.groups.remove(group);
        for vertex_weights in &mut self.weights {
            *vertex_weights = std::mem::take(vertex_weights)
                .into_iter()
                .filter(|&(g, _)| g != group)
                .map(|(g, w)| if g > group { (g - 1, w) } else { (g, w) })
                .collect();
        }
    }

    pub fn weight(&self, vertex: usize, group: usize) -> Option<f32> {
        self.weights.get(vertex).and_then(|w| w.get(&group).copied())
    }

    /// Set (replace) a vertex weight
    pub fn set_weight(&mut self, vertex: usize, group: usize, weight: f32) {
        if self.weights.len() <= vertex {
            self.weights.resize_with(self.positions.len().max(vertex + 1), BTreeMap::new);
        }
        self.weights[vertex].insert(group, weight);
    }

    /// Vertices carrying `group` at exactly `weight`
    pub fn vertices_with_weight(&self, group: usize, weight: f32) -> Vec<usize> {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| w.get(&group) == Some(&weight))
            .map(|(v, _)| v)
            .collect()
    }

    pub fn uv_layer(&self, name: &str) -> Option<&UvLayer> {
        self.uv_layers.iter().find(|l| l.name == name)
    }

    pub fn active_uv_index(&self) -> Option<usize> {
        self.uv_layers.iter().position(|l| l.active)
    }

    pub fn active_render_uv_index(&self) -> Option<usize> {
        self.uv_layers.iter().position(|l| l.active_render)
    }

    /// Check coordinates, index ranges and per-corner attribute lengths
    pub fn validate(&self, object: &str) -> TransferResult<()> {
        let vertex_count = self.positions.len();
        if let Some(v) = self.positions.iter().position(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(TransferError::InvalidMesh {
                object: object.to_string(),
                message: format!("vertex {} has a non-finite coordinate", v),
            });
        }
        for (f, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.vertices.iter().find(|&&v| v >= vertex_count) {
                return Err(TransferError::InvalidMesh {
                    object: object.to_string(),
                    message: format!(
                        "face {} references vertex {} (mesh has {} vertices)",
                        f, bad, vertex_count
                    ),
                });
            }
        }
        if self.weights.len() > vertex_count {
            return Err(TransferError::InvalidMesh {
                object: object.to_string(),
                message: format!(
                    "{} weight entries for {} vertices",
                    self.weights.len(),
                    vertex_count
                ),
            });
        }
        let loops = self.loop_count();
        for layer in &self.uv_layers {
            if layer.coords.len() != loops {
                return Err(TransferError::InvalidMesh {
                    object: object.to_string(),
                    message: format!(
                        "UV layer '{}' has {} coordinates for {} face corners",
                        layer.name,
                        layer.coords.len(),
                        loops
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
            vec![Face::new(vec![0, 1, 2, 3])],
        )
    }

    #[test]
    fn test_face_centroid() {
        let mesh = quad();
        assert_eq!(mesh.face_centroid(0), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.loop_count(), 4);
    }

    #[test]
    fn test_set_weight_replaces() {
        let mut mesh = quad();
        let g = mesh.ensure_group("Arm");
        mesh.set_weight(2, g, 0.25);
        mesh.set_weight(2, g, 0.75);
        assert_eq!(mesh.weight(2, g), Some(0.75));
        assert_eq!(mesh.ensure_group("Arm"), g);
    }

    #[test]
    fn test_remove_group_reindexes() {
        let mut mesh = quad();
        let a = mesh.ensure_group("A");
        let b = mesh.ensure_group("B");
        mesh.set_weight(0, a, 1.0);
        mesh.set_weight(0, b, 0.5);
        mesh.remove_group(a);
        assert_eq!(mesh.groups, vec!["B".to_string()]);
        assert_eq!(mesh.weight(0, 0), Some(0.5));
    }

    #[test]
    fn test_validate_rejects_out_of_range_face() {
        let mut mesh = quad();
        mesh.add_face(Face::new(vec![0, 1, 9]));
        assert!(mesh.validate("quad").is_err());
    }

    #[test]
    fn test_validate_uv_length() {
        let mut mesh = quad();
        mesh.uv_layers.push(UvLayer::new("UVMap", vec![Point2::new(0.0, 0.0); 3]));
        assert!(mesh.validate("quad").is_err());
        mesh.uv_layers[0].coords.push(Point2::new(1.0, 1.0));
        assert!(mesh.validate("quad").is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_positions() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut mesh = quad();
            mesh.positions[2].y = bad;
            let err = mesh.validate("quad").unwrap_err();
            assert!(matches!(
                err,
                TransferError::InvalidMesh { ref object, ref message }
                    if object == "quad" && message.contains("vertex 2")
            ));
        }
    }
}
