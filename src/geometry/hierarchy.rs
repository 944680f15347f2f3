// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Object hierarchy snapshot: objects, their parents and world transforms

use super::Mesh;
use crate::error::{TransferError, TransferResult};
use nalgebra::{Matrix4, Point3, Translation3, Vector3};
use serde::{Deserialize, Serialize};

/// How an object is attached to its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    #[default]
    None,
    Object {
        id: String,
    },
    Bone {
        armature: String,
        bone: String,
    },
    /// Three-vertex parent with per-vertex blend weights
    Vertices {
        object: String,
        vertices: [usize; 3],
        weights: [f64; 3],
    },
}

/// Non-mesh object (empties, locators) in the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Parent,
    pub world: Matrix4<f64>,
    /// Inverse of the parent frame at attachment time
    #[serde(default = "Matrix4::identity")]
    pub parent_inverse: Matrix4<f64>,
}

impl SceneObject {
    pub fn new(id: impl Into<String>, world: Matrix4<f64>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            parent: Parent::None,
            world,
            parent_inverse: Matrix4::identity(),
        }
    }

    pub fn world_position(&self) -> Point3<f64> {
        Point3::new(self.world[(0, 3)], self.world[(1, 3)], self.world[(2, 3)])
    }

    pub fn set_world_position(&mut self, position: Point3<f64>) {
        self.world[(0, 3)] = position.x;
        self.world[(1, 3)] = position.y;
        self.world[(2, 3)] = position.z;
    }

    /// Clear the parent, keeping the world position
    pub fn detach(&mut self) {
        let position = self.world_position();
        self.parent = Parent::None;
        self.parent_inverse = Matrix4::identity();
        self.set_world_position(position);
    }

    /// Attach to a parent whose current world frame is `parent_frame`,
    /// leaving the world transform unchanged
    pub fn attach(&mut self, parent: Parent, parent_frame: &Matrix4<f64>) {
        self.parent_inverse = parent_frame.try_inverse().unwrap_or_else(Matrix4::identity);
        self.parent = parent;
    }
}

/// Mesh object of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    pub id: String,
    pub name: String,
    /// Caller-defined canonical ordering key (outliner order, export order)
    #[serde(default)]
    pub order_key: Option<String>,
    #[serde(default = "Matrix4::identity")]
    pub world: Matrix4<f64>,
    pub mesh: Mesh,
}

impl MeshObject {
    pub fn new(id: impl Into<String>, mesh: Mesh) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            order_key: None,
            world: Matrix4::identity(),
            mesh,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_order_key(mut self, key: impl Into<String>) -> Self {
        self.order_key = Some(key.into());
        self
    }

    pub fn with_world(mut self, world: Matrix4<f64>) -> Self {
        self.world = world;
        self
    }

    pub fn world_point(&self, vertex: usize) -> Point3<f64> {
        self.world.transform_point(&self.mesh.positions[vertex])
    }
}

/// One model: its mesh objects and skeleton bone names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub objects: Vec<MeshObject>,
    /// Bone names; vertex groups named after bones are never transferred
    #[serde(default)]
    pub skeleton: Vec<String>,
}

impl Model {
    pub fn find(&self, id: &str) -> Option<&MeshObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MeshObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }
}

/// Flat list of non-mesh objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub objects: Vec<SceneObject>,
}

impl Hierarchy {
    pub fn get(&self, id: &str) -> TransferResult<&SceneObject> {
        self.objects
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| TransferError::ObjectNotFound { id: id.to_string() })
    }

    pub fn get_mut(&mut self, id: &str) -> TransferResult<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| TransferError::ObjectNotFound { id: id.to_string() })
    }
}

/// Everything one run reads and writes: both models and the non-mesh objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub source: Model,
    pub target: Model,
    #[serde(default)]
    pub objects: Hierarchy,
}

impl Scene {
    pub fn new(source: Model, target: Model) -> Self {
        Self {
            source,
            target,
            objects: Hierarchy::default(),
        }
    }

    /// Check every mesh of both models for bad coordinates and dangling indices
    pub fn validate(&self) -> TransferResult<()> {
        for object in self.source.objects.iter().chain(&self.target.objects) {
            object.mesh.validate(&object.id)?;
        }
        Ok(())
    }
}

/// Frame used for a three-vertex parent: translation to the anchor point
pub fn vertex_parent_frame(anchor: &Point3<f64>) -> Matrix4<f64> {
    Translation3::from(Vector3::new(anchor.x, anchor.y, anchor.z)).to_homogeneous()
}
