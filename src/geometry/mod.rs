// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation, topology counts and hierarchy snapshots

mod hierarchy;
mod mesh;
mod topology;

pub use hierarchy::{vertex_parent_frame, Hierarchy, MeshObject, Model, Parent, Scene, SceneObject};
pub use mesh::{Face, Mesh, UvLayer};
pub use topology::{collect_edges, Edge, TopologySignature};
