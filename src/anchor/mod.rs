// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Anchor module - island extraction and face-anchor location

pub mod islands;
pub mod locator;

pub use islands::{extract_islands, largest_island};
pub use locator::{
    anchor_point, locate_anchor, reparent_locator, select_anchor_vertices, AnchorResult,
    FACE_VERTEX_GROUP,
};
