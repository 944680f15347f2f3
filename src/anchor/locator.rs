// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Anchor selection on a face island and three-vertex re-parenting of a locator

use super::islands::{extract_islands, largest_island};
use crate::config::AnchorConfig;
use crate::error::{TransferError, TransferResult};
use crate::geometry::{vertex_parent_frame, Hierarchy, MeshObject, Model, Parent, SceneObject};
use crate::matching::{NameContext, ObjectPair, SpatialHashIndex, CELL_SIZE};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Vertex group written to the face object, holding the three anchor vertices
pub const FACE_VERTEX_GROUP: &str = "FACE_VERTEX_3";

/// Outcome of anchor location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorResult {
    /// Target object the locator now hangs from
    pub face_object: String,
    pub island_size: usize,
    /// Minimum-Z, minimum-X and maximum-X vertices, in that order
    pub vertices: [usize; 3],
    /// World-space mean of the three vertices
    pub anchor: Point3<f64>,
}

/// Pick three distinct vertices of `island`: minimum Z, then minimum X, then
/// maximum X among the rest. Ties go to the lower vertex id, so the result
/// does not depend on the order of `island`.
pub fn select_anchor_vertices(
    island: &[usize],
    positions: &[Point3<f64>],
    object: &str,
) -> TransferResult<[usize; 3]> {
    let mut remaining: Vec<usize> = island.to_vec();
    remaining.sort_unstable();
    remaining.dedup();
    if remaining.len() < 3 {
        return Err(TransferError::precondition(
            object,
            format!(
                "need three distinct anchor vertices, island has {}",
                remaining.len()
            ),
        ));
    }

    let by_axis = |axis: usize| {
        move |a: &usize, b: &usize| -> Ordering {
            positions[*a][axis]
                .total_cmp(&positions[*b][axis])
                .then(a.cmp(b))
        }
    };
    let by_axis_max_first = |axis: usize| {
        move |a: &usize, b: &usize| -> Ordering {
            positions[*b][axis]
                .total_cmp(&positions[*a][axis])
                .then(a.cmp(b))
        }
    };

    let mut take = |order: &dyn Fn(&usize, &usize) -> Ordering| -> usize {
        let pos = (0..remaining.len())
            .min_by(|&i, &j| order(&remaining[i], &remaining[j]))
            .unwrap_or(0);
        remaining.remove(pos)
    };

    let min_z = take(&by_axis(2));
    let min_x = take(&by_axis(0));
    let max_x = take(&by_axis_max_first(0));
    Ok([min_z, min_x, max_x])
}

/// Arithmetic mean of the world positions of `vertices`
pub fn anchor_point(object: &MeshObject, vertices: &[usize; 3]) -> Point3<f64> {
    let sum = vertices
        .iter()
        .fold(Vector3::zeros(), |acc, &v| acc + object.world_point(v).coords);
    Point3::from(sum / 3.0)
}

/// Move `locator` under a three-vertex parent.
///
/// The world position is recorded, the old parent cleared and the position
/// restored; with `snap` the locator is then placed on the anchor. Attachment
/// stores the parent inverse, so attaching does not move it.
pub fn reparent_locator(
    locator: &mut SceneObject,
    face_object: &str,
    vertices: [usize; 3],
    anchor: &Point3<f64>,
    snap: bool,
) {
    let world = locator.world_position();
    locator.detach();
    locator.set_world_position(world);
    if snap {
        locator.set_world_position(*anchor);
    }
    locator.attach(
        Parent::Vertices {
            object: face_object.to_string(),
            vertices,
            weights: [1.0 / 3.0; 3],
        },
        &vertex_parent_frame(anchor),
    );
}

/// Source pair and source vertices the anchor is searched from
struct FaceCandidates {
    pair: usize,
    vertices: Vec<usize>,
}

fn full_weight_vertices(object: &MeshObject, group: &str) -> Vec<usize> {
    object
        .mesh
        .group_index(group)
        .map(|g| object.mesh.vertices_with_weight(g, 1.0))
        .unwrap_or_default()
}

/// Auto mode: the pair whose source holds the lowest-Z vertex fully weighted
/// to `group`, among sources with at least three such vertices
fn auto_face_candidates(
    source: &Model,
    pairs: &[ObjectPair],
    group: &str,
) -> TransferResult<FaceCandidates> {
    let mut best: Option<(f64, FaceCandidates)> = None;
    for (p, pair) in pairs.iter().enumerate() {
        let object = &source.objects[pair.source];
        let vertices = full_weight_vertices(object, group);
        if vertices.len() < 3 {
            continue;
        }
        let min_z = vertices
            .iter()
            .map(|&v| object.mesh.positions[v].z)
            .fold(f64::INFINITY, f64::min);
        if best.as_ref().map_or(true, |(z, _)| min_z < *z) {
            best = Some((min_z, FaceCandidates { pair: p, vertices }));
        }
    }
    best.map(|(_, candidates)| candidates).ok_or_else(|| {
        TransferError::precondition(
            group,
            "no source object has three vertices weighted 1.0 in this group",
        )
    })
}

/// Manual mode: the named source object and group
fn manual_face_candidates(
    source: &Model,
    target: &Model,
    pairs: &[ObjectPair],
    names: &NameContext,
    face_object: &str,
    group: &str,
) -> TransferResult<FaceCandidates> {
    let target_name = names
        .target_for(face_object)
        .ok_or_else(|| TransferError::precondition(face_object, "source object has no paired target"))?;
    let pair = pairs
        .iter()
        .position(|p| {
            source.objects[p.source].name == face_object && target.objects[p.target].name == target_name
        })
        .ok_or_else(|| TransferError::ObjectNotFound {
            id: face_object.to_string(),
        })?;
    let vertices = full_weight_vertices(&source.objects[pairs[pair].source], group);
    if vertices.len() < 3 {
        return Err(TransferError::precondition(
            face_object,
            format!(
                "need three vertices weighted 1.0 in group '{}', found {}",
                group,
                vertices.len()
            ),
        ));
    }
    Ok(FaceCandidates { pair, vertices })
}

fn locator_group(config: &AnchorConfig, locator: &SceneObject) -> TransferResult<String> {
    if let Some(group) = config.group.as_ref().filter(|g| !g.is_empty()) {
        return Ok(group.clone());
    }
    match &locator.parent {
        Parent::Bone { bone, .. } if !bone.is_empty() => Ok(bone.clone()),
        _ => Err(TransferError::precondition(
            &locator.id,
            "locator is not parented to a bone and no group was configured",
        )),
    }
}

/// Locate the face anchor on the target model and re-parent the locator to it.
///
/// Source vertices fully weighted to the locator's group are registered in a
/// spatial hash; target vertices of the paired face object that resolve to
/// exactly one of them (scaled by `scale`) become candidates. The largest
/// candidate island supplies the three anchor vertices, which are also
/// written to [`FACE_VERTEX_GROUP`] on the face object.
pub fn locate_anchor(
    source: &Model,
    target: &mut Model,
    pairs: &[ObjectPair],
    names: &NameContext,
    hierarchy: &mut Hierarchy,
    config: &AnchorConfig,
    scale: f64,
) -> TransferResult<AnchorResult> {
    let group = locator_group(config, hierarchy.get(&config.locator)?)?;
    let candidates = match (&config.face_object, &config.face_group) {
        (Some(face_object), face_group) => {
            let face_group = face_group.as_deref().unwrap_or(group.as_str());
            manual_face_candidates(source, target, pairs, names, face_object, face_group)?
        }
        (None, _) => auto_face_candidates(source, pairs, &group)?,
    };

    let pair = &pairs[candidates.pair];
    let source_object = &source.objects[pair.source];
    let mut index = SpatialHashIndex::new(CELL_SIZE);
    for &v in &candidates.vertices {
        index.insert(v, &source_object.mesh.positions[v]);
    }

    let face = &mut target.objects[pair.target];
    let target_candidates: Vec<usize> = face
        .mesh
        .positions
        .iter()
        .enumerate()
        .filter(|(_, p)| index.resolve(p, scale).unique().is_some())
        .map(|(v, _)| v)
        .collect();
    debug!(
        source = %source_object.id,
        target = %face.id,
        source_candidates = candidates.vertices.len(),
        target_candidates = target_candidates.len(),
        "anchor candidates resolved"
    );

    let islands = extract_islands(&target_candidates, &face.mesh.faces);
    let island = largest_island(&islands).ok_or_else(|| {
        TransferError::precondition(&face.id, "no anchor candidates on the target face object")
    })?;
    let vertices = select_anchor_vertices(island, &face.mesh.positions, &face.id)?;
    let anchor = anchor_point(face, &vertices);

    let group_id = face.mesh.ensure_group(FACE_VERTEX_GROUP);
    for &v in &vertices {
        face.mesh.set_weight(v, group_id, 1.0);
    }

    let result = AnchorResult {
        face_object: face.id.clone(),
        island_size: island.len(),
        vertices,
        anchor,
    };
    let locator = hierarchy.get_mut(&config.locator)?;
    reparent_locator(locator, &result.face_object, vertices, &anchor, config.snap_to_anchor);
    info!(
        locator = %config.locator,
        face = %result.face_object,
        island = result.island_size,
        "locator attached to face anchor"
    );
    Ok(result)
}
