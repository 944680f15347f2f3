// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Skin weight transfer through a vertex correspondence

use crate::geometry::Mesh;
use crate::matching::Correspondence;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Group names never transferred: reserved names plus skeleton bones
pub fn excluded_groups<'a, I, J>(reserved: I, skeleton: J) -> AHashSet<String>
where
    I: IntoIterator<Item = &'a String>,
    J: IntoIterator<Item = &'a String>,
{
    reserved.into_iter().chain(skeleton).cloned().collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTransferStats {
    /// Source groups transferred
    pub groups: usize,
    /// Target (vertex, group) weights written
    pub weights_written: usize,
}

/// Copy every non-excluded group's weights from `source` to `target`.
///
/// Target groups are created on demand. Each mapped target vertex gets its
/// weight replaced by the source vertex's weight; unmapped target vertices,
/// and mapped ones whose source vertex is not in the group, keep theirs.
pub fn transfer_weights(
    source: &Mesh,
    target: &mut Mesh,
    correspondence: &Correspondence,
    excluded: &AHashSet<String>,
) -> WeightTransferStats {
    let mut stats = WeightTransferStats::default();
    for (group, name) in source.groups.iter().enumerate() {
        if excluded.contains(name) {
            continue;
        }
        let target_group = target.ensure_group(name);
        stats.groups += 1;
        for (t, s) in correspondence.iter() {
            if let Some(weight) = source.weight(s, group) {
                target.set_weight(t, target_group, weight);
                stats.weights_written += 1;
            }
        }
    }
    stats
}

/// Remove target groups that are not excluded, returning how many went.
///
/// Run before [`transfer_weights`] so repeated runs do not accumulate groups
/// that no longer exist on the source.
pub fn purge_stale_groups(target: &mut Mesh, excluded: &AHashSet<String>) -> usize {
    let stale: Vec<usize> = target
        .groups
        .iter()
        .enumerate()
        .filter(|(_, name)| !excluded.contains(*name))
        .map(|(g, _)| g)
        .collect();
    for &g in stale.iter().rev() {
        target.remove_group(g);
    }
    stale.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::CorrespondenceMatcher;
    use nalgebra::Point3;

    fn source_mesh() -> Mesh {
        let mut mesh = Mesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            Vec::new(),
        );
        let bone = mesh.ensure_group("Head");
        let custom = mesh.ensure_group("Blush");
        mesh.set_weight(0, bone, 1.0);
        mesh.set_weight(0, custom, 0.5);
        mesh.set_weight(1, custom, 0.25);
        mesh
    }

    fn excluded() -> AHashSet<String> {
        excluded_groups(&["mmd_vertex_order".to_string()], &["Head".to_string()])
    }

    #[test]
    fn test_skeleton_groups_skipped() {
        let source = source_mesh();
        let mut target = source.scaled(12.5);
        target.groups.clear();
        target.weights.clear();
        let correspondence = CorrespondenceMatcher::new().match_vertices(&source, &target, 0.08);
        let stats = transfer_weights(&source, &mut target, &correspondence, &excluded());
        assert_eq!(target.groups, vec!["Blush".to_string()]);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.weights_written, 2);
        assert_eq!(target.weight(0, 0), Some(0.5));
        assert_eq!(target.weight(1, 0), Some(0.25));
        assert_eq!(target.weight(2, 0), None);
    }

    #[test]
    fn test_transfer_is_idempotent() {
        let source = source_mesh();
        let mut target = source.scaled(12.5);
        target.groups.clear();
        target.weights.clear();
        let correspondence = CorrespondenceMatcher::new().match_vertices(&source, &target, 0.08);
        transfer_weights(&source, &mut target, &correspondence, &excluded());
        let once = target.clone();
        transfer_weights(&source, &mut target, &correspondence, &excluded());
        assert_eq!(once, target);
    }

    #[test]
    fn test_unmapped_vertices_untouched() {
        let source = source_mesh();
        let mut target = Mesh::from_parts(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(7.0, 7.0, 7.0)],
            Vec::new(),
        );
        let blush = target.ensure_group("Blush");
        target.set_weight(1, blush, 0.9);
        let correspondence = CorrespondenceMatcher::new().match_vertices(&source, &target, 1.0);
        transfer_weights(&source, &mut target, &correspondence, &excluded());
        assert_eq!(target.weight(0, blush), Some(0.5));
        assert_eq!(target.weight(1, blush), Some(0.9));
    }

    #[test]
    fn test_purge_keeps_excluded() {
        let mut target = source_mesh();
        target.ensure_group("mmd_vertex_order");
        let removed = purge_stale_groups(&mut target, &excluded());
        assert_eq!(removed, 1);
        assert_eq!(
            target.groups,
            vec!["Head".to_string(), "mmd_vertex_order".to_string()]
        );
        assert_eq!(target.weight(0, 0), Some(1.0));
    }
}
