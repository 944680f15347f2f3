// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Connected components of a vertex subset under shared-face adjacency

use crate::geometry::Face;
use ahash::AHashMap;
use std::collections::VecDeque;

/// Split `candidates` into islands.
///
/// Two candidates are adjacent when some face contains both; the face may
/// also contain non-candidate vertices. Traversal starts from candidates in
/// ascending id order, so the result is deterministic. Each island is sorted
/// ascending.
pub fn extract_islands(candidates: &[usize], faces: &[Face]) -> Vec<Vec<usize>> {
    let mut vertices = candidates.to_vec();
    vertices.sort_unstable();
    vertices.dedup();

    let slot: AHashMap<usize, usize> = vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];

    let mut on_face: Vec<usize> = Vec::new();
    for face in faces {
        on_face.clear();
        on_face.extend(face.vertices.iter().filter_map(|v| slot.get(v).copied()));
        on_face.sort_unstable();
        on_face.dedup();
        // Star links: same components as the full clique
        if let Some((&head, rest)) = on_face.split_first() {
            for &other in rest {
                adjacency[head].push(other);
                adjacency[other].push(head);
            }
        }
    }

    let mut visited = vec![false; vertices.len()];
    let mut islands = Vec::new();
    let mut queue = VecDeque::new();
    for start in 0..vertices.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut island = Vec::new();
        while let Some(current) = queue.pop_front() {
            island.push(vertices[current]);
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        island.sort_unstable();
        islands.push(island);
    }
    islands
}

/// Largest island; the first one wins ties
pub fn largest_island(islands: &[Vec<usize>]) -> Option<&Vec<usize>> {
    islands.iter().fold(None, |best: Option<&Vec<usize>>, island| match best {
        Some(b) if b.len() >= island.len() => Some(b),
        _ => Some(island),
    })
}
