// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quantized spatial hash for tolerance-based point lookup
//!
//! Every indexed point is registered under its own tolerance cell and the 26
//! cells around it, so a single-cell probe of a query point finds any indexed
//! point less than one cell width away, even across a cell boundary.
//! Buckets keep the ids of all contributors; a bucket with more than one
//! distinct contributor is ambiguous and never resolves to a match.
//! Non-finite coordinates are never indexed and never match.

use ahash::AHashMap;
use nalgebra::Point3;

/// Edge length of a tolerance cell in local mesh units.
///
/// Four decimal places is the precision at which exported coordinates of the
/// same surface agree; it is shared by every lookup of one matching pass.
pub const CELL_SIZE: f64 = 1e-4;

/// Integer grid key: `floor(coordinate / cell_size)` per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToleranceCell {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl ToleranceCell {
    pub fn of(point: &Point3<f64>, cell_size: f64) -> Self {
        Self {
            x: (point.x / cell_size).floor() as i64,
            y: (point.y / cell_size).floor() as i64,
            z: (point.z / cell_size).floor() as i64,
        }
    }

    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// This cell and its 26 neighbours
    pub fn neighborhood(self) -> impl Iterator<Item = ToleranceCell> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| self.offset(dx, dy, dz)))
        })
    }
}

/// Outcome of resolving a query point against the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No indexed point nearby
    Miss,
    /// Exactly one distinct contributor
    Unique(usize),
    /// Several distinct contributors (count given)
    Ambiguous(usize),
}

impl Lookup {
    pub fn unique(self) -> Option<usize> {
        match self {
            Lookup::Unique(id) => Some(id),
            _ => None,
        }
    }

    fn from_ids(ids: &[usize]) -> Self {
        match ids {
            [] => Lookup::Miss,
            [id] => Lookup::Unique(*id),
            many => Lookup::Ambiguous(many.len()),
        }
    }
}

/// Tolerance-cell hash over a point set
#[derive(Debug, Clone)]
pub struct SpatialHashIndex {
    cell_size: f64,
    buckets: AHashMap<ToleranceCell, Vec<usize>>,
    points: usize,
}

impl SpatialHashIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            buckets: AHashMap::new(),
            points: 0,
        }
    }

    /// Index `points`, using each point's position in the slice as its id
    pub fn build(points: &[Point3<f64>], cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);
        index.buckets.reserve(points.len() * 27);
        for (id, point) in points.iter().enumerate() {
            index.insert(id, point);
        }
        index
    }

    /// Register `id` under the cell of `point` and its 26 neighbours.
    /// Points with a non-finite coordinate are skipped.
    pub fn insert(&mut self, id: usize, point: &Point3<f64>) {
        if !is_finite(point) {
            return;
        }
        let base = ToleranceCell::of(point, self.cell_size);
        for cell in base.neighborhood() {
            let bucket = self.buckets.entry(cell).or_default();
            if !bucket.contains(&id) {
                bucket.push(id);
            }
        }
        self.points += 1;
    }

    /// Bucket contents for the cell of `query * scale`
    pub fn lookup(&self, query: &Point3<f64>, scale: f64) -> &[usize] {
        let scaled = Point3::from(query.coords * scale);
        if !is_finite(&scaled) {
            return &[];
        }
        let cell = ToleranceCell::of(&scaled, self.cell_size);
        self.buckets.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve `query * scale` through its own cell only
    pub fn resolve(&self, query: &Point3<f64>, scale: f64) -> Lookup {
        Lookup::from_ids(self.lookup(query, scale))
    }

    /// Resolve `query * scale` by probing its cell and the 26 around it.
    ///
    /// Tolerance is applied on the query side as well as the index side,
    /// absorbing rounding accumulated through several transforms.
    pub fn resolve_neighborhood(&self, query: &Point3<f64>, scale: f64) -> Lookup {
        let scaled = Point3::from(query.coords * scale);
        if !is_finite(&scaled) {
            return Lookup::Miss;
        }
        let base = ToleranceCell::of(&scaled, self.cell_size);
        let mut distinct: Vec<usize> = Vec::new();
        for cell in base.neighborhood() {
            if let Some(bucket) = self.buckets.get(&cell) {
                for &id in bucket {
                    if !distinct.contains(&id) {
                        distinct.push(id);
                    }
                }
            }
        }
        Lookup::from_ids(&distinct)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of inserted points
    pub fn len(&self) -> usize {
        self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

fn is_finite(point: &Point3<f64>) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}
