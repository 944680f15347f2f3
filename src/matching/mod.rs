// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Matching module - spatial hashing, point correspondence and object pairing

pub mod bulk;
pub mod correspondence;
pub mod names;
pub mod spatial_hash;

pub use bulk::{name_context, BulkObjectMatcher, ObjectPair, PairConfidence, TieBreak};
pub use correspondence::{Correspondence, CorrespondenceMatcher, ProbeMode, ACCEPT_THRESHOLD};
pub use names::{strip_decorations, NameContext};
pub use spatial_hash::{Lookup, SpatialHashIndex, ToleranceCell, CELL_SIZE};
