// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - JSON scene snapshots and run summaries

mod snapshot;

pub use snapshot::{load_scene, save_scene, save_summary};
