// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene snapshot reader and writer

use crate::geometry::Scene;
use crate::pipeline::TransferSummary;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a scene snapshot and check its meshes
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open scene: {:?}", path))?;
    let scene: Scene = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse scene: {:?}", path))?;
    scene
        .validate()
        .with_context(|| format!("Invalid scene: {:?}", path))?;
    Ok(scene)
}

/// Write a scene snapshot, creating parent directories as needed
pub fn save_scene(scene: &Scene, path: impl AsRef<Path>) -> Result<()> {
    write_json(scene, path.as_ref())
}

pub fn save_summary(summary: &TransferSummary, path: impl AsRef<Path>) -> Result<()> {
    write_json(summary, path.as_ref())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize to {:?}", path))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
