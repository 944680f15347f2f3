// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine configuration system

use crate::matching::{TieBreak, ACCEPT_THRESHOLD};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "meshxfer.toml";

/// Which kind of model pair is being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Rigged model onto its cached export
    #[default]
    RiggedToCache,
    /// Rigged model onto an edited rigged variant
    RiggedToRigged,
}

impl TransferDirection {
    /// Target-to-source coordinate ratio of the usual export convention
    pub fn default_scale(&self) -> f64 {
        match self {
            TransferDirection::RiggedToCache => 0.08,
            TransferDirection::RiggedToRigged => 1.0,
        }
    }

    pub fn tie_break(&self) -> TieBreak {
        match self {
            TransferDirection::RiggedToCache => TieBreak::First,
            TransferDirection::RiggedToRigged => TieBreak::Name,
        }
    }

    /// Cached exports keep the rigged model's object order
    pub fn allows_ordered_pairing(&self) -> bool {
        matches!(self, TransferDirection::RiggedToCache)
    }

    /// Rigged targets already carry their own UV layers, which are dropped
    pub fn clears_target_uv(&self) -> bool {
        matches!(self, TransferDirection::RiggedToRigged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::RiggedToCache => "rigged_to_cache",
            TransferDirection::RiggedToRigged => "rigged_to_rigged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "rigged_to_cache" | "pmx2abc" => Some(TransferDirection::RiggedToCache),
            "rigged_to_rigged" | "pmx2pmx" => Some(TransferDirection::RiggedToRigged),
            _ => None,
        }
    }
}

/// Face-locator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Hierarchy id of the locator object
    pub locator: String,
    /// Vertex group marking the head; defaults to the locator's parent bone
    #[serde(default)]
    pub group: Option<String>,
    /// Source face object name; when absent the face is found automatically
    #[serde(default)]
    pub face_object: Option<String>,
    /// Vertex group on the face object; defaults to `group`
    #[serde(default)]
    pub face_group: Option<String>,
    /// Move the locator onto the anchor before attaching
    #[serde(default = "default_true")]
    pub snap_to_anchor: bool,
}

impl AnchorConfig {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            group: None,
            face_object: None,
            face_group: None,
            snap_to_anchor: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub direction: TransferDirection,
    /// Overrides the direction's default scale factor
    pub scale_factor: Option<f64>,
    /// Match ratio a pair must strictly exceed
    pub accept_threshold: f64,
    /// Vertex groups never transferred, in addition to skeleton bones
    pub reserved_groups: Vec<String>,
    pub transfer_materials: bool,
    pub transfer_uv: bool,
    pub transfer_weights: bool,
    /// Drop non-reserved target groups before copying weights
    pub purge_stale_groups: bool,
    /// Run matching on the rayon pool
    pub parallel: bool,
    pub anchor: Option<AnchorConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            direction: TransferDirection::RiggedToCache,
            scale_factor: None,
            accept_threshold: ACCEPT_THRESHOLD,
            reserved_groups: vec![
                "mmd_edge_scale".to_string(),
                "mmd_vertex_order".to_string(),
                "FACE_VERTEX_3".to_string(),
            ],
            transfer_materials: true,
            transfer_uv: true,
            transfer_weights: true,
            purge_stale_groups: false,
            parallel: false,
            anchor: None,
        }
    }
}

impl EngineConfig {
    /// Effective target-to-source scale factor
    pub fn scale(&self) -> f64 {
        self.scale_factor
            .unwrap_or_else(|| self.direction.default_scale())
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `meshxfer.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `MESHXFER_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(direction) = std::env::var("MESHXFER_DIRECTION") {
            self.direction = TransferDirection::parse(&direction)
                .with_context(|| format!("Unknown MESHXFER_DIRECTION: {}", direction))?;
        }

        if let Ok(scale) = std::env::var("MESHXFER_SCALE_FACTOR") {
            let scale: f64 = scale
                .parse()
                .with_context(|| format!("Invalid MESHXFER_SCALE_FACTOR: {}", scale))?;
            self.scale_factor = Some(scale);
        }

        if let Ok(parallel) = std::env::var("MESHXFER_PARALLEL") {
            self.parallel = parallel.parse().unwrap_or(false);
        }

        self.validate()
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let scale = self.scale();
        if !scale.is_finite() || scale <= 0.0 {
            bail!("scale factor must be a positive finite number, got {}", scale);
        }
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            bail!(
                "accept_threshold must lie in [0, 1], got {}",
                self.accept_threshold
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.scale(), 0.08);
        let config = EngineConfig {
            direction: TransferDirection::RiggedToRigged,
            ..EngineConfig::default()
        };
        assert_eq!(config.scale(), 1.0);
        assert_eq!(config.direction.tie_break(), TieBreak::Name);
    }

    #[test]
    fn test_scale_override() {
        let config = EngineConfig {
            scale_factor: Some(12.5),
            ..EngineConfig::default()
        };
        assert_eq!(config.scale(), 12.5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            direction = "rigged_to_rigged"
            transfer_uv = false

            [anchor]
            locator = "FaceLocator"
            "#,
        )
        .unwrap();
        assert_eq!(config.direction, TransferDirection::RiggedToRigged);
        assert!(!config.transfer_uv);
        assert!(config.transfer_weights);
        let anchor = config.anchor.unwrap();
        assert_eq!(anchor.locator, "FaceLocator");
        assert!(anchor.snap_to_anchor);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let config = EngineConfig {
            scale_factor: Some(0.0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(
            TransferDirection::parse("PMX2ABC"),
            Some(TransferDirection::RiggedToCache)
        );
        assert_eq!(
            TransferDirection::parse("rigged-to-rigged"),
            Some(TransferDirection::RiggedToRigged)
        );
        assert_eq!(TransferDirection::parse("sideways"), None);
    }
}
