//! Generator Configuration - Layers, Canvas and Rarity Weights

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ForgeError, Result};
use crate::ENGINE_VERSION;

pub type LayerId = u32;
pub type ElementId = u32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub layers: Vec<LayerConfig>,
    #[serde(default = "default_canvas_side")]
    pub width: u32,
    #[serde(default = "default_canvas_side")]
    pub height: u32,
    #[serde(default)]
    pub description: String,
    pub base_image_uri: String,
    pub edition_size: u32,
    #[serde(default = "default_start_edition")]
    pub start_edition_from: u32,
    #[serde(default)]
    pub rarity_weights: Vec<RarityWeight>,
    #[serde(default = "default_background_cycle")]
    pub background_cycle: usize,
    #[serde(default = "default_max_dna_attempts")]
    pub max_dna_attempts: u32,
    /// Paint a random pastel under the layers of every artwork.
    #[serde(default)]
    pub random_background: bool,
    #[serde(default)]
    pub engine_min_version: Option<String>,
}

fn default_canvas_side() -> u32 { 1080 }
fn default_start_edition() -> u32 { 1 }
fn default_background_cycle() -> usize { 4 }
fn default_max_dna_attempts() -> u32 { 1000 }

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub id: LayerId,
    pub location: PathBuf,
    #[serde(default)]
    pub position: Position,
    /// Defaults to the full canvas.
    #[serde(default)]
    pub size: Option<Size>,
    /// Rarity value -> eligible element ids. Absent means every element is
    /// eligible for every rarity.
    #[serde(default)]
    pub rarity_pools: Option<BTreeMap<String, Vec<ElementId>>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityWeight {
    pub value: String,
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub layer_percent: BTreeMap<LayerId, Vec<RarityOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RarityOption {
    pub id: String,
    pub percent: f64,
}

impl GeneratorConfig {
    /// Load a configuration file. Relative layer locations are resolved
    /// against the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))?;
        let mut config: GeneratorConfig = serde_json::from_str(&content)?;

        if let Some(base) = path.parent() {
            for layer in &mut config.layers {
                if layer.location.is_relative() {
                    layer.location = base.join(&layer.location);
                }
            }
        }

        config.check_engine_version()?;
        Ok(config)
    }

    pub fn canvas_size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn rarity_weight(&self, value: &str) -> Option<&RarityWeight> {
        self.rarity_weights.iter().find(|w| w.value == value)
    }

    pub fn check_engine_version(&self) -> Result<()> {
        let Some(required) = &self.engine_min_version else {
            return Ok(());
        };

        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| ForgeError::InvalidConfig("Invalid engine version".into()))?;
        let min_ver = semver::Version::parse(required)
            .map_err(|_| ForgeError::InvalidConfig(format!("Invalid engineMinVersion '{}'", required)))?;

        if engine_ver < min_ver {
            return Err(ForgeError::EngineVersionMismatch {
                required: required.clone(),
                current: ENGINE_VERSION.to_string(),
            });
        }

        Ok(())
    }
}
