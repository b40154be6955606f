//! Error taxonomy shared by every stage of a run.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Edition index {index} out of range for rarity table of {len} slots")]
    EditionOutOfRange { index: u32, len: usize },

    #[error("Rarity option list is empty")]
    EmptyRarityOptions,

    #[error("Layer {layer} has no elements for rarity '{rarity}'")]
    EmptyRarityPool { layer: u32, rarity: String },

    #[error("Layer {layer} has no element at position {index}")]
    ElementNotFound { layer: usize, index: usize },

    #[error("Card {card} is outside the 1-based range of layer {layer}")]
    CardOutOfRange { layer: usize, card: u32 },

    #[error("Layer not found at position {0}")]
    LayerNotFound(usize),

    #[error("No unique DNA found for rarity '{rarity}' after {attempts} attempts")]
    DnaExhausted { rarity: String, attempts: u32 },

    #[error("Requested {requested} entries but only {available} are available")]
    NotEnoughEntries { requested: usize, available: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration requires engine >= {required}, current is {current}")]
    EngineVersionMismatch { required: String, current: String },
}

impl ForgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
