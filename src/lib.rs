//! CardForge Core - Generative Card Art Compiler
//!
//! Layered card images are composed into artworks, each with a JSON metadata
//! record and a DNA identity. A separate export step reshuffles generated
//! metadata into a renumbered random subset.
//!
//! Stages, leaves first: `catalog` -> `rarity` -> `dna` -> `compositor` ->
//! `metadata` -> `pipeline`; `shuffle` runs on its own over finished output.

pub mod catalog;
pub mod compositor;
pub mod config;
pub mod dna;
pub mod error;
pub mod hashing;
pub mod metadata;
pub mod pipeline;
pub mod rarity;
pub mod shuffle;
pub mod validation;

pub use catalog::{Catalog, Element, Layer};
pub use compositor::{RasterSurface, Surface};
pub use config::GeneratorConfig;
pub use dna::Dna;
pub use error::{ForgeError, Result};
pub use hashing::{canonical_json, config_hash, dna_hash};
pub use metadata::{Attribute, MetadataRecord};
pub use pipeline::{GenerationPipeline, OutputLayout, RunSummary, Strategy};
pub use shuffle::export_shuffled;
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, Validator, ViolationSeverity};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
