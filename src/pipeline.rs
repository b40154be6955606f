//! Generation Pipeline - Single Entry Point for a Batch Run
//!
//! Each artwork goes SELECT -> COMPOSITE -> METADATA -> PERSIST, strictly one
//! after another on a single surface. The aggregate `_metadata.json` is
//! truncated when the run starts and written once when it ends.

use chrono::{DateTime, Utc};
use image::Rgba;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{Catalog, Element, Layer};
use crate::compositor::{compose, pastel_color, LayerDraw, Surface};
use crate::config::GeneratorConfig;
use crate::dna::{create_dna, pairwise_count, pairwise_indices, Dna, DnaRegistry};
use crate::error::{ForgeError, Result};
use crate::hashing::{config_hash, dna_hash};
use crate::metadata::{card_attributes, element_attribute, Attribute, MetadataRecord, SelectedElement};
use crate::rarity::RarityTable;
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

/// How artworks are enumerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Every ordered pair of distinct cards over the edition range, on a
    /// cycling background.
    #[default]
    Pairwise,
    /// One random rarity-weighted combination per edition.
    Rarity,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pairwise => write!(f, "pairwise"),
            Strategy::Rarity => write!(f, "rarity"),
        }
    }
}

/// File locations under the output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn json_dir(&self) -> PathBuf {
        self.root.join("json")
    }

    pub fn json_rand_dir(&self) -> PathBuf {
        self.root.join("json_rand")
    }

    pub fn image_path(&self, index: u32) -> PathBuf {
        self.root.join(format!("{}.png", index))
    }

    pub fn metadata_path(&self, index: u32) -> PathBuf {
        self.json_dir().join(format!("{}.json", index))
    }

    pub fn aggregate_path(&self) -> PathBuf {
        self.root.join("_metadata.json")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("_manifest.json")
    }
}

/// Everything needed to render and describe one artwork.
#[derive(Debug, Clone)]
pub struct ArtworkPlan {
    pub index: u32,
    pub dna: Dna,
    /// Solid fill painted before the layers.
    pub background: Option<Rgba<u8>>,
    pub draws: Vec<LayerDraw>,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub edition: u32,
    pub dna: Dna,
    pub dna_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunManifest {
    pub run_id: String,
    pub engine_version: String,
    pub started_at: DateTime<Utc>,
    pub strategy: Strategy,
    pub config_hash: String,
    pub artworks: Vec<ManifestEntry>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub artworks: usize,
    pub output: PathBuf,
}

/// State owned by exactly one batch run.
#[derive(Debug)]
pub struct RunContext {
    pub rarity_table: RarityTable,
    pub dna_registry: DnaRegistry,
    pub metadata: Vec<MetadataRecord>,
    pub manifest: Vec<ManifestEntry>,
}

impl RunContext {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            rarity_table: RarityTable::new(config.rarity_weights.clone(), config.edition_size),
            dna_registry: DnaRegistry::new(),
            metadata: vec![],
            manifest: vec![],
        }
    }
}

/// The generation pipeline - single entry point for batch runs
pub struct GenerationPipeline<'a> {
    config: &'a GeneratorConfig,
    catalog: &'a Catalog,
    layout: OutputLayout,
    validator: Validator,
}

impl<'a> GenerationPipeline<'a> {
    pub fn new(config: &'a GeneratorConfig, catalog: &'a Catalog, layout: OutputLayout) -> Self {
        Self {
            config,
            catalog,
            layout,
            validator: Validator::new(),
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn validate(&self, strategy: Strategy) -> ValidationResult {
        self.validator.validate(self.config, strategy)
    }

    /// Run a full batch. Validation always runs first; any failure after
    /// that aborts the run, leaving already written files in place.
    pub fn run<S, R>(&self, strategy: Strategy, surface: &mut S, rng: &mut R) -> Result<RunSummary>
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let validation = self.validate(strategy);
        if !validation.valid {
            return Err(ForgeError::InvalidConfig(validation.error_messages().join("; ")));
        }

        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(%run_id, %strategy, output = %self.layout.root().display(), "start creating artworks");

        self.prepare_output()?;
        let mut ctx = RunContext::new(self.config);

        match strategy {
            Strategy::Pairwise => self.run_pairwise(&mut ctx, surface, rng)?,
            Strategy::Rarity => self.run_rarity(&mut ctx, surface, rng)?,
        }

        self.flush(&ctx)?;
        let manifest = RunManifest {
            run_id: run_id.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            started_at,
            strategy,
            config_hash: config_hash(self.config)?,
            artworks: ctx.manifest,
        };
        write_file(&self.layout.manifest_path(), serde_json::to_string_pretty(&manifest)?)?;

        info!(%run_id, artworks = manifest.artworks.len(), "finished creating artworks");
        Ok(RunSummary {
            run_id,
            artworks: manifest.artworks.len(),
            output: self.layout.root().to_path_buf(),
        })
    }

    fn prepare_output(&self) -> Result<()> {
        let json_dir = self.layout.json_dir();
        fs::create_dir_all(&json_dir).map_err(|e| ForgeError::io(&json_dir, e))?;
        write_file(&self.layout.aggregate_path(), "")
    }

    fn flush(&self, ctx: &RunContext) -> Result<()> {
        write_file(&self.layout.aggregate_path(), serde_json::to_string(&ctx.metadata)?)
    }

    fn run_pairwise<S, R>(&self, ctx: &mut RunContext, surface: &mut S, rng: &mut R) -> Result<()>
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let start = self.config.start_edition_from;
        let end = self.config.edition_size;
        let total = pairwise_count(start, end);

        let mut index: u32 = 1;
        for (right, left) in pairwise_indices(start, end) {
            info!(index, total, "creating artwork");
            let mut plan = self.plan_pair(index, right, left)?;
            plan.background = self.background_color(rng);
            self.produce(ctx, surface, plan)?;
            index += 1;
        }
        Ok(())
    }

    /// Background cycles with the output index; layer 1 takes card `left`,
    /// layer 2 takes card `right` (both 1-based).
    pub fn plan_pair(&self, index: u32, right: u32, left: u32) -> Result<ArtworkPlan> {
        let background_layer = self.catalog.layer(0)?;
        let right_layer = self.catalog.layer(1)?;
        let left_layer = self.catalog.layer(2)?;

        let background_pos = index as usize % self.config.background_cycle.max(1);
        let background = background_layer.element_at(background_pos, 0)?;
        let right_card = right_layer.element_at(card_position(left, 1)?, 1)?;
        let left_card = left_layer.element_at(card_position(right, 2)?, 2)?;

        let (name, attributes) = card_attributes(&right_card.name, &left_card.name);
        debug!(index, right, left, %name, "planned pair");

        Ok(ArtworkPlan {
            index,
            dna: Dna::new(vec![background.id, right_card.id, left_card.id]),
            background: None,
            draws: vec![
                layer_draw(background_layer, background),
                layer_draw(right_layer, right_card),
                layer_draw(left_layer, left_card),
            ],
            name,
            attributes,
        })
    }

    fn run_rarity<S, R>(&self, ctx: &mut RunContext, surface: &mut S, rng: &mut R) -> Result<()>
    where
        S: Surface + ?Sized,
        R: Rng + ?Sized,
    {
        let start = self.config.start_edition_from;
        let end = self.config.edition_size;

        for edition in start..=end {
            info!(edition, total = end, "creating artwork");
            let mut plan = self.plan_rarity_edition(ctx, edition, rng)?;
            plan.background = self.background_color(rng);
            self.produce(ctx, surface, plan)?;
        }
        Ok(())
    }

    /// Draw a DNA for the edition's rarity, re-rolling until it is unique
    /// within that rarity.
    pub fn plan_rarity_edition<R: Rng + ?Sized>(
        &self,
        ctx: &mut RunContext,
        edition: u32,
        rng: &mut R,
    ) -> Result<ArtworkPlan> {
        let rarity = ctx.rarity_table.rarity_for(edition)?.to_string();
        let weight = self.config.rarity_weight(&rarity);
        let layers = self.catalog.layers();

        let mut attempts = 0;
        let dna = loop {
            if attempts >= self.config.max_dna_attempts {
                return Err(ForgeError::DnaExhausted { rarity, attempts });
            }
            attempts += 1;
            let candidate = create_dna(layers, weight, &rarity, rng)?;
            if ctx.dna_registry.is_unique(&rarity, &candidate) {
                break candidate;
            }
            debug!(edition, dna = %candidate, "dna collision, re-rolling");
        };
        ctx.dna_registry.insert(&rarity, dna.clone());

        let mut draws = Vec::with_capacity(layers.len());
        let mut attributes = Vec::with_capacity(layers.len());
        for (pos, (layer, id)) in layers.iter().zip(dna.ids()).enumerate() {
            let element = layer.element(*id).ok_or(ForgeError::ElementNotFound {
                layer: pos,
                index: *id as usize,
            })?;
            let selected = SelectedElement {
                element,
                rarity: rarity.clone(),
            };
            attributes.push(element_attribute(&selected));
            draws.push(layer_draw(layer, element));
        }

        Ok(ArtworkPlan {
            index: edition,
            dna,
            background: None,
            draws,
            name: format!("#{}", edition),
            attributes,
        })
    }

    fn background_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Rgba<u8>> {
        self.config.random_background.then(|| pastel_color(rng))
    }

    fn produce<S: Surface + ?Sized>(&self, ctx: &mut RunContext, surface: &mut S, plan: ArtworkPlan) -> Result<()> {
        compose(surface, plan.background, &plan.draws)?;
        write_file(&self.layout.image_path(plan.index), surface.encode_png()?)?;

        let record = MetadataRecord::new(plan.index, plan.name, self.config, plan.attributes);
        write_file(
            &self.layout.metadata_path(plan.index),
            serde_json::to_string_pretty(&record)?,
        )?;
        ctx.metadata.push(record);

        ctx.manifest.push(ManifestEntry {
            edition: plan.index,
            dna_hash: dna_hash(&plan.dna)?,
            dna: plan.dna,
        });
        Ok(())
    }
}

/// Zero-based element position of a 1-based card number.
fn card_position(card: u32, layer: usize) -> Result<usize> {
    card.checked_sub(1)
        .map(|pos| pos as usize)
        .ok_or(ForgeError::CardOutOfRange { layer, card })
}

fn layer_draw(layer: &Layer, element: &Element) -> LayerDraw {
    LayerDraw {
        path: element.path.clone(),
        position: layer.position,
        size: layer.size,
    }
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, contents).map_err(|e| ForgeError::io(path, e))
}
