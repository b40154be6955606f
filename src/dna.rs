//! DNA - one element id per layer
//!
//! Random DNA is drawn per rarity tier; the exhaustive pairing walk is
//! deterministic and covers every ordered pair of distinct card indices.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use crate::catalog::Layer;
use crate::config::{ElementId, RarityWeight};
use crate::error::{ForgeError, Result};
use crate::rarity::random_rarity;

/// Ordered element ids. Equality is element-wise, so `[1, 23]` and
/// `[12, 3]` are different combinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dna(Vec<ElementId>);

impl Dna {
    pub fn new(ids: Vec<ElementId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.0
    }
}

impl fmt::Display for Dna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", parts.join("-"))
    }
}

/// Draw one element per layer for `rarity`. A layer listed in the weight's
/// `layer_percent` table first resolves its own rarity from that table.
pub fn create_dna<R: Rng + ?Sized>(
    layers: &[Layer],
    weight: Option<&RarityWeight>,
    rarity: &str,
    rng: &mut R,
) -> Result<Dna> {
    let mut ids = Vec::with_capacity(layers.len());

    for layer in layers {
        let layer_rarity = match weight.and_then(|w| w.layer_percent.get(&layer.id)) {
            Some(options) => random_rarity(options, rng)?,
            None => rarity,
        };

        let pool = layer.element_ids_for_rarity(layer_rarity);
        if pool.is_empty() {
            return Err(ForgeError::EmptyRarityPool {
                layer: layer.id,
                rarity: layer_rarity.to_string(),
            });
        }
        let id = pool[rng.random_range(0..pool.len())];
        debug!(layer = layer.id, rarity = layer_rarity, element = id, "selected element");
        ids.push(id);
    }

    Ok(Dna(ids))
}

pub fn is_dna_unique(used: &[Dna], candidate: &Dna) -> bool {
    !used.contains(candidate)
}

/// Accepted DNA, scoped per rarity tier.
#[derive(Debug, Default)]
pub struct DnaRegistry {
    by_rarity: HashMap<String, HashSet<Dna>>,
}

impl DnaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unique(&self, rarity: &str, candidate: &Dna) -> bool {
        self.by_rarity
            .get(rarity)
            .map_or(true, |used| !used.contains(candidate))
    }

    pub fn insert(&mut self, rarity: &str, dna: Dna) {
        self.by_rarity.entry(rarity.to_string()).or_default().insert(dna);
    }

    pub fn len(&self) -> usize {
        self.by_rarity.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every `(right, left)` with both in `[start, end]` and `right != left`,
/// right-major.
pub fn pairwise_indices(start: u32, end: u32) -> impl Iterator<Item = (u32, u32)> {
    (start..=end).flat_map(move |right| {
        (start..=end)
            .filter(move |&left| left != right)
            .map(move |left| (right, left))
    })
}

pub fn pairwise_count(start: u32, end: u32) -> u64 {
    if end < start {
        return 0;
    }
    let n = (end - start + 1) as u64;
    n * (n - 1)
}
