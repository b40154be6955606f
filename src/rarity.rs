//! Rarity Assignment
//!
//! Two ways of picking a rarity tier:
//! - sequential: an edition index maps onto the `[from, to]` bands of the
//!   weight table (`RarityTable`)
//! - weighted random: a draw in `[0, 100)` walks cumulative percents
//!   (`pick_rarity` / `random_rarity`)

use rand::Rng;
use std::cell::OnceCell;
use tracing::debug;

use crate::config::{RarityOption, RarityWeight};
use crate::error::{ForgeError, Result};

/// Lazily expanded edition -> rarity lookup.
#[derive(Debug)]
pub struct RarityTable {
    weights: Vec<RarityWeight>,
    edition_size: u32,
    runs: OnceCell<Vec<(String, u64)>>,
}

impl RarityTable {
    pub fn new(weights: Vec<RarityWeight>, edition_size: u32) -> Self {
        Self {
            weights,
            edition_size,
            runs: OnceCell::new(),
        }
    }

    /// One `(value, length)` run per band; an inverted band is empty.
    fn runs(&self) -> &[(String, u64)] {
        self.runs.get_or_init(|| {
            let runs: Vec<(String, u64)> = self
                .weights
                .iter()
                .map(|w| (w.value.clone(), band_len(w)))
                .collect();
            debug!(bands = runs.len(), slots = total_len(&runs), "built rarity table");
            runs
        })
    }

    pub fn is_built(&self) -> bool {
        self.runs.get().is_some()
    }

    /// Number of slots the bands expand to.
    pub fn len(&self) -> u64 {
        total_len(self.runs())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rarity for an edition, looked up at slot `edition_size - edition_index`.
    pub fn rarity_for(&self, edition_index: u32) -> Result<&str> {
        let runs = self.runs();
        let out_of_range = || ForgeError::EditionOutOfRange {
            index: edition_index,
            len: usize::try_from(total_len(runs)).unwrap_or(usize::MAX),
        };

        let mut slot = self
            .edition_size
            .checked_sub(edition_index)
            .map(u64::from)
            .ok_or_else(out_of_range)?;
        for (value, len) in runs {
            if slot < *len {
                return Ok(value.as_str());
            }
            slot -= len;
        }
        Err(out_of_range())
    }
}

fn band_len(weight: &RarityWeight) -> u64 {
    if weight.from > weight.to {
        0
    } else {
        u64::from(weight.to - weight.from) + 1
    }
}

fn total_len(runs: &[(String, u64)]) -> u64 {
    runs.iter().map(|(_, len)| len).sum()
}

/// First option whose cumulative percent meets or exceeds `draw`, falling
/// back to the first option when the sum never reaches it.
pub fn pick_rarity(options: &[RarityOption], draw: f64) -> Result<&str> {
    let first = options.first().ok_or(ForgeError::EmptyRarityOptions)?;

    let mut cumulative = 0.0;
    for option in options {
        cumulative += option.percent;
        if cumulative >= draw {
            return Ok(&option.id);
        }
    }
    Ok(&first.id)
}

pub fn random_rarity<'a, R: Rng + ?Sized>(options: &'a [RarityOption], rng: &mut R) -> Result<&'a str> {
    let draw = rng.random::<f64>() * 100.0;
    let picked = pick_rarity(options, draw)?;
    debug!(draw, rarity = picked, "random rarity");
    Ok(picked)
}
