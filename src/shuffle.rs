//! Shuffle/Export - renumber a random subset of generated metadata files

use rand::Rng;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::list_visible_files;
use crate::error::{ForgeError, Result};

pub const DEFAULT_EXPORT_COUNT: usize = 5555;

/// In-place Fisher-Yates: the cursor walks down from the end and each slot
/// swaps with a uniform slot at or before it.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    let mut cursor = items.len();
    while cursor > 1 {
        let pick = rng.random_range(0..cursor);
        cursor -= 1;
        items.swap(cursor, pick);
    }
}

/// Copy `count` randomly chosen files from `source_dir` to
/// `target_dir/1.json ..= target_dir/{count}.json`. All copies are joined
/// before returning.
pub fn export_shuffled<R: Rng + ?Sized>(
    source_dir: &Path,
    target_dir: &Path,
    count: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let mut entries = list_visible_files(source_dir)?;
    if entries.len() < count {
        return Err(ForgeError::NotEnoughEntries {
            requested: count,
            available: entries.len(),
        });
    }

    shuffle(&mut entries, rng);
    fs::create_dir_all(target_dir).map_err(|e| ForgeError::io(target_dir, e))?;

    info!(
        source = %source_dir.display(),
        target = %target_dir.display(),
        available = entries.len(),
        count,
        "exporting shuffled metadata"
    );

    let selected = &entries[..count];
    selected
        .par_iter()
        .enumerate()
        .try_for_each(|(i, source)| {
            let target = target_dir.join(format!("{}.json", i + 1));
            fs::copy(source, &target)
                .map(|_| ())
                .map_err(|e| ForgeError::io(source, e))
        })?;

    Ok(selected.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut items: Vec<u32> = (0..100).collect();
        shuffle(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..100).collect::<Vec<_>>());
        assert_ne!(items, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_seeds_differ() {
        let mut a: Vec<u32> = (0..50).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(1));
        shuffle(&mut b, &mut StdRng::seed_from_u64(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_shuffle_trivial_slices() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut empty: Vec<u8> = vec![];
        shuffle(&mut empty, &mut rng);
        let mut one = vec![7];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![7]);
    }

    #[test]
    fn test_export_copies_renumbered_subset() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        for i in 1..=20 {
            fs::write(src.path().join(format!("{}.json", i)), format!("{{\"edition\":{}}}", i)).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(9);
        let picked = export_shuffled(src.path(), dst.path(), 8, &mut rng).unwrap();
        assert_eq!(picked.len(), 8);

        let mut seen = HashSet::new();
        for (i, source) in picked.iter().enumerate() {
            let copied = fs::read_to_string(dst.path().join(format!("{}.json", i + 1))).unwrap();
            assert_eq!(copied, fs::read_to_string(source).unwrap());
            assert!(seen.insert(copied));
        }
        assert!(!dst.path().join("9.json").exists());
    }

    #[test]
    fn test_export_requires_enough_entries() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        fs::write(src.path().join("1.json"), "{}").unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let err = export_shuffled(src.path(), dst.path(), 2, &mut rng).unwrap_err();
        assert!(matches!(err, ForgeError::NotEnoughEntries { requested: 2, available: 1 }));
    }
}
