//! Hashing - SHA-256 identities for artworks and configurations
//!
//! Identical DNA always yields an identical hash, across runs and machines.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::config::GeneratorConfig;
use crate::dna::Dna;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Identity of one combination: sha256 of its canonical id list.
pub fn dna_hash(dna: &Dna) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(dna)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Fingerprint of the configuration a run was produced from
pub fn config_hash(config: &GeneratorConfig) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(config)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_dna_hash_distinguishes_digit_widths() {
        let a = dna_hash(&Dna::new(vec![1, 23])).unwrap();
        let b = dna_hash(&Dna::new(vec![12, 3])).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, dna_hash(&Dna::new(vec![1, 23])).unwrap());
    }
}
