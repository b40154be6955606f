//! Metadata records written next to each artwork.

use serde::{Deserialize, Serialize};

use crate::catalog::Element;
use crate::config::GeneratorConfig;

pub const LEFT_CARD_VALUE: &str = "Left Card Value";
pub const LEFT_CARD_SUIT: &str = "Left Card Suit";
pub const RIGHT_CARD_VALUE: &str = "Right Card Value";
pub const RIGHT_CARD_SUIT: &str = "Right Card Suit";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub trait_type: String,
    /// Omitted from JSON when the name did not yield a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: Option<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataRecord {
    pub edition: u32,
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

impl MetadataRecord {
    pub fn new(edition: u32, name: String, config: &GeneratorConfig, attributes: Vec<Attribute>) -> Self {
        Self {
            edition,
            name,
            description: config.description.clone(),
            image: image_uri(&config.base_image_uri, edition),
            attributes,
        }
    }
}

pub fn image_uri(base: &str, edition: u32) -> String {
    format!("{}/{}", base, edition)
}

/// A selected element plus the rarity it was drawn under.
#[derive(Debug, Clone)]
pub struct SelectedElement<'a> {
    pub element: &'a Element,
    pub rarity: String,
}

pub fn element_attribute(selected: &SelectedElement<'_>) -> Attribute {
    Attribute::new(selected.element.name.clone(), Some(selected.rarity.clone()))
}

/// Name and attributes for a two-card artwork. Card names read
/// "<value> <word> <suit>"; tokens 0 and 2 are the value and suit.
pub fn card_attributes(right_name: &str, left_name: &str) -> (String, Vec<Attribute>) {
    let right: Vec<&str> = right_name.split_whitespace().collect();
    let left: Vec<&str> = left_name.split_whitespace().collect();
    let token = |tokens: &[&str], i: usize| tokens.get(i).map(|t| t.to_string());

    let attributes = vec![
        Attribute::new(LEFT_CARD_VALUE, token(&left, 0)),
        Attribute::new(LEFT_CARD_SUIT, token(&left, 2)),
        Attribute::new(RIGHT_CARD_VALUE, token(&right, 0)),
        Attribute::new(RIGHT_CARD_SUIT, token(&right, 2)),
    ];

    (format!("{} + {}", left_name, right_name), attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_card_attributes() {
        let (name, attrs) = card_attributes("Ace of Spades", "King of Hearts");
        assert_eq!(name, "King of Hearts + Ace of Spades");
        assert_eq!(
            attrs,
            vec![
                Attribute::new(LEFT_CARD_VALUE, Some("King".into())),
                Attribute::new(LEFT_CARD_SUIT, Some("Hearts".into())),
                Attribute::new(RIGHT_CARD_VALUE, Some("Ace".into())),
                Attribute::new(RIGHT_CARD_SUIT, Some("Spades".into())),
            ]
        );
    }

    #[test]
    fn test_malformed_names_drop_values() {
        let (name, attrs) = card_attributes("Joker", "Two Hearts");
        assert_eq!(name, "Two Hearts + Joker");
        assert_eq!(attrs[0].value.as_deref(), Some("Two"));
        assert_eq!(attrs[1].value, None);
        assert_eq!(attrs[3].value, None);

        let v = serde_json::to_value(&attrs[1]).unwrap();
        assert_eq!(v, json!({"trait_type": "Left Card Suit"}));
    }

    #[test]
    fn test_element_attribute_uses_rarity() {
        let element = Element { id: 3, name: "Blue Sky".into(), path: PathBuf::new() };
        let selected = SelectedElement { element: &element, rarity: "rare".into() };
        assert_eq!(element_attribute(&selected), Attribute::new("Blue Sky", Some("rare".into())));
    }

    #[test]
    fn test_record_shape() {
        let config: GeneratorConfig = serde_json::from_value(json!({
            "layers": [],
            "description": "Two cards, one fate",
            "baseImageUri": "ipfs://CID",
            "editionSize": 2
        }))
        .unwrap();
        let record = MetadataRecord::new(7, "A + B".into(), &config, vec![]);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "edition": 7,
                "name": "A + B",
                "description": "Two cards, one fate",
                "image": "ipfs://CID/7",
                "attributes": []
            })
        );
    }
}
