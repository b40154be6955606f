//! Layer Catalog - element discovery per layer directory

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{ElementId, GeneratorConfig, LayerId, Position, Size};
use crate::error::{ForgeError, Result};

/// Number of trailing characters removed from a file name to get its
/// display name (a dot plus a 4-character extension).
pub const NAME_SUFFIX_LEN: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub id: LayerId,
    pub location: PathBuf,
    pub position: Position,
    pub size: Size,
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rarity_pools: Option<BTreeMap<String, Vec<ElementId>>>,
}

impl Layer {
    pub fn new(id: LayerId, position: Position, size: Size, elements: Vec<Element>) -> Self {
        Self {
            id,
            location: PathBuf::new(),
            position,
            size,
            elements,
            rarity_pools: None,
        }
    }

    pub fn with_rarity_pools(mut self, pools: BTreeMap<String, Vec<ElementId>>) -> Self {
        self.rarity_pools = Some(pools);
        self
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Element at a zero-based position in listing order.
    pub fn element_at(&self, index: usize, layer_pos: usize) -> Result<&Element> {
        self.elements
            .get(index)
            .ok_or(ForgeError::ElementNotFound { layer: layer_pos, index })
    }

    /// Ids eligible for `rarity`. Without configured pools every element
    /// qualifies; with pools an unknown rarity yields an empty list.
    pub fn element_ids_for_rarity(&self, rarity: &str) -> Vec<ElementId> {
        match &self.rarity_pools {
            Some(pools) => pools.get(rarity).cloned().unwrap_or_default(),
            None => self.elements.iter().map(|e| e.id).collect(),
        }
    }
}

/// Ordered layers with their loaded elements.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    layers: Vec<Layer>,
}

impl Catalog {
    pub fn load(config: &GeneratorConfig) -> Result<Self> {
        let canvas = config.canvas_size();
        let mut layers = Vec::with_capacity(config.layers.len());

        for layer_cfg in &config.layers {
            let elements = load_elements(&layer_cfg.location)?;
            debug!(
                layer = layer_cfg.id,
                elements = elements.len(),
                location = %layer_cfg.location.display(),
                "loaded layer"
            );
            layers.push(Layer {
                id: layer_cfg.id,
                location: layer_cfg.location.clone(),
                position: layer_cfg.position,
                size: layer_cfg.size.unwrap_or(canvas),
                elements,
                rarity_pools: layer_cfg.rarity_pools.clone(),
            });
        }

        Ok(Self { layers })
    }

    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, pos: usize) -> Result<&Layer> {
        self.layers.get(pos).ok_or(ForgeError::LayerNotFound(pos))
    }
}

/// A leading dot followed by anything but another dot, so `..x.png` stays visible.
pub fn is_hidden(file_name: &str) -> bool {
    let mut chars = file_name.chars();
    chars.next() == Some('.') && matches!(chars.next(), Some(c) if c != '.' && c != '/')
}

/// Strip the last five characters. Shorter names clean to "".
pub fn clean_name(file_name: &str) -> String {
    let keep = file_name.chars().count().saturating_sub(NAME_SUFFIX_LEN);
    file_name.chars().take(keep).collect()
}

/// Visible regular files in `dir`, ordered by file name.
pub fn list_visible_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(|e| ForgeError::io(dir, e))? {
        let entry = entry.map_err(|e| ForgeError::io(dir, e))?;
        let file_name = entry.file_name();
        if is_hidden(&file_name.to_string_lossy()) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| ForgeError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Elements of one layer directory, ids assigned from 0 in listing order.
pub fn load_elements(dir: &Path) -> Result<Vec<Element>> {
    let files = list_visible_files(dir)?;
    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, path)| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Element {
                id: i as ElementId,
                name: clean_name(&file_name),
                path,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_five_chars() {
        assert_eq!(clean_name("AceOfSpades.png"), "AceOfSpade");
        assert_eq!(clean_name("King of Hearts.jpeg"), "King of Hearts");
        assert_eq!(clean_name("a.png"), "");
        assert_eq!(clean_name(""), "");
    }

    #[test]
    fn test_hidden_files_excluded_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", ".DS_Store", "a.png", ".hidden.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();

        let elements = load_elements(dir.path()).unwrap();
        let names: Vec<_> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["", ""]);
        assert_eq!(elements[0].id, 0);
        assert_eq!(elements[1].id, 1);
        assert!(elements[0].path.ends_with("a.png"));
        assert!(elements[1].path.ends_with("b.png"));
    }

    #[test]
    fn test_double_dot_names_stay_visible() {
        assert!(is_hidden(".DS_Store"));
        assert!(!is_hidden("..x.png"));
        assert!(!is_hidden("."));
        assert!(!is_hidden("a.png"));

        let dir = tempfile::tempdir().unwrap();
        for name in ["..x.png", ".gitkeep"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = list_visible_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("..x.png"));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let err = load_elements(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ForgeError::Io { .. }));
    }

    #[test]
    fn test_rarity_pools() {
        let size = Size { width: 10, height: 10 };
        let elements = (0..3)
            .map(|i| Element { id: i, name: format!("e{}", i), path: PathBuf::new() })
            .collect();
        let layer = Layer::new(0, Position::default(), size, elements);
        assert_eq!(layer.element_ids_for_rarity("anything"), vec![0, 1, 2]);

        let mut pools = BTreeMap::new();
        pools.insert("rare".to_string(), vec![2]);
        let layer = layer.with_rarity_pools(pools);
        assert_eq!(layer.element_ids_for_rarity("rare"), vec![2]);
        assert!(layer.element_ids_for_rarity("original").is_empty());
    }
}
