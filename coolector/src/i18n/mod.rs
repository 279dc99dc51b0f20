//! Traductions
//!
//! Dictionnaires JSON imbriqués, aplatis en clés pointées (`common.details`).

use std::collections::HashMap;

use anyhow::{Context, Result};
use coolector_map::Translator;
use serde_json::Value;
use tracing::trace;

/// Catalogue de traductions d'une langue
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Catalogue anglais embarqué
    pub fn english() -> Result<Self> {
        Self::from_json(include_str!("en.json")).context("Failed to parse embedded en.json")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let mut entries = HashMap::new();
        flatten("", &root, &mut entries);
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

fn flatten(prefix: &str, value: &Value, entries: &mut HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, entries);
            }
        }
        Value::String(text) => {
            entries.insert(prefix.to_string(), text.clone());
        }
        other => {
            entries.insert(prefix.to_string(), other.to_string());
        }
    }
}

impl Translator for Catalog {
    /// Clé inconnue : la clé elle-même
    fn tr(&self, key: &str) -> String {
        match self.get(key) {
            Some(text) => text.to_string(),
            None => {
                trace!(key, "missing translation");
                key.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_catalog() {
        let catalog = Catalog::english().unwrap();
        assert_eq!(catalog.tr("common.details"), "Details");
        assert_eq!(catalog.tr("remark.category_litter"), "Litter");
        assert_eq!(catalog.tr("common.location_loaded"), "Location has been loaded.");
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        let catalog = Catalog::english().unwrap();
        assert_eq!(catalog.tr("remark.category_graffiti"), "remark.category_graffiti");
    }

    #[test]
    fn test_nested_keys() {
        let catalog = Catalog::from_json(r#"{"a": {"b": {"c": "deep"}}, "n": 3}"#).unwrap();
        assert_eq!(catalog.get("a.b.c"), Some("deep"));
        assert_eq!(catalog.get("n"), Some("3"));
        assert_eq!(catalog.len(), 2);
    }
}
