//! Catalog module: the canonical collection of game entities
//!
//! This module contains:
//! - The `Entity` record and its localized/asset sub-structures
//! - The `Catalog` container with id lookup and document-shape preservation
//! - Pluggable keyword classification (`Classifier`)
//! - Pluggable identity matching for discovery records (`EntityMatcher`)

mod classify;
mod entity;
mod matcher;

pub use classify::{Category, Classifier, KeywordClassifier, MAX_FEATURES};
pub use entity::{
    AssetRefs, Entity, ImageMetadata, LocalizedText, PLAIN_TEXT_LANGUAGE,
};
pub use matcher::{matcher_for, EntityMatcher, IdMatcher, NameMatcher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// On-disk shape of a catalog document
///
/// Catalogs are either a bare array of games or an object with a `games`
/// array next to other top-level fields.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Wrapped {
        games: Vec<Entity>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Bare(Vec<Entity>),
}

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Bare,
    Wrapped(Map<String, Value>),
}

/// In-memory catalog of entities
///
/// Entities keep their document order. Lookups by id resolve to the first
/// entity carrying that id.
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<Entity>,
    by_id: HashMap<String, usize>,
    layout: Layout,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates an empty catalog that serializes as a bare array
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            by_id: HashMap::new(),
            layout: Layout::Bare,
        }
    }

    pub fn from_entities(entities: Vec<Entity>) -> Self {
        let mut catalog = Self::new();
        for entity in entities {
            catalog.push(entity);
        }
        catalog
    }

    /// Parses a catalog document
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let document: CatalogDocument = serde_json::from_str(content)?;
        let (entities, layout) = match document {
            CatalogDocument::Wrapped { games, extra } => (games, Layout::Wrapped(extra)),
            CatalogDocument::Bare(games) => (games, Layout::Bare),
        };

        let mut catalog = Self::from_entities(entities);
        catalog.layout = layout;
        Ok(catalog)
    }

    /// Serializes the catalog in the same shape it was loaded from
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        match &self.layout {
            Layout::Bare => serde_json::to_string_pretty(&self.entities),
            Layout::Wrapped(extra) => {
                #[derive(Serialize)]
                struct WrappedRef<'a> {
                    games: &'a [Entity],
                    #[serde(flatten)]
                    extra: &'a Map<String, Value>,
                }
                serde_json::to_string_pretty(&WrappedRef {
                    games: &self.entities,
                    extra,
                })
            }
        }
    }

    /// Appends an entity and returns its position
    pub fn push(&mut self, entity: Entity) -> usize {
        let position = self.entities.len();
        if self.by_id.contains_key(&entity.entity_id) {
            tracing::warn!(
                "Duplicate entity id '{}' in catalog; lookups use the first occurrence",
                entity.entity_id
            );
        } else {
            self.by_id.insert(entity.entity_id.clone(), position);
        }
        self.entities.push(entity);
        position
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.by_id.get(entity_id).map(|&i| &self.entities[i])
    }

    pub fn get_mut(&mut self, entity_id: &str) -> Option<&mut Entity> {
        match self.by_id.get(entity_id) {
            Some(&i) => self.entities.get_mut(i),
            None => None,
        }
    }

    pub fn position(&self, entity_id: &str) -> Option<usize> {
        self.by_id.get(entity_id).copied()
    }

    pub fn entity_at(&self, position: usize) -> Option<&Entity> {
        self.entities.get(position)
    }

    pub fn entity_at_mut(&mut self, position: usize) -> Option<&mut Entity> {
        self.entities.get_mut(position)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_round_trip() {
        let content = r#"[{"id": "a", "name": "Alpha", "platform": [], "features": []}]"#;
        let catalog = Catalog::from_json_str(content).unwrap();
        assert_eq!(catalog.len(), 1);

        let saved: Value = serde_json::from_str(&catalog.to_json_string().unwrap()).unwrap();
        assert!(saved.is_array());
        assert_eq!(saved[0]["name"], json!({"en": "Alpha"}));
    }

    #[test]
    fn test_wrapped_document_keeps_top_level_fields() {
        let content = r#"{
            "version": 3,
            "games": [{"id": "a", "name": {"en": "Alpha"}, "platform": ["Web"], "features": []}],
            "generatedBy": "harvester"
        }"#;
        let catalog = Catalog::from_json_str(content).unwrap();
        assert_eq!(catalog.len(), 1);

        let saved: Value = serde_json::from_str(&catalog.to_json_string().unwrap()).unwrap();
        assert_eq!(saved["version"], json!(3));
        assert_eq!(saved["generatedBy"], json!("harvester"));
        assert_eq!(saved["games"][0]["id"], json!("a"));
    }

    #[test]
    fn test_lookup_by_id() {
        let mut catalog = Catalog::from_entities(vec![Entity::new("a"), Entity::new("b")]);
        assert_eq!(catalog.position("b"), Some(1));
        assert!(catalog.get("c").is_none());

        catalog.get_mut("a").unwrap().category = Some("Slot Games".to_string());
        assert_eq!(
            catalog.get("a").unwrap().category.as_deref(),
            Some("Slot Games")
        );
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first() {
        let mut first = Entity::new("dup");
        first.category = Some("first".to_string());
        let mut second = Entity::new("dup");
        second.category = Some("second".to_string());

        let catalog = Catalog::from_entities(vec![first, second]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("dup").unwrap().category.as_deref(), Some("first"));
    }
}
