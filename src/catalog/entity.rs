//! Catalog entity model
//!
//! The field names follow the JSON catalog the site is built from (`id`,
//! `name`, `description`, `platform`, `images.local_main`, ...). Anything the
//! resolver does not understand is kept in the `extra` maps so a
//! load → merge → save cycle leaves it untouched.

use crate::locator::AssetKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Language a plain-string `name`/`description` is attributed to
pub const PLAIN_TEXT_LANGUAGE: &str = "en";

/// Language-tag → text mapping, at most one value per language
///
/// Deserializes from either a plain string (attributed to
/// [`PLAIN_TEXT_LANGUAGE`]) or an object of language tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LocalizedRepr", into = "BTreeMap<String, String>")]
pub struct LocalizedText(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr {
    Plain(String),
    ByLanguage(BTreeMap<String, Option<String>>),
}

impl From<LocalizedRepr> for LocalizedText {
    fn from(repr: LocalizedRepr) -> Self {
        match repr {
            LocalizedRepr::Plain(text) if text.trim().is_empty() => Self::default(),
            LocalizedRepr::Plain(text) => {
                Self(BTreeMap::from([(PLAIN_TEXT_LANGUAGE.to_string(), text)]))
            }
            LocalizedRepr::ByLanguage(map) => Self(
                map.into_iter()
                    .filter_map(|(lang, text)| text.map(|t| (lang, t)))
                    .filter(|(_, text)| !text.trim().is_empty())
                    .collect(),
            ),
        }
    }
}

impl From<LocalizedText> for BTreeMap<String, String> {
    fn from(text: LocalizedText) -> Self {
        text.0
    }
}

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    pub fn contains(&self, language: &str) -> bool {
        self.0.contains_key(language)
    }

    /// Inserts text for a language only if that language is not present yet
    ///
    /// Returns true if the text was added.
    pub fn insert_if_absent(&mut self, language: &str, text: &str) -> bool {
        if self.0.contains_key(language) || text.trim().is_empty() {
            return false;
        }
        self.0.insert(language.to_string(), text.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for LocalizedText {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Resolved local asset paths (`images` in the catalog)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRefs {
    #[serde(rename = "local_main", default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    #[serde(rename = "local_icon", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Remote URLs and anything else stored next to the local paths
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AssetRefs {
    /// Returns the recorded path for a kind, ignoring empty strings
    pub fn get(&self, kind: AssetKind) -> Option<&str> {
        let slot = match kind {
            AssetKind::Primary => &self.primary,
            AssetKind::Icon => &self.icon,
        };
        slot.as_deref().filter(|p| !p.is_empty())
    }

    pub(crate) fn set(&mut self, kind: AssetKind, path: String) {
        match kind {
            AssetKind::Primary => self.primary = Some(path),
            AssetKind::Icon => self.icon = Some(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.icon.is_none() && self.extra.is_empty()
    }
}

/// Provenance of the canonical image (`imageMetadata` in the catalog)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Canonical numeric image id, stored as a string or a number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A catalog record for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "id")]
    pub entity_id: String,

    #[serde(rename = "name", default)]
    pub names: LocalizedText,

    #[serde(rename = "description", default)]
    pub descriptions: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(rename = "platform", default)]
    pub platforms: Vec<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(rename = "images", default, skip_serializing_if = "AssetRefs::is_empty")]
    pub asset_refs: AssetRefs,

    #[serde(
        rename = "imageMetadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_metadata: Option<ImageMetadata>,

    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Creates an entity with only an id
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            names: LocalizedText::new(),
            descriptions: LocalizedText::new(),
            category: None,
            platforms: Vec::new(),
            features: Vec::new(),
            asset_refs: AssetRefs::default(),
            image_metadata: None,
            extra: Map::new(),
        }
    }

    /// Sets the canonical base id (builder style, mostly for tests and fixtures)
    pub fn with_base_id(mut self, base_id: u32) -> Self {
        self.image_metadata
            .get_or_insert_with(ImageMetadata::default)
            .id = Some(Value::String(base_id.to_string()));
        self
    }

    pub fn with_names(mut self, names: LocalizedText) -> Self {
        self.names = names;
        self
    }

    /// The numeric id used to build locators, if the entity carries one
    ///
    /// Accepts either a JSON number or a string of digits; anything else is
    /// treated as absent.
    pub fn canonical_base_id(&self) -> Option<u32> {
        match self.image_metadata.as_ref()?.id.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// An entity is valid once it has an id and at least one name
    pub fn is_valid(&self) -> bool {
        !self.entity_id.trim().is_empty() && !self.names.is_empty()
    }

    /// All human-readable text, lowercased, for keyword matching
    pub fn search_text(&self) -> String {
        let mut text = self.entity_id.to_lowercase();
        for value in self.names.values().chain(self.descriptions.values()) {
            text.push(' ');
            text.push_str(&value.to_lowercase());
        }
        if let Some(category) = &self.category {
            text.push(' ');
            text.push_str(&category.to_lowercase());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_name_becomes_default_language() {
        let entity: Entity =
            serde_json::from_value(json!({"id": "g1", "name": "Dragon Treasure"})).unwrap();
        assert_eq!(entity.names.get("en"), Some("Dragon Treasure"));
        assert_eq!(entity.names.len(), 1);
    }

    #[test]
    fn test_localized_name_map() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "g1",
            "name": {"en": "Dragon Treasure", "zh-cn": "龙之宝藏", "th": null, "vi": ""}
        }))
        .unwrap();
        assert_eq!(entity.names.len(), 2);
        assert_eq!(entity.names.get("zh-cn"), Some("龙之宝藏"));
        assert!(!entity.names.contains("th"));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let original = json!({
            "id": "dragon-1",
            "name": {"en": "Dragon"},
            "description": {"en": "A slot"},
            "category": "Slot Games",
            "platform": ["Web"],
            "features": ["Free Spins"],
            "provider": "WG",
            "rating": 4.7,
            "links": {"main": "https://wg.com/games/dragon-1"},
            "images": {"main": "https://wg.com/img/5001.webp", "local_main": "/assets/a.webp"},
            "imageMetadata": {"id": "5001", "language": "zh", "source": "wg.com", "format": "webp"}
        });

        let entity: Entity = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(entity.extra.get("provider"), Some(&json!("WG")));
        assert_eq!(
            entity.asset_refs.extra.get("main"),
            Some(&json!("https://wg.com/img/5001.webp"))
        );

        let back = serde_json::to_value(&entity).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_canonical_base_id_forms() {
        let from_string: Entity =
            serde_json::from_value(json!({"id": "a", "imageMetadata": {"id": "5001"}})).unwrap();
        assert_eq!(from_string.canonical_base_id(), Some(5001));

        let from_number: Entity =
            serde_json::from_value(json!({"id": "a", "imageMetadata": {"id": 3035}})).unwrap();
        assert_eq!(from_number.canonical_base_id(), Some(3035));

        let garbage: Entity =
            serde_json::from_value(json!({"id": "a", "imageMetadata": {"id": "abc"}})).unwrap();
        assert_eq!(garbage.canonical_base_id(), None);

        assert_eq!(Entity::new("a").canonical_base_id(), None);
        assert_eq!(Entity::new("a").with_base_id(42).canonical_base_id(), Some(42));
    }

    #[test]
    fn test_asset_refs_ignore_empty_paths() {
        let mut refs = AssetRefs::default();
        assert_eq!(refs.get(AssetKind::Primary), None);

        refs.primary = Some(String::new());
        assert_eq!(refs.get(AssetKind::Primary), None);

        refs.set(AssetKind::Icon, "/assets/icon.webp".to_string());
        assert_eq!(refs.get(AssetKind::Icon), Some("/assets/icon.webp"));
    }

    #[test]
    fn test_validity_requires_a_name() {
        let entity = Entity::new("g1");
        assert!(!entity.is_valid());

        let entity = entity.with_names(LocalizedText::from([("en", "Gold Rush")]));
        assert!(entity.is_valid());
    }

    #[test]
    fn test_insert_if_absent_keeps_first_value() {
        let mut names = LocalizedText::from([("en", "A")]);
        assert!(!names.insert_if_absent("en", "B"));
        assert!(names.insert_if_absent("zh", "C"));
        assert!(!names.insert_if_absent("th", "   "));
        assert_eq!(names.get("en"), Some("A"));
        assert_eq!(names.get("zh"), Some("C"));
    }
}
