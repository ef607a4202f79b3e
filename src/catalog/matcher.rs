//! Identity matching for discovery records

use crate::catalog::Entity;
use crate::config::{MatchStrategy, MergeConfig};

/// Strategy that decides which catalog entity a discovery record belongs to
///
/// Two records with the same identity key describe the same entity. A record
/// without a key cannot be matched.
pub trait EntityMatcher: Send + Sync {
    fn identity_key(&self, entity: &Entity) -> Option<String>;
}

/// Matches on a language-insensitive name key
///
/// The default-language name is preferred; otherwise the first available
/// name (by language tag) is used. Keys are trimmed and lowercased.
pub struct NameMatcher {
    default_language: String,
}

impl NameMatcher {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            default_language: default_language.into(),
        }
    }
}

impl EntityMatcher for NameMatcher {
    fn identity_key(&self, entity: &Entity) -> Option<String> {
        let name = entity
            .names
            .get(&self.default_language)
            .or_else(|| entity.names.values().next())?;

        let key = name.trim().to_lowercase();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }
}

/// Matches on the entity id
pub struct IdMatcher;

impl EntityMatcher for IdMatcher {
    fn identity_key(&self, entity: &Entity) -> Option<String> {
        let id = entity.entity_id.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }
}

/// Builds the matcher selected by the merge configuration
pub fn matcher_for(config: &MergeConfig) -> Box<dyn EntityMatcher> {
    match config.match_by {
        MatchStrategy::Name => Box::new(NameMatcher::new(config.default_language.clone())),
        MatchStrategy::Id => Box::new(IdMatcher),
    }
}
