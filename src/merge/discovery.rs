//! Discovery merge: unifying partial records from separate passes
//!
//! # Merge Rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `names`, `descriptions` | Union by language; the first value seen for a language wins |
//! | `features`, `platforms` | The side with the strictly larger distinct set wins; ties keep existing |
//! | `category`, `imageMetadata` | Filled only when missing |
//! | `images` | Each path filled only when missing |
//! | unknown fields | Added only when the key is missing |
//!
//! "First seen" means the earliest merge call: whatever is already in the
//! catalog beats the incoming record.

use crate::catalog::{
    Catalog, Classifier, Entity, EntityMatcher, ImageMetadata, LocalizedText, MAX_FEATURES,
};
use crate::locator::AssetKind;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const DEFAULT_PLATFORMS: [&str; 2] = ["Web", "Mobile"];

/// What happened to one discovery record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// No entity matched; the record became a new entity
    Created { entity_id: String },
    /// The record was folded into an existing entity
    Merged { entity_id: String, changed: bool },
    /// The record has no id or no name
    Rejected { reason: String },
}

/// Totals for one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
}

impl MergeReport {
    pub fn record(&mut self, action: &MergeAction) {
        match action {
            MergeAction::Created { .. } => self.created += 1,
            MergeAction::Merged { changed: true, .. } => self.updated += 1,
            MergeAction::Merged { changed: false, .. } => self.unchanged += 1,
            MergeAction::Rejected { .. } => self.rejected += 1,
        }
    }

    /// Entities created or modified
    pub fn touched(&self) -> usize {
        self.created + self.updated
    }
}

fn union_text(target: &mut LocalizedText, incoming: &LocalizedText) -> bool {
    let mut changed = false;
    for (language, text) in incoming.iter() {
        changed |= target.insert_if_absent(language, text);
    }
    changed
}

fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

/// Replaces `target` with `incoming` if the incoming distinct set is strictly larger
fn larger_set_wins(target: &mut Vec<String>, incoming: &[String], cap: Option<usize>) -> bool {
    let mut incoming = distinct(incoming);
    if let Some(cap) = cap {
        incoming.truncate(cap);
    }

    if incoming.len() > distinct(target).len() {
        *target = incoming;
        true
    } else {
        false
    }
}

fn fill_missing_keys(target: &mut Map<String, Value>, incoming: &Map<String, Value>) -> bool {
    let mut changed = false;
    for (key, value) in incoming {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

fn merge_image_metadata(target: &mut Option<ImageMetadata>, incoming: &Option<ImageMetadata>) -> bool {
    let incoming = match incoming {
        Some(incoming) => incoming,
        None => return false,
    };

    match target {
        None => {
            *target = Some(incoming.clone());
            true
        }
        Some(existing) => {
            let mut changed = false;
            if existing.id.is_none() && incoming.id.is_some() {
                existing.id = incoming.id.clone();
                changed = true;
            }
            changed | fill_missing_keys(&mut existing.extra, &incoming.extra)
        }
    }
}

/// Folds `incoming` into `target` and returns true if `target` changed
///
/// Merging the same record twice changes nothing the second time.
pub fn merge_records(target: &mut Entity, incoming: &Entity) -> bool {
    let mut changed = false;

    changed |= union_text(&mut target.names, &incoming.names);
    changed |= union_text(&mut target.descriptions, &incoming.descriptions);

    changed |= larger_set_wins(&mut target.features, &incoming.features, Some(MAX_FEATURES));
    changed |= larger_set_wins(&mut target.platforms, &incoming.platforms, None);

    let has_category = target
        .category
        .as_deref()
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false);
    if !has_category {
        if let Some(category) = incoming.category.as_deref().filter(|c| !c.trim().is_empty()) {
            target.category = Some(category.to_string());
            changed = true;
        }
    }

    changed |= merge_image_metadata(&mut target.image_metadata, &incoming.image_metadata);

    for kind in AssetKind::ALL {
        if target.asset_refs.get(kind).is_none() {
            if let Some(path) = incoming.asset_refs.get(kind) {
                target.asset_refs.set(kind, path.to_string());
                changed = true;
            }
        }
    }
    changed |= fill_missing_keys(&mut target.asset_refs.extra, &incoming.asset_refs.extra);
    changed |= fill_missing_keys(&mut target.extra, &incoming.extra);

    changed
}

/// Fills the derived fields of a record that lacks them
///
/// - A missing category is classified from the record's text
/// - Empty features are tagged from the record's text
/// - Features and platforms are deduplicated; features are capped
/// - Empty platforms default to `Web` and `Mobile`
///
/// Returns true if the record changed.
pub fn normalize_record(record: &mut Entity, classifier: &dyn Classifier) -> bool {
    let mut changed = false;
    let text = record.search_text();

    if record.category.as_deref().map_or(true, |c| c.trim().is_empty()) {
        record.category = Some(classifier.classify(&text).label().to_string());
        changed = true;
    }

    let mut features = distinct(&record.features);
    if features.is_empty() {
        features = classifier.tag_features(&text);
    }
    features.truncate(MAX_FEATURES);
    if features != record.features {
        record.features = features;
        changed = true;
    }

    let mut platforms = distinct(&record.platforms);
    if platforms.is_empty() {
        platforms = DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect();
    }
    if platforms != record.platforms {
        record.platforms = platforms;
        changed = true;
    }

    changed
}

/// Folds discovery pass records into a catalog
pub struct DiscoveryMerger {
    matcher: Box<dyn EntityMatcher>,
    classifier: Box<dyn Classifier>,
}

impl DiscoveryMerger {
    pub fn new(matcher: Box<dyn EntityMatcher>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            matcher,
            classifier,
        }
    }

    fn build_index(&self, catalog: &Catalog) -> HashMap<String, usize> {
        let mut index = HashMap::new();
        for (position, entity) in catalog.iter().enumerate() {
            if let Some(key) = self.matcher.identity_key(entity) {
                index.entry(key).or_insert(position);
            }
        }
        index
    }

    /// Folds every record of one pass into the catalog, in order
    pub fn fold(&self, catalog: &mut Catalog, records: Vec<Entity>) -> MergeReport {
        let mut index = self.build_index(catalog);
        let mut report = MergeReport::default();

        for (i, record) in records.into_iter().enumerate() {
            let action = self.absorb(catalog, &mut index, record);
            if let MergeAction::Rejected { reason } = &action {
                tracing::warn!("Skipping discovery record #{}: {}", i, reason);
            }
            report.record(&action);
        }

        tracing::info!(
            "Discovery merge: {} created, {} updated, {} unchanged, {} rejected",
            report.created,
            report.updated,
            report.unchanged,
            report.rejected
        );
        report
    }

    /// Folds a single record into the catalog
    pub fn merge_one(&self, catalog: &mut Catalog, record: Entity) -> MergeAction {
        let mut index = self.build_index(catalog);
        self.absorb(catalog, &mut index, record)
    }

    fn absorb(
        &self,
        catalog: &mut Catalog,
        index: &mut HashMap<String, usize>,
        record: Entity,
    ) -> MergeAction {
        if record.entity_id.trim().is_empty() {
            return MergeAction::Rejected {
                reason: "record has no id".to_string(),
            };
        }
        if !record.is_valid() {
            return MergeAction::Rejected {
                reason: format!("record '{}' has no name", record.entity_id),
            };
        }

        let key = self.matcher.identity_key(&record);
        let position = key
            .as_ref()
            .and_then(|k| index.get(k).copied())
            .or_else(|| catalog.position(&record.entity_id));

        match position.and_then(|p| catalog.entity_at_mut(p).map(|e| (p, e))) {
            Some((position, target)) => {
                let mut changed = merge_records(target, &record);
                changed |= normalize_record(target, self.classifier.as_ref());
                let entity_id = target.entity_id.clone();
                if let Some(key) = key {
                    index.entry(key).or_insert(position);
                }
                tracing::debug!("Merged discovery record into '{}' (changed: {})", entity_id, changed);
                MergeAction::Merged { entity_id, changed }
            }
            None => {
                let mut record = record;
                normalize_record(&mut record, self.classifier.as_ref());
                let entity_id = record.entity_id.clone();
                let position = catalog.push(record);
                if let Some(key) = key {
                    index.insert(key, position);
                }
                tracing::debug!("Created entity '{}' from discovery record", entity_id);
                MergeAction::Created { entity_id }
            }
        }
    }
}
