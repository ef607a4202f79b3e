//! Candidate generation
//!
//! `CandidateGenerator::generate` is a pure function of an entity and the
//! language preference list. It produces batches in probe order:
//!
//! 1. The canonical base id, if the entity carries one
//! 2. One batch per keyword range whose keyword occurs in the entity text
//! 3. One batch per fallback window
//!
//! Inside a batch candidates are ordered by id, then language preference,
//! then asset kind. For a fixed (entity, kind) that order is the selection
//! order the resolver scans.

use crate::catalog::Entity;
use crate::locator::{AssetKind, IdWindow, LocatorCandidate, LocatorTemplate, RangeTable};
use crate::ConfigError;
use std::fmt;

/// Where a batch of candidates came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchTier {
    Canonical(u32),
    Keyword(String),
    Window(IdWindow),
}

impl fmt::Display for BatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(id) => write!(f, "canonical {}", id),
            Self::Keyword(keyword) => write!(f, "keyword '{}'", keyword),
            Self::Window(w) => write!(f, "window {}-{}", w.start, w.end),
        }
    }
}

/// A group of candidates probed together
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub tier: BatchTier,
    pub candidates: Vec<LocatorCandidate>,
}

impl CandidateBatch {
    /// Candidates of one kind, in selection order
    pub fn of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &LocatorCandidate> {
        self.candidates.iter().filter(move |c| c.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Produces the ordered candidate batches for an entity
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    template: LocatorTemplate,
    ranges: RangeTable,
}

impl CandidateGenerator {
    pub fn new(template: LocatorTemplate, ranges: RangeTable) -> Self {
        Self { template, ranges }
    }

    pub fn template(&self) -> &LocatorTemplate {
        &self.template
    }

    /// Generates the probe batches for an entity
    ///
    /// # Arguments
    ///
    /// * `entity` - The entity to resolve
    /// * `languages` - Language preference list, most preferred first
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<CandidateBatch>)` - Batches in probe order
    /// * `Err(ConfigError::EmptyLanguages)` - The preference list is empty
    pub fn generate(
        &self,
        entity: &Entity,
        languages: &[String],
    ) -> Result<Vec<CandidateBatch>, ConfigError> {
        if languages.is_empty() {
            return Err(ConfigError::EmptyLanguages);
        }

        let mut batches = Vec::new();

        if let Some(base_id) = entity.canonical_base_id() {
            batches.push(CandidateBatch {
                tier: BatchTier::Canonical(base_id),
                candidates: self.expand(base_id..=base_id, languages),
            });
        }

        let text = entity.search_text();
        for range in self.ranges.matching_ranges(&text) {
            batches.push(CandidateBatch {
                tier: BatchTier::Keyword(range.keyword.clone()),
                candidates: self.expand(range.window.ids(), languages),
            });
        }

        for window in self.ranges.windows() {
            batches.push(CandidateBatch {
                tier: BatchTier::Window(*window),
                candidates: self.expand(window.ids(), languages),
            });
        }

        Ok(batches)
    }

    /// Total number of candidates `generate` would produce
    pub fn candidate_count(&self, entity: &Entity, languages: &[String]) -> Result<usize, ConfigError> {
        Ok(self
            .generate(entity, languages)?
            .iter()
            .map(CandidateBatch::len)
            .sum())
    }

    fn expand(
        &self,
        ids: impl Iterator<Item = u32>,
        languages: &[String],
    ) -> Vec<LocatorCandidate> {
        let mut candidates = Vec::new();
        for id in ids {
            for language in languages {
                for kind in AssetKind::ALL {
                    candidates.push(self.template.candidate(language, id, kind));
                }
            }
        }
        candidates
    }
}
