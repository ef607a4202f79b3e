use crate::locator::AssetKind;
use crate::state::ResolutionState;
use std::collections::BTreeMap;

/// Final result of resolving one (entity, kind) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The asset was already recorded or already stored; nothing was downloaded
    AlreadyPresent { path: String },

    /// The asset was downloaded and stored during this run
    Fetched { path: String },

    /// No candidate exists
    NotFound,

    /// The winning candidate could not be downloaded
    TransportError { url: String, reason: String },
}

impl ResolutionOutcome {
    /// Local path recorded for a successful outcome
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::AlreadyPresent { path } | Self::Fetched { path } => Some(path),
            Self::NotFound | Self::TransportError { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.path().is_some()
    }

    /// Failure description stored in the ledger
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::TransportError { url, reason } => Some(format!("{}: {}", url, reason)),
            _ => None,
        }
    }

    /// Terminal state this outcome puts the (entity, kind) pair in
    pub fn state(&self) -> ResolutionState {
        match self {
            Self::AlreadyPresent { .. } | Self::Fetched { .. } => ResolutionState::Resolved,
            Self::NotFound => ResolutionState::Exhausted,
            Self::TransportError { .. } => ResolutionState::Failed,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::AlreadyPresent { .. } => "already_present",
            Self::Fetched { .. } => "fetched",
            Self::NotFound => "not_found",
            Self::TransportError { .. } => "transport_error",
        }
    }
}

/// Outcomes of every asset kind for one entity
#[derive(Debug, Clone)]
pub struct EntityResolution {
    pub entity_id: String,
    pub outcomes: BTreeMap<AssetKind, ResolutionOutcome>,
    /// Number of distinct URLs probed for this entity
    pub probes: usize,
}

impl EntityResolution {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            outcomes: BTreeMap::new(),
            probes: 0,
        }
    }

    pub fn outcome(&self, kind: AssetKind) -> Option<&ResolutionOutcome> {
        self.outcomes.get(&kind)
    }

    pub fn state(&self, kind: AssetKind) -> ResolutionState {
        self.outcomes
            .get(&kind)
            .map(ResolutionOutcome::state)
            .unwrap_or(ResolutionState::Unresolved)
    }

    /// Kinds for which no candidate exists
    pub fn exhausted_kinds(&self) -> Vec<AssetKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ResolutionOutcome::NotFound))
            .map(|(kind, _)| *kind)
            .collect()
    }
}
