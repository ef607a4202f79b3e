//! Resolver module - locator probing and asset fetching
//!
//! This module contains the resolution machinery:
//! - The `AssetSource` seam and its HTTP implementation
//! - Concurrent existence probing with per-entity deduplication
//! - Fetching confirmed candidates into the asset store
//! - The coordinator that drives a full run over the catalog

mod coordinator;
mod counters;
mod fetcher;
mod outcome;
mod prober;
mod source;

pub use coordinator::{plan_candidates, run_resolve, CandidatePlan, Coordinator, Resolver};
pub use counters::{CounterSnapshot, RunCounters};
pub use fetcher::Fetcher;
pub use outcome::{EntityResolution, ResolutionOutcome};
pub use prober::{ProbeCache, Prober};
pub use source::{build_http_client, AssetSource, HttpAssetSource, TransportFailure};

use crate::state::InvalidTransition;
use crate::storage::StorageError;
use crate::ConfigError;
use thiserror::Error;

/// Errors that abort the resolution of a single entity
///
/// Transport failures are not errors here: they are recorded as
/// `ResolutionOutcome::TransportError` and the run moves on.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolution cancelled")]
    Cancelled,

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}
