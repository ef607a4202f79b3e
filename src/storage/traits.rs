//! Storage traits and error types
//!
//! This module defines the trait interfaces for the three storage backends
//! and their shared error type:
//! - `AssetStore`: key → bytes store for downloaded images
//! - `CatalogStore`: load/save of the canonical catalog document
//! - `RunLedger`: per-run outcome records

use crate::catalog::Catalog;
use crate::locator::AssetKind;
use crate::resolver::ResolutionOutcome;
use crate::storage::{OutcomeRecord, RunRecord, RunStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Catalog serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key → bytes store for resolved assets
///
/// Implementations must make `put` atomic: a reader either sees no object
/// under the key or the complete bytes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns true if an object is stored under `key`
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Stores `bytes` under `key`, replacing any previous object
    async fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<()>;
}

/// Persistence for the canonical catalog
///
/// Saves run on the blocking pool during a resolution run, so stores must be
/// shareable across threads.
pub trait CatalogStore: Send + Sync {
    /// Loads the catalog; a missing document yields an empty catalog
    fn load(&self) -> StorageResult<Catalog>;

    /// Saves the catalog atomically
    fn save(&self, catalog: &Catalog) -> StorageResult<()>;
}

/// Trait for run ledger implementations
///
/// The ledger records one row per finalized (entity, kind) outcome of every
/// run, so statistics and reports can be produced after the process exits.
pub trait RunLedger {
    // ===== Run Management =====

    /// Creates a new run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Lists all runs, newest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;

    /// Closes a run with a final status and a finish timestamp
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Outcomes =====

    /// Records the final outcome of one (entity, kind) pair
    ///
    /// Recording the same pair twice in one run keeps the latest row.
    fn record_outcome(
        &mut self,
        run_id: i64,
        entity_id: &str,
        kind: AssetKind,
        outcome: &ResolutionOutcome,
    ) -> StorageResult<()>;

    /// Gets every outcome recorded for a run
    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>>;

    /// Counts outcomes by label (`fetched`, `not_found`, ...)
    fn count_outcomes(&self, run_id: i64) -> StorageResult<HashMap<String, u64>>;

    /// Gets the (entity, kind) pairs that ended without any candidate
    fn get_exhausted(&self, run_id: i64) -> StorageResult<Vec<(String, AssetKind)>>;
}
