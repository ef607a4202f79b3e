//! Asset-Sweep: a concurrent asset resolver for game catalogs
//!
//! This crate probes a combinatorial space of remote image locators
//! (language × numeric id × asset kind) for every entity in a catalog, fetches
//! the single best match per entity and kind, and folds the results and any
//! partial discovery records back into the canonical catalog.

pub mod catalog;
pub mod config;
pub mod locator;
pub mod merge;
pub mod output;
pub mod resolver;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Asset-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Language preference list is empty")]
    EmptyLanguages,
}

/// Result type alias for Asset-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{Catalog, Entity};
pub use config::Config;
pub use locator::{AssetKind, LocatorCandidate};
pub use resolver::{Coordinator, ResolutionOutcome};
pub use state::ResolutionState;
