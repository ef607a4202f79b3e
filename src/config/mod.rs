//! Configuration module for Asset-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use asset_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("asset-sweep.toml")).unwrap();
//! println!("Probing in languages: {:?}", config.resolver.languages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, KeywordRangeEntry, MatchStrategy, MergeConfig, RemoteConfig, ResolverConfig,
    StorageConfig, WindowEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
