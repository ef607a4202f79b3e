//! Output module for run summaries and reports
//!
//! This module handles:
//! - The end-of-run summary printed after a resolution pass
//! - Statistics read back from the run ledger
//! - Markdown reports of the latest run

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, RunStatistics};

use crate::locator::AssetKind;
use crate::resolver::CounterSnapshot;
use crate::storage::{RunStatus, StorageError};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("No resolution runs found in the ledger")]
    NoRuns,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// In-memory summary of a finished resolution run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: i64,
    pub status: RunStatus,
    pub entities_total: usize,
    pub counters: CounterSnapshot,
    /// (entity, kind) pairs for which no candidate existed
    pub exhausted: Vec<(String, AssetKind)>,
    /// Entities whose resolution aborted on a storage error
    pub failed_entities: Vec<String>,
    pub duration: Duration,
}

impl RunSummary {
    /// Prints the summary to stdout
    pub fn print_summary(&self) {
        let c = &self.counters;

        println!("=== Resolution Run {} ({}) ===\n", self.run_id, self.status.to_db_string());
        println!("Entities:");
        println!("  Total: {}", self.entities_total);
        println!("  Processed: {}", c.entities_processed);
        println!("  Updated: {}", c.entities_updated);
        println!("  Failed: {}", c.entities_failed);
        println!();

        println!("Outcomes:");
        println!("  Fetched: {}", c.fetched);
        println!("  Already present: {}", c.already_present);
        println!("  Not found: {}", c.not_found);
        println!("  Transport failed: {}", c.transport_failed);
        println!();

        println!("Requests:");
        println!("  Probes: {}", c.probes_sent);
        println!("  Fetches: {}", c.fetch_requests);
        println!("  Duration: {:.1}s", self.duration.as_secs_f64());
        if c.checkpoints_failed > 0 {
            println!("  Failed checkpoints: {}", c.checkpoints_failed);
        }
        println!();

        if !self.exhausted.is_empty() {
            println!("Exhausted ({}):", self.exhausted.len());
            for (entity_id, kind) in &self.exhausted {
                println!("  - {} ({})", entity_id, kind);
            }
            println!();
        }

        if !self.failed_entities.is_empty() {
            println!("Failed entities ({}):", self.failed_entities.len());
            for entity_id in &self.failed_entities {
                println!("  - {}", entity_id);
            }
        }
    }
}
