//! Storage module for persisting resolution results
//!
//! This module handles everything that touches disk:
//! - The asset store the fetcher writes images into
//! - The JSON catalog document, loaded at start and saved at checkpoints
//! - The SQLite run ledger with per-run outcome rows

mod assets;
mod catalog_file;
mod schema;
mod sqlite;
mod traits;

pub use assets::FsAssetStore;
pub use catalog_file::JsonCatalogStore;
pub use sqlite::SqliteLedger;
pub use traits::{AssetStore, CatalogStore, RunLedger, StorageError, StorageResult};

use crate::locator::AssetKind;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opens (or creates) the run ledger database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteLedger)` - Successfully opened ledger
/// * `Err(StorageError)` - Failed to open the database
pub fn open_ledger(path: &Path) -> StorageResult<SqliteLedger> {
    SqliteLedger::new(path)
}

/// Represents a resolution run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One ledger row: the final outcome of an (entity, kind) pair in a run
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub run_id: i64,
    pub entity_id: String,
    pub kind: AssetKind,
    pub outcome: String,
    pub path: Option<String>,
    pub detail: Option<String>,
    pub recorded_at: String,
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary sibling path used while writing `path`
///
/// The name is unique per process and call, so concurrent writers of the
/// same destination never share a temp file.
pub(crate) fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

/// Writes `bytes` to `path` through a temp file and a rename
///
/// Parent directories are created as needed.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(path);
    let result = (|| {
        let mut file = std::fs::File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    result
}
