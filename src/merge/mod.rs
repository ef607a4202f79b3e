//! Record merging
//!
//! Two independent merges write into the canonical catalog:
//! - Resolution merge: folds a resolution outcome into an entity's asset refs
//! - Discovery merge: unifies partial records from separate harvesting passes
//!
//! Both are idempotent and never remove data.

mod discovery;
mod resolution;

pub use discovery::{merge_records, normalize_record, DiscoveryMerger, MergeAction, MergeReport};
pub use resolution::apply_resolution;
