//! State module for tracking resolution progress
//!
//! Every (entity, asset kind) pair moves through a small state machine while
//! it is being resolved:
//!
//! ```text
//! Unresolved → Probing → Resolved
//!                      → Exhausted
//!                      → Failed
//! ```

mod resolution_state;

pub use resolution_state::{InvalidTransition, ResolutionState};
