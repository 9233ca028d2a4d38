//! Curation workflow engine.
//!
//! # Responsibility
//! - Define the closed verb set and the per-variant phase graphs.
//! - Compute document transitions for selected stubs.
//!
//! # Invariants
//! - Legality is decided only by `WorkflowGraph`; UI labels consume the same
//!   table.

pub mod graph;
pub mod machine;
pub mod verb;
