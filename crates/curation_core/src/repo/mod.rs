//! Repository layer: persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the whole-document persistence port used by the service layer.
//! - Isolate SQLite query details from curation orchestration.
//!
//! # Invariants
//! - Stores validate documents before persisting and after loading.

pub mod curation_store;
