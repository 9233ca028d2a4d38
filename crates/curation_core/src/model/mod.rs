//! Curation domain model.
//!
//! # Responsibility
//! - Define the normalized in-memory curation document and its records.
//! - Keep one canonical shape shared by table and focus views.
//!
//! # Invariants
//! - Every stub study lives in exactly one column.
//! - Stubs reference tags by id; the dictionary is the single tag source.

pub mod column;
pub mod document;
pub mod import;
pub mod stub_study;
pub mod tag;
