//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate state machine, view state and persistence into screen-level
//!   APIs.
//! - Keep UI layers decoupled from storage details.

pub mod curation_service;
