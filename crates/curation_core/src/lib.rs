//! Core curation workflow logic.
//! This crate is the single source of truth for curation invariants.

pub mod config;
pub mod counts;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod view;
pub mod workflow;

pub use config::{SaveMode, ServiceOptions};
pub use counts::{
    compute_counts, duplicate_summary, exclusion_breakdown, CurationCounts, ExclusionGroup,
    PhaseCounts,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::column::{Column, PhaseId, WorkflowVariant};
pub use model::document::{CurationDocument, CurationError};
pub use model::import::{Import, ImportId};
pub use model::stub_study::{StubMetadataPatch, StubStudy, StubStudyId};
pub use model::tag::{
    Tag, TagDictionary, TagId, DUPLICATE_TAG_ID, IRRELEVANT_TAG_ID, NEEDS_REVIEW_TAG_ID,
    OUT_OF_SCOPE_TAG_ID,
};
pub use notify::{Notification, NotificationHub, NotificationKind, NotificationQueue, NotificationSink};
pub use repo::curation_store::{
    document_from_json, document_to_json, CurationStore, ProjectSummary, SqliteCurationStore,
    StoreError, StoreResult,
};
pub use service::curation_service::{ApplyOutcome, CurationService, ServiceError};
pub use view::selection::{ActionBar, ActionButton, CurationView, SelectionError, ViewMode};
pub use workflow::graph::{Transition, WorkflowGraph};
pub use workflow::machine::{apply_verb, apply_verb_detailed, remove_exclusion_tag, Applied};
pub use workflow::verb::{TagSelector, Verb, VerbKind};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
