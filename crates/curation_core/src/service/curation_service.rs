//! Curation use-case service.
//!
//! # Responsibility
//! - Own the current document snapshot, view state and derived counts.
//! - Run user actions through the state machine and commit the results.
//! - Persist committed snapshots and publish save notifications.
//!
//! # Invariants
//! - The in-memory snapshot is the source of truth; a failed save never rolls
//!   it back and leaves the service dirty for the next attempt.
//! - Counts and view state are reconciled on every commit.
//! - Rejected actions leave document, view and dirty flag unchanged.

use crate::config::{SaveMode, ServiceOptions};
use crate::counts::{compute_counts, duplicate_summary, CurationCounts};
use crate::model::column::{PhaseId, WorkflowVariant};
use crate::model::document::{CurationDocument, CurationError};
use crate::model::import::Import;
use crate::model::stub_study::{StubMetadataPatch, StubStudy, StubStudyId};
use crate::model::tag::Tag;
use crate::notify::{Notification, NotificationHub};
use crate::repo::curation_store::{CurationStore, StoreError};
use crate::view::selection::{ActionBar, CurationView, SelectionError};
use crate::workflow::machine::{apply_verb_detailed, remove_exclusion_tag};
use crate::workflow::verb::{Verb, VerbKind};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors surfaced by service operations.
#[derive(Debug)]
pub enum ServiceError {
    Curation(CurationError),
    Selection(SelectionError),
    /// Only returned by `open` and `flush`; commit-time save failures are
    /// reported through notifications instead.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Curation(err) => write!(f, "{err}"),
            Self::Selection(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Curation(err) => Some(err),
            Self::Selection(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<CurationError> for ServiceError {
    fn from(value: CurationError) -> Self {
        Self::Curation(value)
    }
}

impl From<SelectionError> for ServiceError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Summary of one applied verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub verb: VerbKind,
    pub affected: Vec<StubStudyId>,
    /// Destination phase for move verbs.
    pub destination: Option<PhaseId>,
    /// Tag attached by tag verbs.
    pub tag: Option<Tag>,
}

/// Curation screen facade over a persistence store.
pub struct CurationService<S: CurationStore> {
    project_id: String,
    document: CurationDocument,
    counts: CurationCounts,
    view: CurationView,
    store: S,
    hub: NotificationHub,
    options: ServiceOptions,
    dirty: bool,
}

impl<S: CurationStore> CurationService<S> {
    /// Creates a service around an already loaded document.
    pub fn new(
        project_id: impl Into<String>,
        document: CurationDocument,
        store: S,
        hub: NotificationHub,
        options: ServiceOptions,
    ) -> Self {
        let counts = compute_counts(&document);
        Self {
            project_id: project_id.into(),
            document,
            counts,
            view: CurationView::new(),
            store,
            hub,
            options,
            dirty: false,
        }
    }

    /// Loads the project from `store`, or starts an empty `fallback` document.
    pub fn open(
        project_id: impl Into<String>,
        store: S,
        hub: NotificationHub,
        options: ServiceOptions,
        fallback: WorkflowVariant,
    ) -> Result<Self, ServiceError> {
        let project_id = project_id.into();
        let (document, loaded) = match store.load(&project_id)? {
            Some(document) => (document, true),
            None => (CurationDocument::new(fallback), false),
        };
        info!(
            "event=project_open module=service status=ok loaded={loaded} variant={} studies={}",
            document.variant(),
            document.study_count()
        );
        Ok(Self::new(project_id, document, store, hub, options))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn document(&self) -> &CurationDocument {
        &self.document
    }

    pub fn counts(&self) -> &CurationCounts {
        &self.counts
    }

    pub fn duplicate_summary(&self) -> String {
        duplicate_summary(&self.document)
    }

    pub fn view(&self) -> &CurationView {
        &self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether committed changes have not reached the store yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn select_phase(&mut self, index: usize) -> Result<(), ServiceError> {
        self.view.select_phase(&self.document, index)?;
        debug!("event=select_phase module=service status=ok phase_index={index}");
        Ok(())
    }

    pub fn enter_focus_mode(&mut self, study_id: &str) -> Result<(), ServiceError> {
        Ok(self.view.enter_focus_mode(&self.document, study_id)?)
    }

    pub fn exit_focus_mode(&mut self) {
        self.view.exit_focus_mode();
    }

    pub fn toggle_select(&mut self, study_id: &str) -> Result<bool, ServiceError> {
        Ok(self.view.toggle_select(&self.document, study_id)?)
    }

    pub fn select_all(&mut self) -> Result<(), ServiceError> {
        Ok(self.view.select_all(&self.document)?)
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    pub fn action_bar(&self) -> ActionBar {
        self.view.action_bar(&self.document)
    }

    /// Applies `verb` to the current targets (selection or focused study).
    pub fn apply(&mut self, verb: &Verb) -> Result<ApplyOutcome, ServiceError> {
        let targets = self.view.action_targets();
        self.apply_to(&targets, verb)
    }

    /// Applies `verb` to explicit studies of the current phase.
    ///
    /// The selection is cleared after a successful table-view action.
    pub fn apply_to(
        &mut self,
        study_ids: &[StubStudyId],
        verb: &Verb,
    ) -> Result<ApplyOutcome, ServiceError> {
        let phase_index = self.view.current_phase();
        let applied = match apply_verb_detailed(&self.document, study_ids, phase_index, verb) {
            Ok(applied) => applied,
            Err(err) => {
                log_rejected("apply_verb", &err);
                return Err(err.into());
            }
        };

        info!(
            "event=apply_verb module=service status=ok verb={} phase_index={phase_index} count={} tag_created={}",
            verb.kind(),
            applied.affected.len(),
            applied.tag_created
        );
        let outcome = ApplyOutcome {
            verb: verb.kind(),
            affected: applied.affected,
            destination: applied.destination,
            tag: applied.tag,
        };
        if !outcome.affected.is_empty() {
            self.commit(applied.document);
        }
        self.view.clear_selection();
        Ok(outcome)
    }

    /// Clears exclusion tags of the given studies in any phase.
    pub fn remove_exclusion_tag(&mut self, study_ids: &[StubStudyId]) -> Result<(), ServiceError> {
        let next = remove_exclusion_tag(&self.document, study_ids).map_err(|err| {
            log_rejected("remove_exclusion_tag", &err);
            ServiceError::from(err)
        })?;
        if next != self.document {
            self.commit(next);
        }
        Ok(())
    }

    /// Returns the tag labelled `label`, adding it to the dictionary if new.
    pub fn create_tag(&mut self, label: &str) -> Result<Tag, ServiceError> {
        let (next, tag) = self.document.create_tag(label)?;
        if next != self.document {
            info!("event=create_tag module=service status=ok tag_id={}", tag.id);
            self.commit(next);
        }
        Ok(tag)
    }

    /// Edits bibliographic fields of one study.
    pub fn update_stub_metadata(
        &mut self,
        study_id: &str,
        patch: &StubMetadataPatch,
    ) -> Result<(), ServiceError> {
        if patch.is_empty() {
            return Ok(());
        }
        let next = self
            .document
            .update_stub_metadata(study_id, patch)
            .map_err(|err| {
                log_rejected("update_stub_metadata", &err);
                ServiceError::from(err)
            })?;
        self.commit(next);
        Ok(())
    }

    /// Appends an import batch to the first phase.
    pub fn ingest_import(
        &mut self,
        import: Import,
        stubs: Vec<StubStudy>,
    ) -> Result<(), ServiceError> {
        let count = stubs.len();
        let next = self.document.ingest_import(import, stubs)?;
        info!("event=ingest_import module=service status=ok count={count}");
        self.commit(next);
        Ok(())
    }

    /// Writes pending changes now.
    ///
    /// # Errors
    /// - `Store` when the save fails; the service stays dirty.
    pub fn flush(&mut self) -> Result<(), ServiceError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist().map_err(ServiceError::from)
    }

    fn commit(&mut self, next: CurationDocument) {
        let before = std::mem::replace(&mut self.document, next);
        self.view.reconcile(&before, &self.document);
        self.counts = compute_counts(&self.document);
        self.dirty = true;

        if self.options.save_mode == SaveMode::Immediate {
            if let Err(err) = self.persist() {
                // Published to the hub; the next commit or flush retries.
                debug!("event=commit module=service status=pending_save error={err}");
            }
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        match self.store.save(&self.project_id, &self.document) {
            Ok(()) => {
                self.dirty = false;
                if self.options.notify_on_save_success {
                    self.hub.publish(Notification::success("Changes saved"));
                }
                Ok(())
            }
            Err(err) => {
                warn!("event=project_save module=service status=error error={err}");
                self.hub
                    .publish(Notification::error(format!("Failed to save changes: {err}")));
                Err(err)
            }
        }
    }
}

fn log_rejected(event: &str, err: &CurationError) {
    match err {
        CurationError::StudyNotFound { .. } => {
            error!("event={event} module=service status=error error_code=study_not_found error={err}")
        }
        _ => warn!("event={event} module=service status=rejected error={err}"),
    }
}
