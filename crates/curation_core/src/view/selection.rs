//! Selection and view controller.
//!
//! # Responsibility
//! - Track the current phase, table/focus view mode, multi-selection and
//!   focused study.
//! - Derive the action bar (targets, enabled state, verb buttons) from the
//!   workflow graph.
//!
//! # Invariants
//! - Selected ids always belong to the current phase's column.
//! - Changing phase always clears the selection.
//! - Selection is only held in table view; focus view targets one study.

use crate::model::column::PhaseId;
use crate::model::document::CurationDocument;
use crate::model::stub_study::StubStudyId;
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::verb::VerbKind;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Presentation mode for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Table,
    Focus,
}

/// Errors from view/selection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Operation requires table view.
    NotInTableView,
    /// Phase index does not exist in the document.
    PhaseOutOfRange(usize),
    /// Study is not in the current phase's column.
    StudyNotInPhase {
        study_id: StubStudyId,
        phase: PhaseId,
    },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInTableView => write!(f, "operation requires table view"),
            Self::PhaseOutOfRange(index) => write!(f, "phase index out of range: {index}"),
            Self::StudyNotInPhase { study_id, phase } => {
                write!(f, "study `{study_id}` is not in phase `{phase}`")
            }
        }
    }
}

impl Error for SelectionError {}

/// One verb button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub verb: VerbKind,
    pub label: &'static str,
}

/// Derived state of the bulk/focus action controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionBar {
    pub phase: PhaseId,
    pub enabled: bool,
    /// Number of studies a verb would act on.
    pub target_count: usize,
    pub buttons: Vec<ActionButton>,
}

/// UI state for one curation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurationView {
    current_phase: usize,
    view_mode: ViewMode,
    selected: Vec<StubStudyId>,
    focused: Option<StubStudyId>,
}

impl Default for CurationView {
    fn default() -> Self {
        Self::new()
    }
}

impl CurationView {
    /// Starts in table view on the first phase with nothing selected.
    pub fn new() -> Self {
        Self {
            current_phase: 0,
            view_mode: ViewMode::Table,
            selected: Vec::new(),
            focused: None,
        }
    }

    pub fn current_phase(&self) -> usize {
        self.current_phase
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Selected ids in the order they were selected.
    pub fn selected_ids(&self) -> &[StubStudyId] {
        &self.selected
    }

    pub fn focused_study(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Switches phase and clears the selection.
    ///
    /// View mode is kept. In focus view the first study of the new phase is
    /// focused; an empty phase returns to table view.
    pub fn select_phase(
        &mut self,
        document: &CurationDocument,
        index: usize,
    ) -> Result<(), SelectionError> {
        let column = document
            .column(index)
            .ok_or(SelectionError::PhaseOutOfRange(index))?;
        self.current_phase = index;
        self.selected.clear();
        if self.view_mode == ViewMode::Focus {
            match column.stub_studies.first() {
                Some(stub) => self.focused = Some(stub.id.clone()),
                None => self.exit_focus_mode(),
            }
        }
        Ok(())
    }

    /// Opens single-record view for a study of the current phase.
    pub fn enter_focus_mode(
        &mut self,
        document: &CurationDocument,
        study_id: &str,
    ) -> Result<(), SelectionError> {
        if self.view_mode != ViewMode::Table {
            return Err(SelectionError::NotInTableView);
        }
        self.ensure_in_current_phase(document, study_id)?;
        self.view_mode = ViewMode::Focus;
        self.focused = Some(study_id.to_string());
        self.selected.clear();
        Ok(())
    }

    /// Returns to table view.
    pub fn exit_focus_mode(&mut self) {
        self.view_mode = ViewMode::Table;
        self.focused = None;
    }

    /// Adds or removes one study from the selection.
    ///
    /// Returns whether the study is selected afterwards.
    pub fn toggle_select(
        &mut self,
        document: &CurationDocument,
        study_id: &str,
    ) -> Result<bool, SelectionError> {
        if self.view_mode != ViewMode::Table {
            return Err(SelectionError::NotInTableView);
        }
        self.ensure_in_current_phase(document, study_id)?;
        if let Some(position) = self.selected.iter().position(|id| id == study_id) {
            self.selected.remove(position);
            Ok(false)
        } else {
            self.selected.push(study_id.to_string());
            Ok(true)
        }
    }

    /// Selects every study of the current phase, in column order.
    pub fn select_all(&mut self, document: &CurationDocument) -> Result<(), SelectionError> {
        if self.view_mode != ViewMode::Table {
            return Err(SelectionError::NotInTableView);
        }
        let column = document
            .column(self.current_phase)
            .ok_or(SelectionError::PhaseOutOfRange(self.current_phase))?;
        self.selected = column.study_ids().map(str::to_string).collect();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Studies a verb would act on right now.
    pub fn action_targets(&self) -> Vec<StubStudyId> {
        match self.view_mode {
            ViewMode::Table => self.selected.clone(),
            ViewMode::Focus => self.focused.iter().cloned().collect(),
        }
    }

    /// Derives verb buttons and their enabled state.
    pub fn action_bar(&self, document: &CurationDocument) -> ActionBar {
        let graph = WorkflowGraph::for_variant(document.variant());
        let phase = document
            .column(self.current_phase)
            .map_or(PhaseId::Identification, |column| column.phase);
        let target_count = self.action_targets().len();
        ActionBar {
            phase,
            enabled: target_count > 0,
            target_count,
            buttons: graph
                .legal_verbs(self.current_phase)
                .into_iter()
                .map(|verb| ActionButton {
                    verb,
                    label: verb.label(),
                })
                .collect(),
        }
    }

    /// Reconciles view state after the document changed.
    ///
    /// Drops selected ids that left the current phase. In focus view, when the
    /// focused study left the phase, focus moves to the study now at its old
    /// position (or the last one); an emptied phase returns to table view.
    pub fn reconcile(&mut self, before: &CurationDocument, after: &CurationDocument) {
        let Some(column) = after.column(self.current_phase) else {
            self.current_phase = 0;
            self.selected.clear();
            self.exit_focus_mode();
            return;
        };
        self.selected.retain(|id| column.contains(id));

        if self.view_mode != ViewMode::Focus {
            return;
        }
        let Some(focused) = self.focused.clone() else {
            return;
        };
        if column.contains(&focused) {
            return;
        }

        let old_position = before
            .column(self.current_phase)
            .and_then(|previous| previous.position(&focused))
            .unwrap_or(0);
        match column.stub_studies.len() {
            0 => self.exit_focus_mode(),
            len => self.focused = Some(column.stub_studies[old_position.min(len - 1)].id.clone()),
        }
    }

    fn ensure_in_current_phase(
        &self,
        document: &CurationDocument,
        study_id: &str,
    ) -> Result<(), SelectionError> {
        let column = document
            .column(self.current_phase)
            .ok_or(SelectionError::PhaseOutOfRange(self.current_phase))?;
        if column.contains(study_id) {
            Ok(())
        } else {
            Err(SelectionError::StudyNotInPhase {
                study_id: study_id.to_string(),
                phase: column.phase,
            })
        }
    }
}
