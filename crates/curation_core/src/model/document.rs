//! Curation document aggregate root.
//!
//! # Responsibility
//! - Own columns, tag dictionary and imports for one project.
//! - Validate structural invariants on construction, load and wire decode.
//! - Provide immutable-update helpers used by the workflow layer.
//!
//! # Invariants
//! - Columns match `variant.phases()` exactly, in order.
//! - Every stub id appears in exactly one column.
//! - Every `exclusion_tag` references a tag present in `tags`.

use crate::model::column::{Column, PhaseId, WorkflowVariant};
use crate::model::import::Import;
use crate::model::stub_study::{StubMetadataPatch, StubStudy, StubStudyId};
use crate::model::tag::{Tag, TagDictionary, TagId};
use crate::workflow::verb::VerbKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised by document construction and the curation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurationError {
    /// Verb is not legal for the phase under the active variant.
    IllegalTransition {
        variant: WorkflowVariant,
        phase: PhaseId,
        verb: VerbKind,
    },
    /// Phase index does not exist for the active variant.
    PhaseOutOfRange(usize),
    /// Study id is absent from the expected column (or from the document).
    StudyNotFound {
        study_id: StubStudyId,
        phase: Option<PhaseId>,
    },
    TagNotFound(TagId),
    TagNotAssignable(TagId),
    InvalidTagLabel(String),
    DuplicateStudyId(StubStudyId),
    InvalidDocument(String),
}

impl Display for CurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalTransition {
                variant,
                phase,
                verb,
            } => write!(
                f,
                "verb `{verb}` is not legal in phase `{phase}` of the {variant} workflow"
            ),
            Self::PhaseOutOfRange(index) => write!(f, "phase index out of range: {index}"),
            Self::StudyNotFound {
                study_id,
                phase: Some(phase),
            } => write!(f, "study `{study_id}` not found in phase `{phase}`"),
            Self::StudyNotFound {
                study_id,
                phase: None,
            } => write!(f, "study not found: `{study_id}`"),
            Self::TagNotFound(id) => write!(f, "tag not found: `{id}`"),
            Self::TagNotAssignable(id) => write!(f, "tag cannot be assigned manually: `{id}`"),
            Self::InvalidTagLabel(label) => write!(f, "invalid tag label: `{label}`"),
            Self::DuplicateStudyId(id) => write!(f, "study id already present: `{id}`"),
            Self::InvalidDocument(details) => write!(f, "invalid curation document: {details}"),
        }
    }
}

impl Error for CurationError {}

/// Whole curation state for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CurationDocumentWire")]
pub struct CurationDocument {
    pub(crate) variant: WorkflowVariant,
    pub(crate) columns: Vec<Column>,
    pub(crate) tags: TagDictionary,
    pub(crate) imports: Vec<Import>,
}

#[derive(Deserialize)]
struct CurationDocumentWire {
    variant: WorkflowVariant,
    columns: Vec<Column>,
    #[serde(default)]
    tags: TagDictionary,
    #[serde(default)]
    imports: Vec<Import>,
}

impl TryFrom<CurationDocumentWire> for CurationDocument {
    type Error = CurationError;

    fn try_from(value: CurationDocumentWire) -> Result<Self, Self::Error> {
        Self::from_parts(value.variant, value.columns, value.tags, value.imports)
    }
}

impl CurationDocument {
    /// Creates an empty document with the variant's columns and system tags.
    pub fn new(variant: WorkflowVariant) -> Self {
        Self {
            variant,
            columns: variant.phases().iter().copied().map(Column::new).collect(),
            tags: TagDictionary::with_system_tags(),
            imports: Vec::new(),
        }
    }

    /// Assembles a document from persisted parts and validates it.
    pub fn from_parts(
        variant: WorkflowVariant,
        columns: Vec<Column>,
        tags: TagDictionary,
        imports: Vec<Import>,
    ) -> Result<Self, CurationError> {
        let document = Self {
            variant,
            columns,
            tags,
            imports,
        };
        document.validate()?;
        Ok(document)
    }

    pub fn variant(&self) -> WorkflowVariant {
        self.variant
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn tags(&self) -> &TagDictionary {
        &self.tags
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Total stubs across all columns.
    pub fn study_count(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Returns `(column_index, position)` of a stub.
    pub fn locate(&self, study_id: &str) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(index, column)| column.position(study_id).map(|pos| (index, pos)))
    }

    pub fn stub(&self, study_id: &str) -> Option<&StubStudy> {
        self.locate(study_id)
            .map(|(column, position)| &self.columns[column].stub_studies[position])
    }

    /// Resolves a stub's exclusion tag against the dictionary.
    pub fn exclusion_tag_of(&self, stub: &StubStudy) -> Option<&Tag> {
        stub.exclusion_tag
            .as_deref()
            .and_then(|tag_id| self.tags.get(tag_id))
    }

    /// Checks every structural invariant of the aggregate.
    pub fn validate(&self) -> Result<(), CurationError> {
        let expected = self.variant.phases();
        let actual: Vec<PhaseId> = self.columns.iter().map(|column| column.phase).collect();
        if actual.as_slice() != expected {
            return Err(CurationError::InvalidDocument(format!(
                "columns {actual:?} do not match the {} workflow phases {expected:?}",
                self.variant
            )));
        }

        let mut seen = HashSet::new();
        for stub in self.columns.iter().flat_map(|column| &column.stub_studies) {
            if !seen.insert(stub.id.as_str()) {
                return Err(CurationError::DuplicateStudyId(stub.id.clone()));
            }
            if let Some(tag_id) = stub.exclusion_tag.as_deref() {
                if !self.tags.contains(tag_id) {
                    return Err(CurationError::TagNotFound(tag_id.to_string()));
                }
            }
        }

        let mut import_ids = HashSet::new();
        for import in &self.imports {
            if !import_ids.insert(import.id.as_str()) {
                return Err(CurationError::InvalidDocument(format!(
                    "duplicate import id `{}`",
                    import.id
                )));
            }
        }

        Ok(())
    }

    /// Appends one import batch to the first column.
    ///
    /// # Contract
    /// - The import record is added once; re-ingesting with the same import id
    ///   only appends the new stubs.
    /// - Every stub is stamped with `import.id`.
    /// - Fails without changes when any stub id already exists or an incoming
    ///   exclusion tag is unknown.
    pub fn ingest_import(
        &self,
        import: Import,
        stubs: Vec<StubStudy>,
    ) -> Result<Self, CurationError> {
        let mut next = self.clone();
        let mut incoming = HashSet::new();
        for stub in &stubs {
            if next.locate(&stub.id).is_some() || !incoming.insert(stub.id.clone()) {
                return Err(CurationError::DuplicateStudyId(stub.id.clone()));
            }
            if let Some(tag_id) = stub.exclusion_tag.as_deref() {
                if !next.tags.contains(tag_id) {
                    return Err(CurationError::TagNotFound(tag_id.to_string()));
                }
            }
        }

        if !next.imports.iter().any(|existing| existing.id == import.id) {
            next.imports.push(import.clone());
        }
        let first = next
            .columns
            .first_mut()
            .ok_or_else(|| CurationError::InvalidDocument("document has no columns".into()))?;
        first.stub_studies.extend(stubs.into_iter().map(|mut stub| {
            stub.import_id = import.id.clone();
            stub
        }));
        Ok(next)
    }

    /// Returns a copy with bibliographic fields of one stub patched.
    pub fn update_stub_metadata(
        &self,
        study_id: &str,
        patch: &StubMetadataPatch,
    ) -> Result<Self, CurationError> {
        let (column, position) =
            self.locate(study_id)
                .ok_or_else(|| CurationError::StudyNotFound {
                    study_id: study_id.to_string(),
                    phase: None,
                })?;
        let mut next = self.clone();
        next.columns[column].stub_studies[position].apply_patch(patch);
        Ok(next)
    }

    /// Returns a copy whose dictionary contains a tag labelled `label`.
    ///
    /// Idempotent by label: an existing tag is returned and the document is
    /// unchanged.
    pub fn create_tag(&self, label: &str) -> Result<(Self, Tag), CurationError> {
        let mut next = self.clone();
        let (tag, _) = next.tags.create_tag(label)?;
        Ok((next, tag))
    }
}
