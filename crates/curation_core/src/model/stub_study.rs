//! Stub study record.
//!
//! # Responsibility
//! - Define the lightweight citation record created per imported study.
//! - Provide presentation fallbacks for missing bibliographic fields.
//!
//! # Invariants
//! - `id` is stable and unique across the whole curation document.
//! - `exclusion_tag`, when set, references a tag in the document dictionary.
//! - Stubs are never deleted, only relocated between columns or tagged.

use crate::model::import::ImportId;
use crate::model::tag::TagId;
use serde::{Deserialize, Serialize};

/// Stable identifier of one stub study.
pub type StubStudyId = String;

const NO_NAME: &str = "No name";
const NO_DESCRIPTION: &str = "No description";

/// One imported citation awaiting curation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubStudy {
    pub id: StubStudyId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pmid: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    /// Import batch that introduced this stub.
    pub import_id: ImportId,
    /// Absence means uncategorized (or included in the terminal column).
    #[serde(default)]
    pub exclusion_tag: Option<TagId>,
}

impl StubStudy {
    /// Creates an untagged stub with empty bibliographic fields.
    pub fn new(id: impl Into<StubStudyId>, import_id: impl Into<ImportId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            authors: None,
            journal: None,
            year: None,
            abstract_text: None,
            doi: None,
            pmid: None,
            keywords: None,
            import_id: import_id.into(),
            exclusion_tag: None,
        }
    }

    /// Builder-style title setter used by import paths and fixtures.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn display_title(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or(NO_NAME)
    }

    pub fn display_abstract(&self) -> &str {
        non_blank(self.abstract_text.as_deref()).unwrap_or(NO_DESCRIPTION)
    }

    /// Applies a metadata patch in place.
    pub fn apply_patch(&mut self, patch: &StubMetadataPatch) {
        fn set<T: Clone>(slot: &mut Option<T>, change: &Option<Option<T>>) {
            if let Some(value) = change {
                *slot = value.clone();
            }
        }

        set(&mut self.title, &patch.title);
        set(&mut self.authors, &patch.authors);
        set(&mut self.journal, &patch.journal);
        set(&mut self.year, &patch.year);
        set(&mut self.abstract_text, &patch.abstract_text);
        set(&mut self.doi, &patch.doi);
        set(&mut self.pmid, &patch.pmid);
        set(&mut self.keywords, &patch.keywords);
    }
}

/// Partial bibliographic update.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubMetadataPatch {
    pub title: Option<Option<String>>,
    pub authors: Option<Option<String>>,
    pub journal: Option<Option<String>>,
    pub year: Option<Option<i32>>,
    pub abstract_text: Option<Option<String>>,
    pub doi: Option<Option<String>>,
    pub pmid: Option<Option<String>>,
    pub keywords: Option<Option<String>>,
}

impl StubMetadataPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{StubMetadataPatch, StubStudy};

    #[test]
    fn display_fallbacks_cover_missing_and_blank_fields() {
        let mut stub = StubStudy::new("s1", "imp-1");
        assert_eq!(stub.display_title(), "No name");
        assert_eq!(stub.display_abstract(), "No description");

        stub.title = Some("   ".to_string());
        assert_eq!(stub.display_title(), "No name");

        stub.title = Some("Working memory".to_string());
        assert_eq!(stub.display_title(), "Working memory");
    }

    #[test]
    fn patch_sets_clears_and_skips_fields() {
        let mut stub = StubStudy::new("s1", "imp-1").with_title("Old");
        stub.doi = Some("10.1/abc".to_string());

        let patch = StubMetadataPatch {
            title: Some(Some("New".to_string())),
            doi: Some(None),
            ..StubMetadataPatch::default()
        };
        stub.apply_patch(&patch);

        assert_eq!(stub.title.as_deref(), Some("New"));
        assert_eq!(stub.doi, None);
        assert_eq!(stub.journal, None);
        assert!(StubMetadataPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn abstract_uses_external_wire_name() {
        let mut stub = StubStudy::new("s1", "imp-1");
        stub.abstract_text = Some("text".to_string());
        let json = serde_json::to_value(&stub).unwrap();
        assert_eq!(json["abstract"], "text");
        assert_eq!(json["exclusion_tag"], serde_json::Value::Null);
    }
}
