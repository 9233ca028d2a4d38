//! Tag dictionary model.
//!
//! # Responsibility
//! - Define exclusion/system tags attached to stub studies.
//! - Own the project-wide tag dictionary and label-idempotent tag creation.
//!
//! # Invariants
//! - Tag ids are unique within one dictionary.
//! - Tags are immutable once created; the dictionary only grows.
//! - Label lookup is case-insensitive and whitespace-normalized.

use crate::model::document::CurationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier of a tag inside the dictionary.
pub type TagId = String;

/// System tag id assigned by the duplicate verb.
pub const DUPLICATE_TAG_ID: &str = "duplicate";
/// System tag id assigned by the irrelevant verb.
pub const IRRELEVANT_TAG_ID: &str = "irrelevant";
/// System tag id assigned by the out-of-scope verb.
pub const OUT_OF_SCOPE_TAG_ID: &str = "out-of-scope";
/// Informational tag that does not exclude the study.
pub const NEEDS_REVIEW_TAG_ID: &str = "needs-review";

/// One exclusion reason or system marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub label: String,
    /// Whether a user may attach this tag manually.
    pub is_assignable: bool,
    /// Whether the tag removes a study from "uncategorized" counts.
    pub is_exclusion_tag: bool,
}

impl Tag {
    pub fn new(
        id: impl Into<TagId>,
        label: impl Into<String>,
        is_assignable: bool,
        is_exclusion_tag: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_assignable,
            is_exclusion_tag,
        }
    }

    /// Returns whether `label` names this tag under normalized comparison.
    pub fn matches_label(&self, label: &str) -> bool {
        normalize_label_key(&self.label) == normalize_label_key(label)
    }
}

/// Ordered, id-unique tag dictionary for one curation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tag>", into = "Vec<Tag>")]
pub struct TagDictionary {
    tags: Vec<Tag>,
}

impl Default for TagDictionary {
    fn default() -> Self {
        Self::with_system_tags()
    }
}

impl TagDictionary {
    /// Creates an empty dictionary.
    pub fn empty() -> Self {
        Self { tags: Vec::new() }
    }

    /// Creates a dictionary seeded with the built-in system tags.
    pub fn with_system_tags() -> Self {
        Self {
            tags: vec![
                Tag::new(DUPLICATE_TAG_ID, "Duplicate", true, true),
                Tag::new(IRRELEVANT_TAG_ID, "Irrelevant", true, true),
                Tag::new(OUT_OF_SCOPE_TAG_ID, "Out of scope", true, true),
                Tag::new(NEEDS_REVIEW_TAG_ID, "Needs review", true, false),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Finds a tag by label, ignoring case and whitespace differences.
    pub fn find_by_label(&self, label: &str) -> Option<&Tag> {
        let key = normalize_label_key(label);
        self.tags
            .iter()
            .find(|tag| normalize_label_key(&tag.label) == key)
    }

    /// Inserts a fully-formed tag.
    ///
    /// # Errors
    /// - `InvalidDocument` when the id is already present.
    pub fn insert(&mut self, tag: Tag) -> Result<(), CurationError> {
        if self.contains(&tag.id) {
            return Err(CurationError::InvalidDocument(format!(
                "duplicate tag id `{}`",
                tag.id
            )));
        }
        self.tags.push(tag);
        Ok(())
    }

    /// Returns the tag labelled `label`, creating it when absent.
    ///
    /// Returns `(tag, created)`. New tags are assignable exclusion tags with a
    /// generated id. An existing label is returned unchanged.
    ///
    /// # Errors
    /// - `InvalidTagLabel` when the label is blank after normalization.
    pub fn create_tag(&mut self, label: &str) -> Result<(Tag, bool), CurationError> {
        let display = normalize_label_display(label)
            .ok_or_else(|| CurationError::InvalidTagLabel(label.to_string()))?;
        if let Some(existing) = self.find_by_label(&display) {
            return Ok((existing.clone(), false));
        }

        let tag = Tag::new(Uuid::new_v4().to_string(), display, true, true);
        self.tags.push(tag.clone());
        Ok((tag, true))
    }
}

impl TryFrom<Vec<Tag>> for TagDictionary {
    type Error = CurationError;

    fn try_from(value: Vec<Tag>) -> Result<Self, Self::Error> {
        let mut dictionary = Self::empty();
        for tag in value {
            dictionary.insert(tag)?;
        }
        Ok(dictionary)
    }
}

impl From<TagDictionary> for Vec<Tag> {
    fn from(value: TagDictionary) -> Self {
        value.tags
    }
}

/// Collapses whitespace and trims; `None` for blank input.
fn normalize_label_display(label: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(label, " ");
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize_label_key(label: &str) -> String {
    normalize_label_display(label)
        .unwrap_or_default()
        .to_lowercase()
}
