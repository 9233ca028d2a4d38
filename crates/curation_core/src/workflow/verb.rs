//! Curation verbs.
//!
//! `Verb` is what a caller asks for (it may carry a tag choice); `VerbKind` is
//! the payload-free key used by legality tables and button labels.

use crate::model::tag::TagId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How an `Exclude` verb picks its tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSelector {
    /// Tag already present in the dictionary.
    Existing(TagId),
    /// Free-text label; resolved case-insensitively or created.
    Label(String),
}

/// Requested curation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Promote,
    Demote,
    Include,
    Uninclude,
    Duplicate,
    Irrelevant,
    OutOfScope,
    Exclude(TagSelector),
}

impl Verb {
    pub fn kind(&self) -> VerbKind {
        match self {
            Self::Promote => VerbKind::Promote,
            Self::Demote => VerbKind::Demote,
            Self::Include => VerbKind::Include,
            Self::Uninclude => VerbKind::Uninclude,
            Self::Duplicate => VerbKind::Duplicate,
            Self::Irrelevant => VerbKind::Irrelevant,
            Self::OutOfScope => VerbKind::OutOfScope,
            Self::Exclude(_) => VerbKind::Exclude,
        }
    }

    pub fn exclude_with_tag(tag_id: impl Into<TagId>) -> Self {
        Self::Exclude(TagSelector::Existing(tag_id.into()))
    }

    pub fn exclude_with_label(label: impl Into<String>) -> Self {
        Self::Exclude(TagSelector::Label(label.into()))
    }
}

/// Payload-free verb identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbKind {
    Promote,
    Demote,
    Include,
    Uninclude,
    Duplicate,
    Irrelevant,
    OutOfScope,
    Exclude,
}

impl VerbKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Promote => "promote",
            Self::Demote => "demote",
            Self::Include => "include",
            Self::Uninclude => "uninclude",
            Self::Duplicate => "duplicate",
            Self::Irrelevant => "irrelevant",
            Self::OutOfScope => "out_of_scope",
            Self::Exclude => "exclude",
        }
    }

    /// Button label shown for this verb.
    pub fn label(self) -> &'static str {
        match self {
            Self::Promote => "Promote",
            Self::Demote => "Demote",
            Self::Include => "Include",
            Self::Uninclude => "Remove from included",
            Self::Duplicate => "Duplicate",
            Self::Irrelevant => "Irrelevant",
            Self::OutOfScope => "Out of scope",
            Self::Exclude => "Exclude",
        }
    }

    /// Whether the verb moves stubs between columns.
    pub fn is_move(self) -> bool {
        matches!(
            self,
            Self::Promote | Self::Demote | Self::Include | Self::Uninclude
        )
    }
}

impl Display for VerbKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
