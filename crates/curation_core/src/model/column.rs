//! Phase/column model.
//!
//! # Responsibility
//! - Name the workflow phases for each workflow variant.
//! - Hold the ordered stub membership of one phase.
//!
//! # Invariants
//! - Columns are created once per document from `WorkflowVariant::phases()`.
//! - Column order never changes; membership order is insertion order.

use crate::model::stub_study::StubStudy;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Well-known workflow phase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Identification,
    Screening,
    Eligibility,
    Included,
    Unreviewed,
}

impl PhaseId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identification => "identification",
            Self::Screening => "screening",
            Self::Eligibility => "eligibility",
            Self::Included => "included",
            Self::Unreviewed => "unreviewed",
        }
    }

    /// User-facing phase label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Identification => "Identification",
            Self::Screening => "Screening",
            Self::Eligibility => "Eligibility",
            Self::Included => "Included",
            Self::Unreviewed => "Unreviewed",
        }
    }

    /// Untagged stubs in this phase count as included rather than uncategorized.
    pub fn is_inclusion_phase(self) -> bool {
        matches!(self, Self::Included)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "identification" => Some(Self::Identification),
            "screening" => Some(Self::Screening),
            "eligibility" => Some(Self::Eligibility),
            "included" => Some(Self::Included),
            "unreviewed" => Some(Self::Unreviewed),
            _ => None,
        }
    }
}

impl Display for PhaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow shape selected per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowVariant {
    /// Identification -> Screening -> Eligibility -> Included.
    Prisma,
    /// Unreviewed -> Included.
    Simple,
}

const PRISMA_PHASES: &[PhaseId] = &[
    PhaseId::Identification,
    PhaseId::Screening,
    PhaseId::Eligibility,
    PhaseId::Included,
];
const SIMPLE_PHASES: &[PhaseId] = &[PhaseId::Unreviewed, PhaseId::Included];

impl WorkflowVariant {
    /// Ordered phases for this variant.
    pub fn phases(self) -> &'static [PhaseId] {
        match self {
            Self::Prisma => PRISMA_PHASES,
            Self::Simple => SIMPLE_PHASES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prisma => "prisma",
            Self::Simple => "simple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prisma" => Some(Self::Prisma),
            "simple" => Some(Self::Simple),
            _ => None,
        }
    }
}

impl Display for WorkflowVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One workflow phase and the stubs currently in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub phase: PhaseId,
    #[serde(default)]
    pub stub_studies: Vec<StubStudy>,
}

impl Column {
    pub fn new(phase: PhaseId) -> Self {
        Self {
            phase,
            stub_studies: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.stub_studies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stub_studies.is_empty()
    }

    pub fn position(&self, study_id: &str) -> Option<usize> {
        self.stub_studies.iter().position(|stub| stub.id == study_id)
    }

    pub fn get(&self, study_id: &str) -> Option<&StubStudy> {
        self.stub_studies.iter().find(|stub| stub.id == study_id)
    }

    pub fn contains(&self, study_id: &str) -> bool {
        self.position(study_id).is_some()
    }

    pub fn study_ids(&self) -> impl Iterator<Item = &str> {
        self.stub_studies.iter().map(|stub| stub.id.as_str())
    }
}
