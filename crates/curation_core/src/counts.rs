//! Derived curation counters.
//!
//! # Responsibility
//! - Compute per-phase totals, exclusion and inclusion counts.
//! - Group excluded studies by tag for the exclusions browser.
//! - Build the duplicate detection summary message.
//!
//! # Invariants
//! - Pure functions of the document; recomputed after every mutation.
//! - `uncategorized = total - excluded - included` for every phase.

use crate::model::column::PhaseId;
use crate::model::document::CurationDocument;
use crate::model::stub_study::StubStudyId;
use crate::model::tag::{TagId, DUPLICATE_TAG_ID};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Counters for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCounts {
    pub phase: PhaseId,
    pub total: usize,
    pub excluded: usize,
    pub included: usize,
    pub uncategorized: usize,
    /// True when nothing in this phase awaits a decision.
    pub no_more_to_review: bool,
}

/// Excluded studies sharing one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionGroup {
    pub tag_id: TagId,
    pub label: String,
    pub study_ids: Vec<StubStudyId>,
}

/// Full derived view of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurationCounts {
    pub phases: Vec<PhaseCounts>,
    /// Groups in dictionary order; tags with no excluded studies are omitted.
    pub exclusions: Vec<ExclusionGroup>,
}

impl CurationCounts {
    pub fn phase(&self, index: usize) -> Option<&PhaseCounts> {
        self.phases.get(index)
    }

    pub fn total_excluded(&self) -> usize {
        self.phases.iter().map(|phase| phase.excluded).sum()
    }
}

/// Computes every counter for `document`.
pub fn compute_counts(document: &CurationDocument) -> CurationCounts {
    let phases = document
        .columns()
        .iter()
        .map(|column| {
            let total = column.len();
            let excluded = column
                .stub_studies
                .iter()
                .filter(|stub| {
                    document
                        .exclusion_tag_of(stub)
                        .is_some_and(|tag| tag.is_exclusion_tag)
                })
                .count();
            let included = if column.phase.is_inclusion_phase() {
                total - excluded
            } else {
                0
            };
            let uncategorized = total - excluded - included;
            PhaseCounts {
                phase: column.phase,
                total,
                excluded,
                included,
                uncategorized,
                no_more_to_review: uncategorized == 0,
            }
        })
        .collect();

    CurationCounts {
        phases,
        exclusions: exclusion_breakdown(document),
    }
}

/// Groups excluded studies (all columns) by their exclusion tag.
pub fn exclusion_breakdown(document: &CurationDocument) -> Vec<ExclusionGroup> {
    let mut by_tag: BTreeMap<&str, Vec<StubStudyId>> = BTreeMap::new();
    for stub in document
        .columns()
        .iter()
        .flat_map(|column| &column.stub_studies)
    {
        if let Some(tag) = document.exclusion_tag_of(stub) {
            if tag.is_exclusion_tag {
                by_tag.entry(tag.id.as_str()).or_default().push(stub.id.clone());
            }
        }
    }

    document
        .tags()
        .iter()
        .filter_map(|tag| {
            by_tag.remove(tag.id.as_str()).map(|study_ids| ExclusionGroup {
                tag_id: tag.id.clone(),
                label: tag.label.clone(),
                study_ids,
            })
        })
        .collect()
}

/// Number of first-column studies tagged as duplicates.
pub fn duplicate_count(document: &CurationDocument) -> usize {
    document.column(0).map_or(0, |column| {
        column
            .stub_studies
            .iter()
            .filter(|stub| stub.exclusion_tag.as_deref() == Some(DUPLICATE_TAG_ID))
            .count()
    })
}

/// Number of distinct imports referenced by any study.
pub fn referenced_import_count(document: &CurationDocument) -> usize {
    document
        .columns()
        .iter()
        .flat_map(|column| &column.stub_studies)
        .map(|stub| stub.import_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Builds the duplicate detection summary shown above the first phase.
pub fn duplicate_summary(document: &CurationDocument) -> String {
    let duplicates = duplicate_count(document);
    let imports = referenced_import_count(document);
    let imports_text = plural(imports, "import", "imports");
    if duplicates == 0 {
        format!("No duplicates identified across your {imports} {imports_text}")
    } else {
        format!(
            "We automatically identified {duplicates} duplicate {} across your {imports} {imports_text}",
            plural(duplicates, "study", "studies")
        )
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_counts, duplicate_summary};
    use crate::model::column::WorkflowVariant;
    use crate::model::document::CurationDocument;
    use crate::model::import::Import;
    use crate::model::stub_study::StubStudy;
    use crate::workflow::machine::apply_verb;
    use crate::workflow::verb::Verb;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn document() -> CurationDocument {
        CurationDocument::new(WorkflowVariant::Prisma)
            .ingest_import(
                Import::new("imp-1", "pubmed"),
                vec![StubStudy::new("s1", ""), StubStudy::new("s2", "")],
            )
            .unwrap()
            .ingest_import(
                Import::new("imp-2", "scopus"),
                vec![StubStudy::new("s3", ""), StubStudy::new("s4", "")],
            )
            .unwrap()
    }

    #[test]
    fn needs_review_tag_does_not_exclude() {
        let tagged = apply_verb(
            &document(),
            &ids(&["s1"]),
            0,
            &Verb::exclude_with_tag("needs-review"),
        )
        .unwrap();
        let counts = compute_counts(&tagged);
        assert_eq!(counts.phases[0].excluded, 0);
        assert_eq!(counts.phases[0].uncategorized, 4);
        assert!(counts.exclusions.is_empty());
    }

    #[test]
    fn included_column_counts_untagged_as_included() {
        let mut current = document();
        for (phase, verb) in [(0, Verb::Promote), (1, Verb::Promote), (2, Verb::Include)] {
            current = apply_verb(&current, &ids(&["s1", "s2"]), phase, &verb).unwrap();
        }
        let counts = compute_counts(&current);
        let included = counts.phase(3).unwrap();
        assert_eq!(included.total, 2);
        assert_eq!(included.included, 2);
        assert_eq!(included.uncategorized, 0);
        assert!(included.no_more_to_review);
        assert!(counts.phase(1).unwrap().no_more_to_review);
        assert!(!counts.phase(0).unwrap().no_more_to_review);
    }

    #[test]
    fn exclusion_breakdown_follows_dictionary_order() {
        let doc = document();
        let doc = apply_verb(&doc, &ids(&["s4"]), 0, &Verb::exclude_with_label("Animal study"))
            .unwrap();
        let doc = apply_verb(&doc, &ids(&["s2", "s3"]), 0, &Verb::Duplicate).unwrap();
        let counts = compute_counts(&doc);

        let labels: Vec<&str> = counts.exclusions.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Duplicate", "Animal study"]);
        assert_eq!(counts.exclusions[0].study_ids, ids(&["s2", "s3"]));
        assert_eq!(counts.total_excluded(), 3);
    }

    #[test]
    fn duplicate_summary_messages() {
        let doc = document();
        assert_eq!(
            duplicate_summary(&doc),
            "No duplicates identified across your 2 imports"
        );

        let one = apply_verb(&doc, &ids(&["s2"]), 0, &Verb::Duplicate).unwrap();
        assert_eq!(
            duplicate_summary(&one),
            "We automatically identified 1 duplicate study across your 2 imports"
        );

        let two = apply_verb(&one, &ids(&["s3"]), 0, &Verb::Duplicate).unwrap();
        assert_eq!(
            duplicate_summary(&two),
            "We automatically identified 2 duplicate studies across your 2 imports"
        );
    }

    #[test]
    fn duplicate_summary_for_empty_document() {
        let doc = CurationDocument::new(WorkflowVariant::Simple);
        assert_eq!(
            duplicate_summary(&doc),
            "No duplicates identified across your 0 imports"
        );
    }
}
