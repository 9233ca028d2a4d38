//! Curation state machine.
//!
//! # Responsibility
//! - Validate a verb against the phase graph of the document's variant.
//! - Compute the next document snapshot for a selection of stubs.
//!
//! # Invariants
//! - Input documents are never mutated; every call returns a new snapshot.
//! - A failed call leaves no partial effect (validation precedes mutation).
//! - Moves clear the exclusion tag; tag verbs never move stubs.
//! - A study is relocated by removal from its source column and append to the
//!   destination, keeping exclusivity intact.

use crate::model::column::PhaseId;
use crate::model::document::{CurationDocument, CurationError};
use crate::model::stub_study::StubStudyId;
use crate::model::tag::{Tag, TagDictionary};
use crate::workflow::graph::{Transition, WorkflowGraph};
use crate::workflow::verb::{TagSelector, Verb};
use std::collections::HashSet;

/// Result of one successful verb application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Next document snapshot.
    pub document: CurationDocument,
    /// Studies touched, in application order.
    pub affected: Vec<StubStudyId>,
    /// Destination phase for move verbs.
    pub destination: Option<PhaseId>,
    /// Tag attached by tag verbs.
    pub tag: Option<Tag>,
    /// Whether the tag was created by this call.
    pub tag_created: bool,
}

/// Applies `verb` to `selected` studies sitting in column `phase_index`.
///
/// # Errors
/// - `PhaseOutOfRange` for an index outside the document's variant.
/// - `IllegalTransition` when the verb has no edge in that phase.
/// - `StudyNotFound` when a selected id is not in that phase's column.
/// - `TagNotFound` / `TagNotAssignable` / `InvalidTagLabel` for bad tag choices.
pub fn apply_verb(
    document: &CurationDocument,
    selected: &[StubStudyId],
    phase_index: usize,
    verb: &Verb,
) -> Result<CurationDocument, CurationError> {
    apply_verb_detailed(document, selected, phase_index, verb).map(|applied| applied.document)
}

/// Same as [`apply_verb`] but also reports what changed.
pub fn apply_verb_detailed(
    document: &CurationDocument,
    selected: &[StubStudyId],
    phase_index: usize,
    verb: &Verb,
) -> Result<Applied, CurationError> {
    let graph = WorkflowGraph::for_variant(document.variant());
    let node = graph
        .node(phase_index)
        .ok_or(CurationError::PhaseOutOfRange(phase_index))?;
    let transition =
        graph
            .transition(phase_index, verb.kind())
            .ok_or(CurationError::IllegalTransition {
                variant: document.variant(),
                phase: node.phase,
                verb: verb.kind(),
            })?;

    let ids = dedupe_in_order(selected);
    if ids.is_empty() {
        return Ok(Applied {
            document: document.clone(),
            affected: Vec::new(),
            destination: None,
            tag: None,
            tag_created: false,
        });
    }

    let source = &document.columns[phase_index];
    if let Some(missing) = ids.iter().find(|id| !source.contains(id)) {
        return Err(CurationError::StudyNotFound {
            study_id: missing.clone(),
            phase: Some(node.phase),
        });
    }

    let mut next = document.clone();
    match transition {
        Transition::MoveTo(target) => {
            for id in &ids {
                let position = next.columns[phase_index]
                    .position(id)
                    .ok_or_else(|| CurationError::StudyNotFound {
                        study_id: id.clone(),
                        phase: Some(node.phase),
                    })?;
                let mut stub = next.columns[phase_index].stub_studies.remove(position);
                stub.exclusion_tag = None;
                next.columns[target].stub_studies.push(stub);
            }
            Ok(Applied {
                document: next,
                affected: ids,
                destination: Some(next_phase(document, target)),
                tag: None,
                tag_created: false,
            })
        }
        Transition::AssignTag(tag_id) => {
            let (tag, tag_created) = resolve_system_tag(&mut next, tag_id)?;
            tag_studies(&mut next, phase_index, &ids, &tag);
            Ok(Applied {
                document: next,
                affected: ids,
                destination: None,
                tag: Some(tag),
                tag_created,
            })
        }
        Transition::AssignChosenTag => {
            let selector = match verb {
                Verb::Exclude(selector) => selector,
                // Only `Exclude` maps to a chosen-tag edge.
                other => {
                    return Err(CurationError::IllegalTransition {
                        variant: document.variant(),
                        phase: node.phase,
                        verb: other.kind(),
                    })
                }
            };
            let (tag, created) = resolve_tag(&mut next, selector)?;
            tag_studies(&mut next, phase_index, &ids, &tag);
            Ok(Applied {
                document: next,
                affected: ids,
                destination: None,
                tag: Some(tag),
                tag_created: created,
            })
        }
    }
}

/// Clears the exclusion tag of each study, wherever it sits.
///
/// Already-untagged studies are left as they are, so repeating the call yields
/// an identical document.
pub fn remove_exclusion_tag(
    document: &CurationDocument,
    study_ids: &[StubStudyId],
) -> Result<CurationDocument, CurationError> {
    let ids = dedupe_in_order(study_ids);
    let mut locations = Vec::with_capacity(ids.len());
    for id in &ids {
        let location = document
            .locate(id)
            .ok_or_else(|| CurationError::StudyNotFound {
                study_id: id.clone(),
                phase: None,
            })?;
        locations.push(location);
    }

    let mut next = document.clone();
    for (column, position) in locations {
        next.columns[column].stub_studies[position].exclusion_tag = None;
    }
    Ok(next)
}

/// Looks up a built-in tag, seeding it from the system set when the
/// dictionary lacks it.
fn resolve_system_tag(
    document: &mut CurationDocument,
    tag_id: &str,
) -> Result<(Tag, bool), CurationError> {
    if let Some(tag) = document.tags.get(tag_id) {
        return Ok((tag.clone(), false));
    }
    let tag = TagDictionary::with_system_tags()
        .get(tag_id)
        .cloned()
        .ok_or_else(|| CurationError::TagNotFound(tag_id.to_string()))?;
    document.tags.insert(tag.clone())?;
    Ok((tag, true))
}

fn resolve_tag(
    document: &mut CurationDocument,
    selector: &TagSelector,
) -> Result<(Tag, bool), CurationError> {
    let (tag, created) = match selector {
        TagSelector::Existing(tag_id) => {
            let tag = document
                .tags
                .get(tag_id)
                .cloned()
                .ok_or_else(|| CurationError::TagNotFound(tag_id.clone()))?;
            (tag, false)
        }
        TagSelector::Label(label) => document.tags.create_tag(label)?,
    };
    if !tag.is_assignable {
        return Err(CurationError::TagNotAssignable(tag.id));
    }
    Ok((tag, created))
}

fn tag_studies(document: &mut CurationDocument, phase_index: usize, ids: &[StubStudyId], tag: &Tag) {
    let column = &mut document.columns[phase_index];
    for stub in column
        .stub_studies
        .iter_mut()
        .filter(|stub| ids.contains(&stub.id))
    {
        stub.exclusion_tag = Some(tag.id.clone());
    }
}

fn next_phase(document: &CurationDocument, index: usize) -> PhaseId {
    document.columns[index].phase
}

fn dedupe_in_order(ids: &[StubStudyId]) -> Vec<StubStudyId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}
