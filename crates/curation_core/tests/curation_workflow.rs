use curation_core::{
    apply_verb, apply_verb_detailed, compute_counts, remove_exclusion_tag, CurationDocument,
    CurationError, CurationView, Import, StubStudy, Verb, WorkflowGraph, WorkflowVariant,
    DUPLICATE_TAG_ID,
};
use std::collections::HashSet;

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn document_with(variant: WorkflowVariant, studies: &[&str]) -> CurationDocument {
    CurationDocument::new(variant)
        .ingest_import(
            Import::new("imp-1", "pubmed: working memory"),
            studies
                .iter()
                .map(|id| StubStudy::new(*id, "").with_title(format!("Study {id}")))
                .collect(),
        )
        .unwrap()
}

fn assert_invariants(document: &CurationDocument, expected_ids: &HashSet<String>) {
    let mut seen = HashSet::new();
    for column in document.columns() {
        for stub in &column.stub_studies {
            assert!(seen.insert(stub.id.clone()), "{} appears twice", stub.id);
            if let Some(tag_id) = stub.exclusion_tag.as_deref() {
                assert!(document.tags().contains(tag_id), "dangling tag {tag_id}");
            }
        }
    }
    assert_eq!(&seen, expected_ids);

    for phase in compute_counts(document).phases {
        assert_eq!(
            phase.total,
            phase.excluded + phase.included + phase.uncategorized
        );
    }
    document.validate().unwrap();
}

#[test]
fn scenario_a_promote_one_study() {
    let document = document_with(WorkflowVariant::Prisma, &["S1", "S2", "S3", "S4"]);
    let mut view = CurationView::new();
    view.select_phase(&document, 0).unwrap();

    let next = apply_verb(&document, &ids(&["S1"]), 0, &Verb::Promote).unwrap();

    assert_eq!(next.locate("S1").map(|(column, _)| column), Some(1));
    assert_eq!(next.column(0).unwrap().len(), 3);
    assert_eq!(next.column(1).unwrap().len(), 1);
}

#[test]
fn scenario_b_duplicate_tag_counts() {
    let document = document_with(WorkflowVariant::Prisma, &["S1", "S2", "S3", "S4"]);
    let promoted = apply_verb(&document, &ids(&["S1"]), 0, &Verb::Promote).unwrap();
    let tagged = apply_verb(&promoted, &ids(&["S2"]), 0, &Verb::Duplicate).unwrap();

    let counts = compute_counts(&tagged);
    let first = counts.phase(0).unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.uncategorized, 2);
    assert_eq!(first.excluded, 1);
    assert_eq!(tagged.locate("S2").map(|(column, _)| column), Some(0));
}

#[test]
fn scenario_c_phase_change_clears_selection() {
    let document = document_with(WorkflowVariant::Prisma, &["S5"]);
    let mut view = CurationView::new();
    view.toggle_select(&document, "S5").unwrap();
    assert!(view.action_bar(&document).enabled);

    view.select_phase(&document, 1).unwrap();

    assert!(view.selected_ids().is_empty());
    let bar = view.action_bar(&document);
    assert!(!bar.enabled);
    assert_eq!(bar.target_count, 0);
}

#[test]
fn scenario_d_tag_creation_is_case_insensitive() {
    let document = CurationDocument::new(WorkflowVariant::Prisma);
    let (with_tag, existing) = document.create_tag("Pilot Study").unwrap();
    let size = with_tag.tags().len();

    let (after, tag) = with_tag.create_tag("pilot study").unwrap();
    assert_eq!(tag, existing);
    assert_eq!(after.tags().len(), size);
    assert_eq!(after, with_tag);
}

#[test]
fn scenario_e_simple_include_and_uninclude() {
    let document = document_with(WorkflowVariant::Simple, &["S1"]);
    let tagged = apply_verb(&document, &ids(&["S1"]), 0, &Verb::exclude_with_label("Review"))
        .unwrap();

    let included = apply_verb(&tagged, &ids(&["S1"]), 0, &Verb::Include).unwrap();
    assert_eq!(included.locate("S1"), Some((1, 0)));
    assert_eq!(compute_counts(&included).phase(1).unwrap().included, 1);

    let back = apply_verb(&included, &ids(&["S1"]), 1, &Verb::Uninclude).unwrap();
    assert_eq!(back.locate("S1"), Some((0, 0)));
    assert_eq!(back.stub("S1").unwrap().exclusion_tag, None);
}

#[test]
fn promote_then_demote_returns_without_restoring_tag() {
    let document = document_with(WorkflowVariant::Prisma, &["S1", "S2"]);
    let promoted = apply_verb(&document, &ids(&["S1"]), 0, &Verb::Promote).unwrap();
    let tagged = apply_verb(&promoted, &ids(&["S1"]), 1, &Verb::Irrelevant).unwrap();
    let demoted = apply_verb(&tagged, &ids(&["S1"]), 1, &Verb::Demote).unwrap();

    assert_eq!(demoted.locate("S1").map(|(column, _)| column), Some(0));
    assert_eq!(demoted.stub("S1").unwrap().exclusion_tag, None);
}

#[test]
fn boundary_transitions_fail() {
    let document = document_with(WorkflowVariant::Prisma, &["S1"]);
    let err = apply_verb(&document, &ids(&["S1"]), 0, &Verb::Demote).unwrap_err();
    assert!(matches!(err, CurationError::IllegalTransition { .. }));

    let mut at_end = document.clone();
    for (phase, verb) in [(0, Verb::Promote), (1, Verb::Promote), (2, Verb::Include)] {
        at_end = apply_verb(&at_end, &ids(&["S1"]), phase, &verb).unwrap();
    }
    for verb in [Verb::Promote, Verb::Include] {
        let err = apply_verb(&at_end, &ids(&["S1"]), 3, &verb).unwrap_err();
        assert!(matches!(err, CurationError::IllegalTransition { .. }));
    }

    let simple = document_with(WorkflowVariant::Simple, &["S1"]);
    let err = apply_verb(&simple, &ids(&["S1"]), 0, &Verb::Uninclude).unwrap_err();
    assert!(matches!(err, CurationError::IllegalTransition { .. }));
}

#[test]
fn empty_selection_is_a_noop() {
    let document = document_with(WorkflowVariant::Prisma, &["S1"]);
    assert_eq!(apply_verb(&document, &[], 0, &Verb::Promote).unwrap(), document);
    assert_eq!(remove_exclusion_tag(&document, &[]).unwrap(), document);
}

#[test]
fn remove_exclusion_tag_on_untagged_study_is_identity() {
    let document = document_with(WorkflowVariant::Prisma, &["S1"]);
    assert_eq!(remove_exclusion_tag(&document, &ids(&["S1"])).unwrap(), document);
}

#[test]
fn system_tag_verbs_seed_missing_built_in_tags() {
    let mut value = serde_json::to_value(document_with(WorkflowVariant::Prisma, &["S1", "S2"]))
        .unwrap();
    value["tags"] = serde_json::json!([]);
    let document: CurationDocument = serde_json::from_value(value).unwrap();
    assert!(document.tags().is_empty());

    let applied = apply_verb_detailed(&document, &ids(&["S1"]), 0, &Verb::Duplicate).unwrap();
    assert!(applied.tag_created);
    let tag = applied.document.tags().get(DUPLICATE_TAG_ID).unwrap();
    assert_eq!(tag.label, "Duplicate");
    assert!(tag.is_exclusion_tag);
    assert_eq!(applied.document.tags().len(), 1);
    assert_eq!(
        applied.document.stub("S1").unwrap().exclusion_tag.as_deref(),
        Some(DUPLICATE_TAG_ID)
    );
    applied.document.validate().unwrap();

    let again = apply_verb_detailed(&applied.document, &ids(&["S2"]), 0, &Verb::Duplicate).unwrap();
    assert!(!again.tag_created);
    assert_eq!(again.document.tags().len(), 1);
    assert_eq!(compute_counts(&again.document).phase(0).unwrap().excluded, 2);
}

/// Drives a long deterministic sequence of legal and illegal actions and checks
/// the document invariants after every step.
#[test]
fn invariants_hold_across_scripted_sequences() {
    let study_ids: Vec<String> = (0..12).map(|index| format!("S{index}")).collect();
    let expected: HashSet<String> = study_ids.iter().cloned().collect();

    for variant in [WorkflowVariant::Prisma, WorkflowVariant::Simple] {
        let refs: Vec<&str> = study_ids.iter().map(String::as_str).collect();
        let mut document = document_with(variant, &refs);
        let graph = WorkflowGraph::for_variant(variant);
        let verbs = [
            Verb::Promote,
            Verb::Demote,
            Verb::Include,
            Verb::Uninclude,
            Verb::Duplicate,
            Verb::Irrelevant,
            Verb::OutOfScope,
            Verb::exclude_with_label("Animal study"),
            Verb::exclude_with_tag("needs-review"),
        ];

        let mut seed: u64 = 0x5eed;
        for _ in 0..400 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let phase = (seed >> 33) as usize % graph.phase_count();
            let verb = &verbs[(seed >> 17) as usize % verbs.len()];
            let column = document.column(phase).unwrap();
            let picked: Vec<String> = column
                .study_ids()
                .enumerate()
                .filter(|(index, _)| (seed >> (index % 32)) & 1 == 1)
                .map(|(_, id)| id.to_string())
                .collect();

            match apply_verb(&document, &picked, phase, verb) {
                Ok(next) => {
                    if !picked.is_empty() && verb.kind().is_move() {
                        for id in &picked {
                            assert_ne!(next.locate(id).unwrap().0, phase);
                            assert_eq!(next.stub(id).unwrap().exclusion_tag, None);
                        }
                    }
                    document = next;
                }
                Err(CurationError::IllegalTransition { .. }) => {
                    assert!(!graph.is_legal(phase, verb.kind()));
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
            assert_invariants(&document, &expected);
        }
    }
}
