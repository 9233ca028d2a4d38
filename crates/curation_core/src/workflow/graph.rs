//! Per-variant phase transition graph.
//!
//! # Responsibility
//! - Describe, for each workflow variant, which verbs are legal in each phase
//!   and what each one does.
//! - Serve both the state machine and button derivation from one table.
//!
//! # Invariants
//! - Move edges always target another phase of the same variant.
//! - Adding a variant means adding a graph, not patching conditionals.

use crate::model::column::{PhaseId, WorkflowVariant};
use crate::model::tag::{DUPLICATE_TAG_ID, IRRELEVANT_TAG_ID, OUT_OF_SCOPE_TAG_ID};
use crate::workflow::verb::VerbKind;

/// Effect of one legal verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Clear the tag and move to the column at this index.
    MoveTo(usize),
    /// Attach a fixed system tag; the stub stays in its column.
    AssignTag(&'static str),
    /// Attach the tag chosen by the caller; the stub stays in its column.
    AssignChosenTag,
}

/// One outgoing edge of a phase node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub verb: VerbKind,
    pub transition: Transition,
}

const fn edge(verb: VerbKind, transition: Transition) -> Edge {
    Edge { verb, transition }
}

/// One phase node and its ordered outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseNode {
    pub phase: PhaseId,
    pub edges: &'static [Edge],
}

/// Directed phase graph for one workflow variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowGraph {
    variant: WorkflowVariant,
    nodes: &'static [PhaseNode],
}

const PRISMA_NODES: &[PhaseNode] = &[
    PhaseNode {
        phase: PhaseId::Identification,
        edges: &[
            edge(VerbKind::Promote, Transition::MoveTo(1)),
            edge(VerbKind::Duplicate, Transition::AssignTag(DUPLICATE_TAG_ID)),
            edge(VerbKind::Exclude, Transition::AssignChosenTag),
        ],
    },
    PhaseNode {
        phase: PhaseId::Screening,
        edges: &[
            edge(VerbKind::Promote, Transition::MoveTo(2)),
            edge(VerbKind::Demote, Transition::MoveTo(0)),
            edge(VerbKind::Irrelevant, Transition::AssignTag(IRRELEVANT_TAG_ID)),
            edge(VerbKind::Exclude, Transition::AssignChosenTag),
        ],
    },
    PhaseNode {
        phase: PhaseId::Eligibility,
        edges: &[
            edge(VerbKind::Include, Transition::MoveTo(3)),
            edge(VerbKind::Demote, Transition::MoveTo(1)),
            edge(VerbKind::OutOfScope, Transition::AssignTag(OUT_OF_SCOPE_TAG_ID)),
            edge(VerbKind::Exclude, Transition::AssignChosenTag),
        ],
    },
    PhaseNode {
        phase: PhaseId::Included,
        edges: &[edge(VerbKind::Uninclude, Transition::MoveTo(2))],
    },
];

const SIMPLE_NODES: &[PhaseNode] = &[
    PhaseNode {
        phase: PhaseId::Unreviewed,
        edges: &[
            edge(VerbKind::Include, Transition::MoveTo(1)),
            edge(VerbKind::Exclude, Transition::AssignChosenTag),
        ],
    },
    PhaseNode {
        phase: PhaseId::Included,
        edges: &[edge(VerbKind::Uninclude, Transition::MoveTo(0))],
    },
];

impl WorkflowGraph {
    pub fn for_variant(variant: WorkflowVariant) -> Self {
        let nodes = match variant {
            WorkflowVariant::Prisma => PRISMA_NODES,
            WorkflowVariant::Simple => SIMPLE_NODES,
        };
        Self { variant, nodes }
    }

    pub fn variant(&self) -> WorkflowVariant {
        self.variant
    }

    pub fn phase_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, phase_index: usize) -> Option<&PhaseNode> {
        self.nodes.get(phase_index)
    }

    /// Legal verbs for a phase, in button order. Empty for unknown indexes.
    pub fn legal_verbs(&self, phase_index: usize) -> Vec<VerbKind> {
        self.node(phase_index)
            .map(|node| node.edges.iter().map(|edge| edge.verb).collect())
            .unwrap_or_default()
    }

    pub fn is_legal(&self, phase_index: usize, verb: VerbKind) -> bool {
        self.transition(phase_index, verb).is_some()
    }

    /// Looks up the effect of `verb` in `phase_index`.
    pub fn transition(&self, phase_index: usize, verb: VerbKind) -> Option<Transition> {
        self.node(phase_index)?
            .edges
            .iter()
            .find(|edge| edge.verb == verb)
            .map(|edge| edge.transition)
    }
}

#[cfg(test)]
mod tests {
    use super::{Transition, WorkflowGraph};
    use crate::model::column::WorkflowVariant;
    use crate::workflow::verb::VerbKind;

    #[test]
    fn graphs_match_variant_phase_lists() {
        for variant in [WorkflowVariant::Prisma, WorkflowVariant::Simple] {
            let graph = WorkflowGraph::for_variant(variant);
            let phases: Vec<_> = (0..graph.phase_count())
                .map(|index| graph.node(index).unwrap().phase)
                .collect();
            assert_eq!(phases, variant.phases());
        }
    }

    #[test]
    fn move_edges_stay_inside_the_graph_and_step_by_one() {
        for variant in [WorkflowVariant::Prisma, WorkflowVariant::Simple] {
            let graph = WorkflowGraph::for_variant(variant);
            for index in 0..graph.phase_count() {
                for edge in graph.node(index).unwrap().edges {
                    if let Transition::MoveTo(target) = edge.transition {
                        assert!(target < graph.phase_count());
                        assert_eq!(target.abs_diff(index), 1);
                    }
                }
            }
        }
    }

    #[test]
    fn prisma_legality_table() {
        let graph = WorkflowGraph::for_variant(WorkflowVariant::Prisma);
        assert_eq!(
            graph.legal_verbs(0),
            vec![VerbKind::Promote, VerbKind::Duplicate, VerbKind::Exclude]
        );
        assert!(!graph.is_legal(0, VerbKind::Demote));
        assert!(graph.is_legal(1, VerbKind::Irrelevant));
        assert_eq!(
            graph.transition(2, VerbKind::Include),
            Some(Transition::MoveTo(3))
        );
        assert!(!graph.is_legal(2, VerbKind::Promote));
        assert_eq!(graph.legal_verbs(3), vec![VerbKind::Uninclude]);
        assert!(graph.legal_verbs(4).is_empty());
    }

    #[test]
    fn simple_legality_table() {
        let graph = WorkflowGraph::for_variant(WorkflowVariant::Simple);
        assert_eq!(
            graph.legal_verbs(0),
            vec![VerbKind::Include, VerbKind::Exclude]
        );
        assert_eq!(
            graph.transition(1, VerbKind::Uninclude),
            Some(Transition::MoveTo(0))
        );
        assert!(!graph.is_legal(0, VerbKind::Promote));
    }
}
