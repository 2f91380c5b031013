//! AI move selection.
//!
//! A strategy first turns the graph into a [`MovePlan`]: either "start a root
//! period" or a weighted set of options, each a node kind plus the parents it
//! may hang under. [`MovePlan::choose`] then rolls the injected RNG to pick
//! one option and one parent. Keeping the two steps apart means the candidate
//! set can be inspected without rolling dice.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sw_core::{EdgeKind, Graph, NodeId, NodeKind, PeerDirection};

use crate::history::LogEntry;
use crate::player::Strategy;

/// A structural move: what to create and where.
///
/// A period with a parent is a peer of that period; a period without one is
/// a new root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMove {
    /// Kind of node to create.
    pub kind: NodeKind,
    /// Period to sit beside, or container to hang under.
    pub parent: Option<NodeId>,
}

impl AiMove {
    /// A new root period.
    pub fn root() -> Self {
        Self {
            kind: NodeKind::Period,
            parent: None,
        }
    }
}

/// One weighted choice inside a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOption {
    /// Relative weight.
    pub weight: f64,
    /// Kind of node to create.
    pub kind: NodeKind,
    /// Candidate parents, chosen between uniformly. Never empty.
    pub parents: Vec<NodeId>,
}

/// The candidate moves a strategy allows for the current graph.
#[derive(Debug, Clone, PartialEq)]
pub enum MovePlan {
    /// Start the timeline with a root period.
    Root,
    /// Pick one option by weight, then one of its parents.
    Choose(Vec<MoveOption>),
}

impl MovePlan {
    /// A single option with weight 1. Falls back to a root period if
    /// `parents` is empty.
    fn attach(kind: NodeKind, parents: Vec<NodeId>) -> Self {
        Self::weighted(vec![(1.0, kind, parents)])
    }

    /// Options with no parents are dropped.
    fn weighted(options: Vec<(f64, NodeKind, Vec<NodeId>)>) -> Self {
        let options: Vec<MoveOption> = options
            .into_iter()
            .filter(|(weight, _, parents)| *weight > 0.0 && !parents.is_empty())
            .map(|(weight, kind, parents)| MoveOption {
                weight,
                kind,
                parents,
            })
            .collect();
        if options.is_empty() {
            Self::Root
        } else {
            Self::Choose(options)
        }
    }

    /// Whether `mv` is one of this plan's candidates.
    pub fn allows(&self, mv: &AiMove) -> bool {
        match self {
            Self::Root => *mv == AiMove::root(),
            Self::Choose(options) => options.iter().any(|o| {
                o.kind == mv.kind && mv.parent.as_ref().is_some_and(|p| o.parents.contains(p))
            }),
        }
    }

    /// Roll for a concrete move.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> AiMove {
        let Self::Choose(options) = self else {
            return AiMove::root();
        };
        let total: f64 = options.iter().map(|o| o.weight).sum();
        let mut roll = rng.random::<f64>() * total;
        let mut picked = options.last();
        for option in options {
            if roll < option.weight {
                picked = Some(option);
                break;
            }
            roll -= option.weight;
        }
        match picked {
            Some(option) if !option.parents.is_empty() => AiMove {
                kind: option.kind,
                parent: Some(option.parents[rng.random_range(0..option.parents.len())].clone()),
            },
            _ => AiMove::root(),
        }
    }
}

/// Build the candidate set `strategy` allows for this graph and history.
pub fn plan_move(graph: &Graph, history: &[LogEntry], strategy: Strategy) -> MovePlan {
    match strategy {
        Strategy::Balanced => balanced(graph),
        Strategy::Builder => builder(graph),
        Strategy::Detailer => detailer(graph),
        Strategy::Focuser => focuser(graph, history),
    }
}

/// Plan and roll in one step.
pub fn determine_move<R: Rng + ?Sized>(
    graph: &Graph,
    history: &[LogEntry],
    strategy: Strategy,
    rng: &mut R,
) -> AiMove {
    plan_move(graph, history, strategy).choose(rng)
}

fn ids_of_kind(graph: &Graph, kind: NodeKind) -> Vec<NodeId> {
    graph.nodes_of_kind(kind).map(|n| n.id.clone()).collect()
}

/// Periods that still have a free side for a new peer.
fn open_periods(graph: &Graph) -> Vec<NodeId> {
    graph
        .nodes_of_kind(NodeKind::Period)
        .filter(|p| {
            graph.peer_edge(&p.id, PeerDirection::Right).is_none()
                || graph.peer_edge(&p.id, PeerDirection::Left).is_none()
        })
        .map(|p| p.id.clone())
        .collect()
}

fn has_child_of_kind(graph: &Graph, parent: &NodeId, kind: NodeKind) -> bool {
    graph
        .edges_from(parent)
        .filter(|e| matches!(e.kind, EdgeKind::Child { .. }))
        .any(|e| graph.node(&e.target).is_some_and(|n| n.kind == kind))
}

fn balanced(graph: &Graph) -> MovePlan {
    let periods = ids_of_kind(graph, NodeKind::Period);
    if periods.is_empty() {
        return MovePlan::Root;
    }

    let bare_periods: Vec<NodeId> = periods
        .iter()
        .filter(|p| !has_child_of_kind(graph, p, NodeKind::Event))
        .cloned()
        .collect();
    if !bare_periods.is_empty() {
        return MovePlan::attach(NodeKind::Event, bare_periods);
    }

    let events = ids_of_kind(graph, NodeKind::Event);
    let bare_events: Vec<NodeId> = events
        .iter()
        .filter(|e| !has_child_of_kind(graph, e, NodeKind::Scene))
        .cloned()
        .collect();
    if !bare_events.is_empty() {
        return MovePlan::attach(NodeKind::Scene, bare_events);
    }

    // Thirds: a peer period, a scene (only with events), otherwise an event.
    let scene_weight = if events.is_empty() { 0.0 } else { 0.33 };
    MovePlan::weighted(vec![
        (0.33, NodeKind::Period, open_periods(graph)),
        (scene_weight, NodeKind::Scene, events),
        (1.0 - 0.33 - scene_weight, NodeKind::Event, periods),
    ])
}

fn builder(graph: &Graph) -> MovePlan {
    let periods = ids_of_kind(graph, NodeKind::Period);
    if periods.is_empty() {
        return MovePlan::Root;
    }
    MovePlan::weighted(vec![
        (0.5, NodeKind::Period, open_periods(graph)),
        (0.5, NodeKind::Event, periods),
    ])
}

fn detailer(graph: &Graph) -> MovePlan {
    let events = ids_of_kind(graph, NodeKind::Event);
    if !events.is_empty() {
        return MovePlan::attach(NodeKind::Scene, events);
    }
    let periods = ids_of_kind(graph, NodeKind::Period);
    if !periods.is_empty() {
        return MovePlan::attach(NodeKind::Event, periods);
    }
    MovePlan::Root
}

fn focuser(graph: &Graph, history: &[LogEntry]) -> MovePlan {
    let last = history
        .last()
        .and_then(LogEntry::last_added)
        .and_then(|id| graph.node(id));
    let Some(last) = last else {
        return balanced(graph);
    };
    match last.kind {
        NodeKind::Period => MovePlan::attach(NodeKind::Event, vec![last.id.clone()]),
        NodeKind::Event => MovePlan::attach(NodeKind::Scene, vec![last.id.clone()]),
        NodeKind::Scene => match graph.parent_edge(&last.id) {
            Some(edge) => MovePlan::attach(NodeKind::Scene, vec![edge.source.clone()]),
            None => balanced(graph),
        },
    }
}
