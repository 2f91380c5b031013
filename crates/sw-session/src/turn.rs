//! Per-turn bookkeeping: quota usage, the turn's first node, and the
//! baseline used to work out what changed.

use std::collections::HashSet;

use sw_core::{Graph, Node, NodeId};

/// Where a new node is about to be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// A free-standing period.
    Root,
    /// A period beside an existing one.
    Peer(&'a NodeId),
    /// A child of an existing node.
    Child(&'a NodeId),
}

/// Turn state for the active player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnState {
    /// Index of the active player in the turn order.
    pub active_index: usize,
    /// Nodes created so far this turn.
    pub nodes_created: u32,
    /// The node created first this turn.
    pub first_node: Option<NodeId>,
    /// The node set when the turn started.
    pub nodes_at_start: Vec<Node>,
}

impl TurnState {
    /// A fresh turn for player `active_index` with `graph` as the baseline.
    pub fn starting(active_index: usize, graph: &Graph) -> Self {
        Self {
            active_index,
            nodes_created: 0,
            first_node: None,
            nodes_at_start: graph.nodes().to_vec(),
        }
    }

    /// Whether the host is active.
    pub fn is_host(&self) -> bool {
        self.active_index == 0
    }

    /// Check a creation against the quota and the first-node rule.
    ///
    /// `limit` of `None` means unlimited with no placement rule.
    pub fn check_creation(
        &self,
        limit: Option<u32>,
        placement: Placement<'_>,
    ) -> Result<(), CreationDenied> {
        let Some(limit) = limit else {
            return Ok(());
        };
        if self.nodes_created >= limit {
            return Err(CreationDenied::Quota { limit });
        }
        if self.nodes_created == 0 || !self.is_host() {
            return Ok(());
        }
        match (&self.first_node, placement) {
            (Some(first), Placement::Child(parent)) if first == parent => Ok(()),
            (Some(first), _) => Err(CreationDenied::NotUnderFirst {
                first: first.clone(),
            }),
            (None, _) => Ok(()),
        }
    }

    /// Count a created node.
    pub fn record_creation(&mut self, id: &NodeId) {
        self.nodes_created += 1;
        if self.first_node.is_none() {
            self.first_node = Some(id.clone());
        }
    }

    /// Nodes present in `graph` but not in the turn-start baseline, in graph order.
    pub fn added_since_start<'g>(&self, graph: &'g Graph) -> Vec<&'g Node> {
        let before: HashSet<&NodeId> = self.nodes_at_start.iter().map(|n| &n.id).collect();
        graph
            .nodes()
            .iter()
            .filter(|n| !before.contains(&n.id))
            .collect()
    }
}

/// Why a creation was refused by the turn rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationDenied {
    /// The per-turn limit is used up.
    Quota {
        /// Nodes allowed per turn.
        limit: u32,
    },
    /// The host's later nodes must be children of the first.
    NotUnderFirst {
        /// The turn's first node.
        first: NodeId,
    },
}
