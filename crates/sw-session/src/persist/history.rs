use serde::{Deserialize, Serialize};
use sw_core::{
    Edge, EdgeId, Graph, Node, NodeContent, NodeId, NodeKind, PeerDirection, Position,
};
use tracing::info;

use crate::error::SessionResult;
use crate::session::Session;
use crate::turn::TurnState;

/// A period, event or scene in a history document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    /// Node id (`{kind}-{n}`).
    pub id: NodeId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Layout position.
    #[serde(default)]
    pub position: Position,
    /// Periods: the period to the right.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_period_id: Option<NodeId>,
    /// Events: the owning period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_id: Option<NodeId>,
    /// Scenes: the owning event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<NodeId>,
}

impl HistoryNode {
    fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            name: node.data.name.clone(),
            description: node.data.description.clone(),
            image_url: node.data.image_url.clone(),
            position: node.position,
            next_period_id: None,
            period_id: None,
            event_id: None,
        }
    }

    fn into_node(self, kind: NodeKind) -> Node {
        let mut node = Node::new(
            self.id,
            kind,
            self.position,
            NodeContent::new(self.name, self.description),
        );
        node.data.image_url = self.image_url;
        node
    }
}

/// A legacy edge in a history document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLegacy {
    /// Edge id.
    pub id: EdgeId,
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// What carries over.
    #[serde(default)]
    pub description: String,
}

/// The shareable narrative: `{periods, events, scenes, legacies}`.
///
/// Relations travel as optional references on the nodes (`nextPeriodId`,
/// `periodId`, `eventId`) so a round trip keeps the structure. Documents
/// without them import as unconnected nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryDocument {
    /// Every period.
    pub periods: Vec<HistoryNode>,
    /// Every event.
    pub events: Vec<HistoryNode>,
    /// Every scene.
    pub scenes: Vec<HistoryNode>,
    /// Every legacy edge.
    pub legacies: Vec<HistoryLegacy>,
}

impl HistoryDocument {
    /// Export the narrative content of a graph. Scene transcripts are not included.
    pub fn from_graph(graph: &Graph) -> Self {
        let parent = |id: &NodeId| graph.parent_edge(id).map(|e| e.source.clone());
        Self {
            periods: graph
                .nodes_of_kind(NodeKind::Period)
                .map(|n| HistoryNode {
                    next_period_id: graph
                        .peer_of(&n.id, PeerDirection::Right)
                        .map(|p| p.id.clone()),
                    ..HistoryNode::from_node(n)
                })
                .collect(),
            events: graph
                .nodes_of_kind(NodeKind::Event)
                .map(|n| HistoryNode {
                    period_id: parent(&n.id),
                    ..HistoryNode::from_node(n)
                })
                .collect(),
            scenes: graph
                .nodes_of_kind(NodeKind::Scene)
                .map(|n| HistoryNode {
                    event_id: parent(&n.id),
                    ..HistoryNode::from_node(n)
                })
                .collect(),
            legacies: graph
                .legacies()
                .map(|e| HistoryLegacy {
                    id: e.id.clone(),
                    source: e.source.clone(),
                    target: e.target.clone(),
                    description: e.legacy_description().unwrap_or_default().to_string(),
                })
                .collect(),
        }
    }

    /// Rebuild a graph. Ids are kept and the allocator resumes after the
    /// highest numeric suffix found.
    pub fn into_graph(self) -> SessionResult<Graph> {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for period in self.periods {
            if let Some(next) = &period.next_period_id {
                edges.push(Edge::peer(period.id.clone(), next.clone()));
            }
            nodes.push(period.into_node(NodeKind::Period));
        }
        for event in self.events {
            if let Some(owner) = &event.period_id {
                edges.push(Edge::child(owner.clone(), event.id.clone(), NodeKind::Event));
            }
            nodes.push(event.into_node(NodeKind::Event));
        }
        for scene in self.scenes {
            if let Some(owner) = &scene.event_id {
                edges.push(Edge::child(owner.clone(), scene.id.clone(), NodeKind::Scene));
            }
            nodes.push(scene.into_node(NodeKind::Scene));
        }
        edges.extend(
            self.legacies
                .into_iter()
                .map(|l| Edge::legacy(l.id, l.source, l.target, l.description)),
        );

        Ok(Graph::from_parts(nodes, edges, 1)?)
    }

    /// Parse a history document.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Session {
    /// Export the narrative as a history document.
    pub fn export_history(&self) -> HistoryDocument {
        HistoryDocument::from_graph(&self.graph)
    }

    /// Replace the board with an imported history.
    ///
    /// Players, seed and log are kept; the current turn restarts with the
    /// imported board as its baseline. Nothing changes if the document is
    /// inconsistent.
    pub fn import_history(&mut self, document: HistoryDocument) -> SessionResult<()> {
        let graph = document.into_graph()?;
        self.graph = graph;
        self.turn = TurnState::starting(self.turn.active_index, &self.graph);
        info!(nodes = self.graph.node_count(), "history imported");
        Ok(())
    }
}
