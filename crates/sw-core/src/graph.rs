use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::edge::{Edge, EdgeKind, PeerDirection};
use crate::error::{GraphError, GraphResult};
use crate::id::{EdgeId, IdAllocator, NodeId};
use crate::node::{Node, NodeContent, NodeKind, NodePatch, Position};

/// Horizontal distance between a period and a peer created beside it.
pub const PEER_OFFSET_X: f64 = 300.0;
/// Vertical distance between a container and a child created beneath it.
pub const CHILD_OFFSET_Y: f64 = 350.0;

/// The authoritative store of nodes and edges.
///
/// Nodes and edges keep their insertion order, which is the order reads,
/// validation and persistence see them in.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    ids: IdAllocator,

    // Indexes
    node_index: HashMap<NodeId, usize>,
    edge_index: HashMap<EdgeId, usize>,
    edges_from: HashMap<NodeId, Vec<usize>>,
    edges_to: HashMap<NodeId, Vec<usize>>,
}

impl Graph {
    /// An empty graph whose ids start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted parts, checking every invariant.
    ///
    /// `counter` is the persisted next id; it is raised past any id found in
    /// `nodes` or `edges` so fresh ids never collide with loaded ones.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>, counter: u64) -> GraphResult<Self> {
        let mut graph = Self {
            ids: IdAllocator::from_counter(counter),
            ..Self::default()
        };

        for node in nodes {
            if graph.node_index.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id));
            }
            graph.ids.observe(node.id.as_str());
            graph.push_node(node);
        }

        for edge in edges {
            graph.check_edge_free(&edge.id)?;
            for end in [&edge.source, &edge.target] {
                if !graph.contains(end) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: end.clone(),
                    });
                }
            }
            graph.validate_structural_edge(&edge)?;
            if edge.kind.is_legacy() {
                graph.ids.observe(edge.id.as_str());
            }
            graph.push_edge(edge);
        }

        Ok(graph)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The next id number the allocator will hand out.
    pub fn id_counter(&self) -> u64 {
        self.ids.counter()
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Whether a node exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// Look up an edge.
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    /// Nodes of one kind, in insertion order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// Number of nodes of one kind.
    pub fn count_of_kind(&self, kind: NodeKind) -> usize {
        self.nodes_of_kind(kind).count()
    }

    /// Edges leaving `node`.
    pub fn edges_from(&self, node: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edges_from
            .get(node)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Edges arriving at `node`.
    pub fn edges_to(&self, node: &NodeId) -> impl Iterator<Item = &Edge> {
        self.edges_to
            .get(node)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// All legacy edges.
    pub fn legacies(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.kind.is_legacy())
    }

    /// The parent-child edge arriving at `node`, if any.
    pub fn parent_edge(&self, node: &NodeId) -> Option<&Edge> {
        self.edges_to(node)
            .find(|e| matches!(e.kind, EdgeKind::Child { .. }))
    }

    /// The node `node` hangs under, if any.
    pub fn parent_of(&self, node: &NodeId) -> Option<&Node> {
        self.parent_edge(node).and_then(|e| self.node(&e.source))
    }

    /// Children of `node`, in the order they were attached.
    pub fn children_of(&self, node: &NodeId) -> Vec<&Node> {
        self.edges_from(node)
            .filter(|e| matches!(e.kind, EdgeKind::Child { .. }))
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// The peer edge on one side of a period.
    pub fn peer_edge(&self, node: &NodeId, direction: PeerDirection) -> Option<&Edge> {
        match direction {
            PeerDirection::Right => self
                .edges_from(node)
                .find(|e| e.kind == EdgeKind::Peer),
            PeerDirection::Left => self.edges_to(node).find(|e| e.kind == EdgeKind::Peer),
        }
    }

    /// The period beside `node` on one side.
    pub fn peer_of(&self, node: &NodeId, direction: PeerDirection) -> Option<&Node> {
        self.peer_edge(node, direction).and_then(|e| match direction {
            PeerDirection::Right => self.node(&e.target),
            PeerDirection::Left => self.node(&e.source),
        })
    }

    /// The first node (in insertion order) missing a name or description.
    pub fn first_incomplete(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| !n.is_complete())
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    /// Insert a free-standing node with a fresh id.
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        position: Position,
        content: NodeContent,
    ) -> NodeId {
        let id = self.ids.next_id(kind);
        self.push_node(Node::new(id.clone(), kind, position, content));
        debug!(node = %id, %kind, "created node");
        id
    }

    /// Add a new period beside `from`, linked by a peer edge.
    ///
    /// Fails if `from` is not a period or already has a peer on that side.
    pub fn create_peer(
        &mut self,
        from: &NodeId,
        direction: PeerDirection,
        content: NodeContent,
    ) -> GraphResult<(NodeId, EdgeId)> {
        let source = self.require(from)?;
        if source.kind != NodeKind::Period {
            return Err(GraphError::NotAPeriod(from.clone()));
        }
        if self.peer_edge(from, direction).is_some() {
            return Err(GraphError::PeerOccupied {
                node: from.clone(),
                direction,
            });
        }

        let dx = match direction {
            PeerDirection::Left => -PEER_OFFSET_X,
            PeerDirection::Right => PEER_OFFSET_X,
        };
        let position = source.position.offset(dx, 0.0);

        let mut ids = self.ids;
        let new_id = ids.next_id(NodeKind::Period);
        let edge = match direction {
            PeerDirection::Left => Edge::peer(new_id.clone(), from.clone()),
            PeerDirection::Right => Edge::peer(from.clone(), new_id.clone()),
        };
        self.check_edge_free(&edge.id)?;
        self.ids = ids;

        let edge_id = edge.id.clone();
        self.push_node(Node::new(new_id.clone(), NodeKind::Period, position, content));
        self.push_edge(edge);
        debug!(node = %new_id, from = %from, %direction, "created peer period");
        Ok((new_id, edge_id))
    }

    /// Add a new child of `child_kind` under `parent`.
    ///
    /// Events may only hang under periods and scenes only under events.
    pub fn create_child(
        &mut self,
        parent: &NodeId,
        child_kind: NodeKind,
        content: NodeContent,
    ) -> GraphResult<(NodeId, EdgeId)> {
        let parent_node = self.require(parent)?;
        if child_kind.required_parent() != Some(parent_node.kind) {
            return Err(GraphError::InvalidParent {
                parent: parent_node.kind,
                child: child_kind,
            });
        }
        let position = parent_node.position.offset(0.0, CHILD_OFFSET_Y);

        let mut ids = self.ids;
        let new_id = ids.next_id(child_kind);
        let edge = Edge::child(parent.clone(), new_id.clone(), child_kind);
        self.check_edge_free(&edge.id)?;
        self.ids = ids;

        let edge_id = edge.id.clone();
        self.push_node(Node::new(new_id.clone(), child_kind, position, content));
        self.push_edge(edge);
        debug!(node = %new_id, parent = %parent, kind = %child_kind, "created child");
        Ok((new_id, edge_id))
    }

    // -----------------------------------------------------------------------
    // Legacies
    // -----------------------------------------------------------------------

    /// Link any two nodes with a legacy. No cardinality limits apply.
    pub fn connect_legacy(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        description: impl Into<String>,
    ) -> GraphResult<EdgeId> {
        self.require(source)?;
        self.require(target)?;

        let mut ids = self.ids;
        let id = ids.next_legacy_id();
        self.check_edge_free(&id)?;
        self.ids = ids;

        self.push_edge(Edge::legacy(
            id.clone(),
            source.clone(),
            target.clone(),
            description.into(),
        ));
        debug!(edge = %id, %source, %target, "connected legacy");
        Ok(id)
    }

    /// Replace a legacy's description.
    pub fn update_legacy(&mut self, id: &EdgeId, description: impl Into<String>) -> GraphResult<()> {
        let index = *self
            .edge_index
            .get(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        match &mut self.edges[index].kind {
            EdgeKind::Legacy { description: d } => {
                *d = description.into();
                Ok(())
            }
            _ => Err(GraphError::NotALegacy(id.clone())),
        }
    }

    /// Remove a legacy edge.
    pub fn remove_legacy(&mut self, id: &EdgeId) -> GraphResult<Edge> {
        let edge = self
            .edge(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        if !edge.kind.is_legacy() {
            return Err(GraphError::NotALegacy(id.clone()));
        }
        let removed = self.remove_edges(|e| e.id == *id);
        debug!(edge = %id, "removed legacy");
        removed
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))
    }

    // -----------------------------------------------------------------------
    // Node edits and removal
    // -----------------------------------------------------------------------

    /// Shallow-merge `patch` into a node's data. Last write wins.
    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> GraphResult<()> {
        let index = self.index_of(id)?;
        if patch.touches_scene() && self.nodes[index].kind != NodeKind::Scene {
            return Err(GraphError::NotAScene(id.clone()));
        }
        patch.apply(&mut self.nodes[index].data);
        debug!(node = %id, "updated node");
        Ok(())
    }

    /// Move a node on the board.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> GraphResult<()> {
        let index = self.index_of(id)?;
        self.nodes[index].position = position;
        Ok(())
    }

    /// Remove a node and every edge touching it.
    ///
    /// Children are not deleted: they stay on the board without a parent edge.
    pub fn delete_node(&mut self, id: &NodeId) -> GraphResult<Node> {
        let index = self.index_of(id)?;
        let node = self.nodes.remove(index);
        let dropped = self.remove_edges(|e| e.touches(id));
        debug!(node = %id, edges = dropped.len(), "deleted node");
        Ok(node)
    }

    /// Remove the peer edge on one side of a period, leaving other edges alone.
    pub fn disconnect_peer(&mut self, id: &NodeId, direction: PeerDirection) -> GraphResult<Edge> {
        self.require(id)?;
        let edge_id = self
            .peer_edge(id, direction)
            .map(|e| e.id.clone())
            .ok_or_else(|| GraphError::NoPeer {
                node: id.clone(),
                direction,
            })?;
        let removed = self.remove_edges(|e| e.id == edge_id);
        debug!(node = %id, %direction, "disconnected peer");
        removed
            .into_iter()
            .next()
            .ok_or(GraphError::EdgeNotFound(edge_id))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, id: &NodeId) -> GraphResult<&Node> {
        self.node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    fn index_of(&self, id: &NodeId) -> GraphResult<usize> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))
    }

    fn check_edge_free(&self, id: &EdgeId) -> GraphResult<()> {
        if self.edge_index.contains_key(id) {
            Err(GraphError::DuplicateEdge(id.clone()))
        } else {
            Ok(())
        }
    }

    /// Hierarchy and peer-cardinality checks for a loaded edge.
    fn validate_structural_edge(&self, edge: &Edge) -> GraphResult<()> {
        let invalid = |reason: &str| GraphError::InvalidEdge {
            edge: edge.id.clone(),
            reason: reason.to_string(),
        };
        let kind_of = |id: &NodeId| self.node(id).map(|n| n.kind);

        match &edge.kind {
            EdgeKind::Peer => {
                if edge.source == edge.target {
                    return Err(invalid("a period cannot be its own peer"));
                }
                if kind_of(&edge.source) != Some(NodeKind::Period)
                    || kind_of(&edge.target) != Some(NodeKind::Period)
                {
                    return Err(invalid("peer edges join two periods"));
                }
                if self.peer_edge(&edge.source, PeerDirection::Right).is_some() {
                    return Err(invalid("source already has a right peer"));
                }
                if self.peer_edge(&edge.target, PeerDirection::Left).is_some() {
                    return Err(invalid("target already has a left peer"));
                }
            }
            EdgeKind::Child { child } => {
                if kind_of(&edge.target) != Some(*child) {
                    return Err(invalid("child handle does not match the target's kind"));
                }
                if kind_of(&edge.source) != child.required_parent() {
                    return Err(invalid("parent kind does not match the child's kind"));
                }
                if self.parent_edge(&edge.target).is_some() {
                    return Err(invalid("child already has a parent"));
                }
            }
            EdgeKind::Legacy { .. } => {}
        }
        Ok(())
    }

    fn push_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn push_edge(&mut self, edge: Edge) {
        let index = self.edges.len();
        self.edge_index.insert(edge.id.clone(), index);
        self.edges_from
            .entry(edge.source.clone())
            .or_default()
            .push(index);
        self.edges_to
            .entry(edge.target.clone())
            .or_default()
            .push(index);
        self.edges.push(edge);
    }

    /// Drop every edge matching `pred` and rebuild the indexes.
    fn remove_edges(&mut self, pred: impl Fn(&Edge) -> bool) -> Vec<Edge> {
        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            std::mem::take(&mut self.edges).into_iter().partition(pred);
        self.edges = kept;
        self.reindex();
        removed
    }

    fn reindex(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.edge_index.clear();
        self.edges_from.clear();
        self.edges_to.clear();
        for (index, edge) in self.edges.iter().enumerate() {
            self.edge_index.insert(edge.id.clone(), index);
            self.edges_from
                .entry(edge.source.clone())
                .or_default()
                .push(index);
            self.edges_to
                .entry(edge.target.clone())
                .or_default()
                .push(index);
        }
    }

    /// Periods in timeline order: each chain walked left to right, chains in
    /// the order their leftmost period was created.
    pub fn periods_in_order(&self) -> Vec<&Node> {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        let mut ordered = Vec::new();

        let heads_first = self
            .nodes_of_kind(NodeKind::Period)
            .filter(|p| self.peer_edge(&p.id, PeerDirection::Left).is_none())
            .chain(self.nodes_of_kind(NodeKind::Period));

        for start in heads_first {
            let mut cursor = Some(start);
            while let Some(period) = cursor {
                if !seen.insert(&period.id) {
                    break;
                }
                ordered.push(period);
                cursor = self.peer_of(&period.id, PeerDirection::Right);
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(kind: NodeKind) -> NodeContent {
        NodeContent::placeholder(kind)
    }

    fn graph_with_period() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let period = graph.create_node(
            NodeKind::Period,
            Position::new(100.0, 100.0),
            placeholder(NodeKind::Period),
        );
        (graph, period)
    }

    #[test]
    fn create_node_allocates_sequential_ids() {
        let mut graph = Graph::new();
        let a = graph.create_node(NodeKind::Period, Position::default(), placeholder(NodeKind::Period));
        let b = graph.create_node(NodeKind::Scene, Position::default(), placeholder(NodeKind::Scene));
        assert_eq!(a.as_str(), "period-1");
        assert_eq!(b.as_str(), "scene-2");
        assert_eq!(graph.id_counter(), 3);
    }

    #[test]
    fn peer_is_offset_horizontally() {
        let (mut graph, period) = graph_with_period();
        let (right, edge) = graph
            .create_peer(&period, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap();
        let (left, _) = graph
            .create_peer(&period, PeerDirection::Left, placeholder(NodeKind::Period))
            .unwrap();

        assert_eq!(graph.node(&right).unwrap().position, Position::new(400.0, 100.0));
        assert_eq!(graph.node(&left).unwrap().position, Position::new(-200.0, 100.0));
        assert_eq!(graph.edge(&edge).unwrap().source, period);
        assert_eq!(graph.peer_of(&period, PeerDirection::Left).unwrap().id, left);
        assert_eq!(graph.peer_of(&period, PeerDirection::Right).unwrap().id, right);
    }

    #[test]
    fn occupied_peer_side_is_rejected() {
        let (mut graph, period) = graph_with_period();
        graph
            .create_peer(&period, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap();
        let before = graph.node_count();
        let err = graph
            .create_peer(&period, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap_err();
        assert!(matches!(err, GraphError::PeerOccupied { .. }));
        assert_eq!(graph.node_count(), before);
    }

    #[test]
    fn peer_requires_a_period() {
        let (mut graph, period) = graph_with_period();
        let (event, _) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        let err = graph
            .create_peer(&event, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap_err();
        assert_eq!(err, GraphError::NotAPeriod(event));
    }

    #[test]
    fn children_follow_the_hierarchy() {
        let (mut graph, period) = graph_with_period();
        let (event, _) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        let (scene, _) = graph
            .create_child(&event, NodeKind::Scene, placeholder(NodeKind::Scene))
            .unwrap();

        assert_eq!(graph.node(&event).unwrap().position, Position::new(100.0, 450.0));
        assert_eq!(graph.parent_of(&scene).unwrap().id, event);
        assert_eq!(graph.children_of(&period).len(), 1);
    }

    #[test]
    fn scene_under_period_is_rejected() {
        let (mut graph, period) = graph_with_period();
        let counter = graph.id_counter();
        let err = graph
            .create_child(&period, NodeKind::Scene, placeholder(NodeKind::Scene))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidParent {
                parent: NodeKind::Period,
                child: NodeKind::Scene
            }
        );
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.id_counter(), counter);
    }

    #[test]
    fn period_cannot_be_a_child() {
        let (mut graph, period) = graph_with_period();
        assert!(
            graph
                .create_child(&period, NodeKind::Period, placeholder(NodeKind::Period))
                .is_err()
        );
    }

    #[test]
    fn legacy_links_any_pair() {
        let (mut graph, period) = graph_with_period();
        let (event, _) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        let a = graph.connect_legacy(&period, &event, "The oath").unwrap();
        let b = graph.connect_legacy(&period, &event, "The debt").unwrap();
        assert_ne!(a, b);
        assert_eq!(graph.legacies().count(), 2);

        graph.update_legacy(&a, "The broken oath").unwrap();
        assert_eq!(graph.edge(&a).unwrap().legacy_description(), Some("The broken oath"));

        graph.remove_legacy(&b).unwrap();
        assert_eq!(graph.legacies().count(), 1);
    }

    #[test]
    fn legacy_edit_rejects_structural_edges() {
        let (mut graph, period) = graph_with_period();
        let (_, edge) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        assert_eq!(
            graph.update_legacy(&edge, "nope").unwrap_err(),
            GraphError::NotALegacy(edge.clone())
        );
        assert!(graph.remove_legacy(&edge).is_err());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn legacy_needs_existing_nodes() {
        let (mut graph, period) = graph_with_period();
        let err = graph
            .connect_legacy(&period, &"event-99".into(), "ghost")
            .unwrap_err();
        assert_eq!(err, GraphError::NodeNotFound("event-99".into()));
    }

    #[test]
    fn delete_leaves_children_orphaned() {
        let (mut graph, period) = graph_with_period();
        let (event, _) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        let (scene, _) = graph
            .create_child(&event, NodeKind::Scene, placeholder(NodeKind::Scene))
            .unwrap();
        graph.connect_legacy(&event, &period, "echo").unwrap();

        graph.delete_node(&event).unwrap();

        assert!(graph.contains(&scene));
        assert!(graph.parent_of(&scene).is_none());
        assert!(graph.children_of(&period).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn disconnect_peer_only_touches_that_side() {
        let (mut graph, period) = graph_with_period();
        let (right, _) = graph
            .create_peer(&period, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap();
        graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();

        assert!(graph.disconnect_peer(&period, PeerDirection::Left).is_err());
        graph.disconnect_peer(&right, PeerDirection::Left).unwrap();

        assert!(graph.peer_of(&period, PeerDirection::Right).is_none());
        assert_eq!(graph.children_of(&period).len(), 1);
    }

    #[test]
    fn update_node_rejects_scene_fields_elsewhere() {
        let (mut graph, period) = graph_with_period();
        let patch = NodePatch::name("Age of Ash").with_mode(crate::node::SceneMode::Roleplay);
        assert_eq!(
            graph.update_node(&period, patch).unwrap_err(),
            GraphError::NotAScene(period.clone())
        );
        assert_eq!(graph.node(&period).unwrap().name(), "New Period");

        graph.update_node(&period, NodePatch::name("Age of Ash")).unwrap();
        assert_eq!(graph.node(&period).unwrap().name(), "Age of Ash");
    }

    #[test]
    fn first_incomplete_follows_insertion_order() {
        let (mut graph, period) = graph_with_period();
        let (event, _) = graph
            .create_child(&period, NodeKind::Event, placeholder(NodeKind::Event))
            .unwrap();
        assert_eq!(graph.first_incomplete().unwrap().id, period);

        graph
            .update_node(&period, NodePatch::description("Embers everywhere"))
            .unwrap();
        assert_eq!(graph.first_incomplete().unwrap().id, event);
    }

    #[test]
    fn periods_in_order_walks_chains() {
        let (mut graph, middle) = graph_with_period();
        let (right, _) = graph
            .create_peer(&middle, PeerDirection::Right, placeholder(NodeKind::Period))
            .unwrap();
        let (left, _) = graph
            .create_peer(&middle, PeerDirection::Left, placeholder(NodeKind::Period))
            .unwrap();
        let loner = graph.create_node(NodeKind::Period, Position::default(), placeholder(NodeKind::Period));

        let order: Vec<&NodeId> = graph.periods_in_order().iter().map(|p| &p.id).collect();
        assert_eq!(order, vec![&left, &middle, &right, &loner]);
    }

    #[test]
    fn from_parts_rejects_bad_hierarchy() {
        let period = Node::new(
            "period-1".into(),
            NodeKind::Period,
            Position::default(),
            placeholder(NodeKind::Period),
        );
        let scene = Node::new(
            "scene-2".into(),
            NodeKind::Scene,
            Position::default(),
            placeholder(NodeKind::Scene),
        );
        let edge = Edge::child("period-1".into(), "scene-2".into(), NodeKind::Scene);
        let err = Graph::from_parts(vec![period, scene], vec![edge], 3).unwrap_err();
        assert!(matches!(err, GraphError::InvalidEdge { .. }));
    }

    #[test]
    fn from_parts_rejects_dangling_edges() {
        let period = Node::new(
            "period-1".into(),
            NodeKind::Period,
            Position::default(),
            placeholder(NodeKind::Period),
        );
        let edge = Edge::legacy("legacy-5".into(), "period-1".into(), "event-9".into(), String::new());
        let err = Graph::from_parts(vec![period], vec![edge], 1).unwrap_err();
        assert!(matches!(err, GraphError::DanglingEdge { .. }));
    }

    #[test]
    fn from_parts_raises_the_counter() {
        let node = Node::new(
            "event-17".into(),
            NodeKind::Event,
            Position::default(),
            placeholder(NodeKind::Event),
        );
        let mut graph = Graph::from_parts(vec![node], Vec::new(), 2).unwrap();
        assert_eq!(graph.id_counter(), 18);
        let id = graph.create_node(NodeKind::Period, Position::default(), placeholder(NodeKind::Period));
        assert_eq!(id.as_str(), "period-18");
    }
}
