use crate::edge::PeerDirection;
use crate::id::{EdgeId, NodeId};
use crate::node::NodeKind;

/// Alias for `Result<T, GraphError>`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the graph store. A failed mutation never changes the graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The requested node id does not exist.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested edge id does not exist.
    #[error("edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A child of this kind cannot hang under a parent of that kind.
    #[error("a {child} cannot be attached under a {parent}")]
    InvalidParent {
        /// Kind of the would-be parent.
        parent: NodeKind,
        /// Kind of the child being attached.
        child: NodeKind,
    },

    /// Peer operations only apply to periods.
    #[error("{0} is not a period")]
    NotAPeriod(NodeId),

    /// The period already has a peer on that side.
    #[error("{node} already has a {direction} peer")]
    PeerOccupied {
        /// The period whose side is taken.
        node: NodeId,
        /// The occupied side.
        direction: PeerDirection,
    },

    /// The period has no peer on that side.
    #[error("{node} has no {direction} peer")]
    NoPeer {
        /// The period that was inspected.
        node: NodeId,
        /// The empty side.
        direction: PeerDirection,
    },

    /// Only legacy edges can be edited or removed directly.
    #[error("edge {0} is not a legacy")]
    NotALegacy(EdgeId),

    /// Scene-only fields were supplied for a node that is not a scene.
    #[error("{0} is not a scene")]
    NotAScene(NodeId),

    /// Two nodes share an id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Two edges share an id.
    #[error("duplicate edge id: {0}")]
    DuplicateEdge(EdgeId),

    /// An edge references a node that does not exist.
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge {
        /// The offending edge.
        edge: EdgeId,
        /// The missing endpoint.
        node: NodeId,
    },

    /// An edge breaks the hierarchy or peer rules.
    #[error("invalid edge {edge}: {reason}")]
    InvalidEdge {
        /// The offending edge.
        edge: EdgeId,
        /// What rule it breaks.
        reason: String,
    },
}
