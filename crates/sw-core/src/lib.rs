//! Narrative graph store for Session Weaver.
//!
//! A session's story is a graph of [`Node`]s (periods, events and scenes)
//! joined by typed [`Edge`]s. Every structural change goes through [`Graph`],
//! which enforces the hierarchy (scenes under events, events under periods)
//! and the one-peer-per-side rule for periods. The nested
//! [`NarrativePeriod`] view is derived on demand and never cached.

/// Typed connections between nodes.
pub mod edge;
/// Error types used throughout the crate.
pub mod error;
/// The graph store that owns nodes and edges.
pub mod graph;
/// Node and edge identifiers and the id allocator.
pub mod id;
/// Node types and their editable data.
pub mod node;
/// Rich-text helpers (tag stripping, excerpts).
pub mod text;
/// Nested period/event/scene projection of the graph.
pub mod tree;

/// Re-export edge types.
pub use edge::{Edge, EdgeKind, PeerDirection};
/// Re-export error types.
pub use error::{GraphError, GraphResult};
/// Re-export the graph store and layout constants.
pub use graph::{CHILD_OFFSET_Y, Graph, PEER_OFFSET_X};
/// Re-export identifier types.
pub use id::{EdgeId, IdAllocator, NodeId};
/// Re-export node types.
pub use node::{
    DialogueMessage, DialogueRole, Node, NodeContent, NodeData, NodeKind, NodePatch, Position,
    SceneMode, SceneState,
};
/// Re-export the narrative tree types.
pub use tree::{NarrativeEvent, NarrativePeriod, NarrativeScene};
