use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, NodeId};
use crate::node::NodeKind;

const PEER_SOURCE: &str = "peer-source";
const PEER_TARGET: &str = "peer-target";
const EVENT_SOURCE: &str = "child-source";
const EVENT_TARGET: &str = "period-target";
const SCENE_SOURCE: &str = "scene-source";
const SCENE_TARGET: &str = "event-target";
const LEGACY_SOURCE: &str = "legacy-source";
const LEGACY_TARGET: &str = "legacy-target";

const ACCENT_STROKE: &str = "hsl(var(--accent))";
const PRIMARY_STROKE: &str = "hsl(var(--primary))";

/// Which side of a period a peer sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerDirection {
    /// Earlier in the timeline.
    Left,
    /// Later in the timeline.
    Right,
}

impl PeerDirection {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Parse `left`/`right` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Some(Self::Left),
            "right" | "r" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for PeerDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// The semantic kind of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// Period to period, source on the left.
    Peer,
    /// Container to child; `child` is the kind of the target node.
    Child {
        /// Kind of the child end (event or scene).
        child: NodeKind,
    },
    /// Free-floating thematic link with a description.
    Legacy {
        /// What carries over between the two nodes.
        description: String,
    },
}

impl EdgeKind {
    /// True for legacy links.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }

    fn handles(&self) -> (&'static str, &'static str) {
        match self {
            Self::Peer => (PEER_SOURCE, PEER_TARGET),
            Self::Child {
                child: NodeKind::Scene,
            } => (SCENE_SOURCE, SCENE_TARGET),
            Self::Child { .. } => (EVENT_SOURCE, EVENT_TARGET),
            Self::Legacy { .. } => (LEGACY_SOURCE, LEGACY_TARGET),
        }
    }

    fn from_handles(source: Option<&str>, target: Option<&str>, description: String) -> Self {
        match (source, target) {
            (Some(PEER_SOURCE), _) | (_, Some(PEER_TARGET)) => Self::Peer,
            (Some(SCENE_SOURCE), _) | (_, Some(SCENE_TARGET)) => Self::Child {
                child: NodeKind::Scene,
            },
            (Some(EVENT_SOURCE), _) | (_, Some(EVENT_TARGET)) => Self::Child {
                child: NodeKind::Event,
            },
            _ => Self::Legacy { description },
        }
    }
}

/// A directed, typed relation between two nodes.
///
/// Serialized in the board's wire shape: `{id, source, target, sourceHandle,
/// targetHandle, style, data}`. The kind is recovered from the handle names;
/// connections with unknown handles load as legacies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EdgeRecord", into = "EdgeRecord")]
pub struct Edge {
    /// Unique edge id.
    pub id: EdgeId,
    /// Where the edge starts (left peer, parent, or legacy origin).
    pub source: NodeId,
    /// Where the edge ends (right peer, child, or legacy destination).
    pub target: NodeId,
    /// What the edge means.
    pub kind: EdgeKind,
}

impl Edge {
    /// A peer link from the left period to the right one.
    pub fn peer(left: NodeId, right: NodeId) -> Self {
        Self {
            id: EdgeId::between(&left, &right),
            source: left,
            target: right,
            kind: EdgeKind::Peer,
        }
    }

    /// A parent-child link.
    pub fn child(parent: NodeId, child: NodeId, child_kind: NodeKind) -> Self {
        Self {
            id: EdgeId::between(&parent, &child),
            source: parent,
            target: child,
            kind: EdgeKind::Child { child: child_kind },
        }
    }

    /// A legacy link with an explicit id.
    pub fn legacy(id: EdgeId, source: NodeId, target: NodeId, description: String) -> Self {
        Self {
            id,
            source,
            target,
            kind: EdgeKind::Legacy { description },
        }
    }

    /// True when either end is `node`.
    pub fn touches(&self, node: &NodeId) -> bool {
        self.source == *node || self.target == *node
    }

    /// The legacy description, if this is a legacy.
    pub fn legacy_description(&self) -> Option<&str> {
        match &self.kind {
            EdgeKind::Legacy { description } => Some(description),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRecord {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<EdgeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<EdgeData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stroke: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EdgeData {
    #[serde(default)]
    description: String,
}

impl From<EdgeRecord> for Edge {
    fn from(record: EdgeRecord) -> Self {
        let description = record.data.map(|d| d.description).unwrap_or_default();
        let kind = EdgeKind::from_handles(
            record.source_handle.as_deref(),
            record.target_handle.as_deref(),
            description,
        );
        Self {
            id: record.id,
            source: record.source,
            target: record.target,
            kind,
        }
    }
}

impl From<Edge> for EdgeRecord {
    fn from(edge: Edge) -> Self {
        let (source_handle, target_handle) = edge.kind.handles();
        let stroke = match &edge.kind {
            EdgeKind::Peer
            | EdgeKind::Child {
                child: NodeKind::Scene,
            } => Some(ACCENT_STROKE.to_string()),
            EdgeKind::Child { .. } => Some(PRIMARY_STROKE.to_string()),
            EdgeKind::Legacy { .. } => None,
        };
        let data = match edge.kind {
            EdgeKind::Legacy { description } => Some(EdgeData { description }),
            _ => None,
        };
        Self {
            id: edge.id,
            source: edge.source,
            target: edge.target,
            source_handle: Some(source_handle.to_string()),
            target_handle: Some(target_handle.to_string()),
            style: stroke.map(|stroke| EdgeStyle {
                stroke: Some(stroke),
            }),
            data,
        }
    }
}
