use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::NodeKind;

/// Identifier of a node, formatted `"{kind}-{n}"` (e.g. `period-3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric suffix after the last `-`, if there is one.
    pub fn suffix(&self) -> Option<u64> {
        numeric_suffix(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of an edge.
///
/// Structural edges are named after their endpoints (`edge-period-1-event-2`);
/// legacies draw from the allocator (`legacy-7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of a structural edge running from `source` to `target`.
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("edge-{source}-{target}"))
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Monotonic id source owned by the graph.
///
/// The counter is shared across node kinds and legacies, is never reused,
/// and is persisted with the session so reloads keep allocating fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Start counting at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume from a persisted counter value (the next number to hand out).
    pub fn from_counter(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// The next number that will be handed out.
    pub fn counter(&self) -> u64 {
        self.next
    }

    /// Allocate a fresh node id for `kind`.
    pub fn next_id(&mut self, kind: NodeKind) -> NodeId {
        let n = self.bump();
        NodeId(format!("{kind}-{n}"))
    }

    /// Allocate a fresh legacy edge id.
    pub fn next_legacy_id(&mut self) -> EdgeId {
        let n = self.bump();
        EdgeId(format!("legacy-{n}"))
    }

    /// Make sure an externally supplied id can never be allocated again.
    pub fn observe(&mut self, id: &str) {
        if let Some(n) = numeric_suffix(id) {
            self.next = self.next.max(n.saturating_add(1));
        }
    }

    fn bump(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn numeric_suffix(id: &str) -> Option<u64> {
    id.rsplit('-').next().and_then(|tail| tail.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_kind_and_counter() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(NodeKind::Period).as_str(), "period-1");
        assert_eq!(ids.next_id(NodeKind::Event).as_str(), "event-2");
        assert_eq!(ids.next_legacy_id().as_str(), "legacy-3");
        assert_eq!(ids.counter(), 4);
    }

    #[test]
    fn observe_skips_past_foreign_ids() {
        let mut ids = IdAllocator::new();
        ids.observe("scene-41");
        ids.observe("period-7");
        ids.observe("not-a-number");
        assert_eq!(ids.next_id(NodeKind::Event).as_str(), "event-42");
    }

    #[test]
    fn resumed_counter_never_goes_below_one() {
        assert_eq!(IdAllocator::from_counter(0).counter(), 1);
        assert_eq!(IdAllocator::from_counter(12).counter(), 12);
    }

    #[test]
    fn suffix_parsing() {
        assert_eq!(NodeId::from("period-12").suffix(), Some(12));
        assert_eq!(NodeId::from("period").suffix(), None);
    }

    #[test]
    fn edge_id_between() {
        let id = EdgeId::between(&"period-1".into(), &"event-2".into());
        assert_eq!(id.as_str(), "edge-period-1-event-2");
    }
}
