//! The append-only history log and turn summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sw_core::text::excerpt;
use sw_core::{Node, NodeId};

use crate::player::PlayerId;

/// What one player added during one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Who played the turn.
    pub player_id: PlayerId,
    /// Their name at the time.
    pub player_name: String,
    /// Human-readable description of the additions.
    pub summary: String,
    /// When the turn ended.
    pub timestamp: DateTime<Utc>,
    /// Ids of the nodes added, in creation order.
    #[serde(default)]
    pub added_node_ids: Vec<NodeId>,
}

impl LogEntry {
    /// Build an entry stamped with the current time.
    pub fn new(
        player_id: PlayerId,
        player_name: impl Into<String>,
        added: &[&Node],
        excerpt_len: usize,
    ) -> Self {
        let player_name = player_name.into();
        Self {
            summary: summarize(&player_name, added, excerpt_len),
            player_id,
            player_name,
            timestamp: Utc::now(),
            added_node_ids: added.iter().map(|n| n.id.clone()).collect(),
        }
    }

    /// The most recently added node id in this entry.
    pub fn last_added(&self) -> Option<&NodeId> {
        self.added_node_ids.last()
    }
}

/// `Ann added: Period "Dawn" (The first light...); Event "Flood"`.
pub fn summarize(player_name: &str, added: &[&Node], excerpt_len: usize) -> String {
    let parts: Vec<String> = added
        .iter()
        .map(|node| {
            let text = excerpt(node.description(), excerpt_len);
            if text.is_empty() {
                format!("{} \"{}\"", node.kind.label(), node.name().trim())
            } else {
                format!("{} \"{}\" ({text})", node.kind.label(), node.name().trim())
            }
        })
        .collect();
    format!("{player_name} added: {}", parts.join("; "))
}
