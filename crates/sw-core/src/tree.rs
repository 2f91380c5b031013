//! Nested read-side view of the graph: periods, their events, their scenes.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::id::NodeId;
use crate::node::{Node, NodeKind};

/// A scene as it appears in the narrative tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeScene {
    /// Node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// An event with its scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeEvent {
    /// Node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Scenes attached to this event.
    pub scenes: Vec<NarrativeScene>,
}

/// A period with its events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativePeriod {
    /// Node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Events attached to this period.
    pub events: Vec<NarrativeEvent>,
}

impl Graph {
    /// Project the graph into nested periods, events and scenes.
    ///
    /// Periods come in timeline order (see [`Graph::periods_in_order`]);
    /// children come in attachment order. Nodes without a parent edge only
    /// appear if they are periods. Recomputed on every call.
    pub fn narrative_tree(&self) -> Vec<NarrativePeriod> {
        self.periods_in_order()
            .into_iter()
            .map(|period| NarrativePeriod {
                id: period.id.clone(),
                name: period.data.name.clone(),
                description: period.data.description.clone(),
                image_url: period.data.image_url.clone(),
                events: self
                    .children_of_kind(&period.id, NodeKind::Event)
                    .map(|event| NarrativeEvent {
                        id: event.id.clone(),
                        name: event.data.name.clone(),
                        description: event.data.description.clone(),
                        image_url: event.data.image_url.clone(),
                        scenes: self
                            .children_of_kind(&event.id, NodeKind::Scene)
                            .map(|scene| NarrativeScene {
                                id: scene.id.clone(),
                                name: scene.data.name.clone(),
                                description: scene.data.description.clone(),
                                image_url: scene.data.image_url.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn children_of_kind(&self, parent: &NodeId, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children_of(parent)
            .into_iter()
            .filter(move |n| n.kind == kind)
    }
}
