use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sw_core::{DialogueMessage, NodeContent, NodeId, NodeKind};
use thiserror::Error;

use crate::seed::GameSeed;

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Ways a generation call can fail. None of them are fatal to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The service could not be reached or answered with an error.
    #[error("generation request failed: {0}")]
    Request(String),

    /// The service answered with something that could not be understood.
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    /// The service answered with nothing usable.
    #[error("generation returned no content")]
    Empty,
}

/// Input for writing a fresh node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    /// Creative premise.
    pub game_seed: GameSeed,
    /// Writing style.
    pub personality: String,
    /// Kind of node to write.
    pub kind: NodeKind,
    /// The container or neighbour the node attaches to.
    pub parent: Option<NodeContent>,
    /// Current theme hint, possibly empty.
    pub focus: String,
}

/// Input for rewriting a proposal after feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueRequest {
    /// Writing style.
    pub personality: String,
    /// Kind of node being written.
    pub kind: NodeKind,
    /// The proposal being critiqued.
    pub previous: NodeContent,
    /// Free-text feedback from the reviewer.
    pub feedback: String,
}

/// Input for one line of roleplay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueRequest {
    /// Voice to speak in.
    pub personality: String,
    /// The scene being played.
    pub scene: NodeContent,
    /// Transcript so far, ending with the player's line.
    pub history: Vec<DialogueMessage>,
}

/// A node offered as context for legacy suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBrief {
    /// Node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Plain-text description.
    pub description: String,
}

/// An existing legacy offered as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBrief {
    /// Edge id.
    pub id: String,
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// What carries over.
    pub description: String,
}

/// Input for legacy suggestions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LegacyRequest {
    /// Every period.
    pub periods: Vec<NodeBrief>,
    /// Every event.
    pub events: Vec<NodeBrief>,
    /// Every existing legacy edge.
    pub legacies: Vec<LegacyBrief>,
}

/// A proposed legacy connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySuggestion {
    /// Where the legacy starts.
    pub source: NodeId,
    /// Where it leads.
    pub target: NodeId,
    /// Why the two are connected; becomes the legacy's description.
    pub reason: String,
}

/// The external text-generation service.
///
/// Every call may fail; callers turn failures into outcomes rather than
/// aborting the session.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// Write a name and description for a new node.
    async fn generate_node(&self, request: &NodeRequest) -> GenerationResult<NodeContent>;

    /// Rewrite a proposal using reviewer feedback.
    async fn regenerate_node(&self, request: &CritiqueRequest) -> GenerationResult<NodeContent>;

    /// Reply in character to the latest line of a roleplay.
    async fn dialogue_reply(&self, request: &DialogueRequest) -> GenerationResult<String>;

    /// Propose new legacy connections.
    async fn suggest_legacies(
        &self,
        request: &LegacyRequest,
    ) -> GenerationResult<Vec<LegacySuggestion>>;
}

/// Reject content with neither a name nor a description.
pub fn non_empty(content: NodeContent) -> GenerationResult<NodeContent> {
    if content.name.trim().is_empty() && content.description.trim().is_empty() {
        Err(GenerationError::Empty)
    } else {
        Ok(content)
    }
}
