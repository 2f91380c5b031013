//! Error types for the session engine.

use sw_core::{GraphError, NodeId, NodeKind};
use thiserror::Error;

use crate::ai::GenerationError;
use crate::player::PlayerId;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by a session. A rejected operation leaves the session as it was.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The graph refused the mutation.
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// The session has no players.
    #[error("the session has no players")]
    NoPlayers,

    /// The last player cannot leave.
    #[error("cannot remove the last player")]
    LastPlayer,

    /// No player has this id.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Player names must contain visible text.
    #[error("player name cannot be empty")]
    EmptyPlayerName,

    /// Someone other than the active player tried to act.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The active player has used up this turn's node quota.
    #[error("no more nodes this turn (limit {limit})")]
    QuotaExceeded {
        /// Nodes allowed per turn for this player.
        limit: u32,
    },

    /// The host's later nodes must hang under the turn's first node.
    #[error("this node must be attached as a child of {first}")]
    MustAttachToFirstNode {
        /// The node created first this turn.
        first: NodeId,
    },

    /// A node is missing its name or description, so the turn cannot end.
    #[error("{kind} {id} needs a name and a description before the turn can end")]
    IncompleteNode {
        /// The first offending node.
        id: NodeId,
        /// Its kind.
        kind: NodeKind,
    },

    /// Events and scenes cannot be created without a container.
    #[error("a {0} needs a parent")]
    MissingParent(NodeKind),

    /// The active player is human.
    #[error("the active player is not an AI")]
    NotAnAiPlayer,

    /// An AI turn has already been started.
    #[error("an AI turn is already in progress")]
    AiTurnInFlight,

    /// The AI turn was not started by this session or already finished.
    #[error("no AI turn is in progress")]
    NoAiTurn,

    /// The AI turn is not waiting for review.
    #[error("the AI proposal is not ready for review")]
    NotReviewing,

    /// A saved or imported document is unusable.
    #[error("failed to load: {0}")]
    Load(String),

    /// JSON (de)serialization failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The generation service failed.
    #[error("{0}")]
    Generation(#[from] GenerationError),
}
