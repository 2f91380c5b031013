//! Turn-based play on top of the narrative graph.
//!
//! A [`Session`] owns the graph, the player roster, the game seed and the
//! history log. It gates every structural change behind the turn rules
//! (active player only, per-turn quota, the host's first-node constraint) and
//! drives AI players through strategy selection, content generation and
//! review. Sessions persist as a single JSON save document; the narrative
//! alone can be exported as a history document or as Markdown.

pub mod ai;
pub mod config;
pub mod error;
pub mod history;
pub mod persist;
pub mod player;
pub mod seed;
pub mod session;
pub mod strategy;
pub mod turn;

pub use ai::{
    AiTurn, AiTurnOutcome, AiTurnState, GenerationError, ReviewDecision, StoryGenerator,
};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use history::LogEntry;
pub use persist::{HistoryDocument, SaveFile};
pub use player::{Player, PlayerId, Strategy};
pub use seed::GameSeed;
pub use session::{Narrative, Session};
pub use strategy::{AiMove, MovePlan};
