//! AI players: the generation capability, the propose/generate/review cycle,
//! roleplay dialogue and legacy suggestions.

mod cycle;
mod generator;
mod legacy;
mod roleplay;

#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{AiTurn, AiTurnOutcome, AiTurnState, ReviewDecision, drive_ai_turn};
pub use generator::{
    CritiqueRequest, DialogueRequest, GenerationError, GenerationResult, LegacyBrief,
    LegacyRequest, LegacySuggestion, NodeBrief, NodeRequest, StoryGenerator, non_empty,
};
pub use legacy::{filter_suggestions, legacy_request};
