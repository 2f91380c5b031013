//! Players and AI strategies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Personality given to AI players that were not assigned one.
pub const DEFAULT_PERSONALITY: &str = "Neutral";

/// Personalities offered when configuring an AI player or a roleplay scene.
pub const PERSONALITIES: [&str; 5] = ["Creative", "Logical", "Chaotic", "Historian", "Pragmatist"];

/// Identifier of a player, formatted `player-{n}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Wrap an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structural heuristic an AI player uses to pick where to add content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    /// Fill gaps in the hierarchy first, then spread out.
    #[default]
    Balanced,
    /// Grow the timeline: peer periods and events.
    Builder,
    /// Zoom in: scenes under events.
    Detailer,
    /// Keep building on whatever was added last.
    Focuser,
}

impl Strategy {
    /// All strategies, in menu order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Balanced,
        Strategy::Builder,
        Strategy::Detailer,
        Strategy::Focuser,
    ];

    /// Parse a strategy name. Unknown names fall back to [`Strategy::Balanced`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "builder" => Self::Builder,
            "detailer" => Self::Detailer,
            "focuser" => Self::Focuser,
            _ => Self::Balanced,
        }
    }

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Builder => "Builder",
            Self::Detailer => "Detailer",
            Self::Focuser => "Focuser",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Strategy {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Strategy> for String {
    fn from(s: Strategy) -> Self {
        s.label().to_string()
    }
}

/// A participant in the turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PlayerRecord", into = "PlayerRecord")]
pub enum Player {
    /// Someone at the table.
    Human {
        /// Player id.
        id: PlayerId,
        /// Display name.
        name: String,
    },
    /// A player whose moves are chosen by a strategy and written by a generator.
    Ai {
        /// Player id.
        id: PlayerId,
        /// Display name.
        name: String,
        /// Style label passed to the generator.
        personality: String,
        /// Move heuristic.
        strategy: Strategy,
    },
}

impl Player {
    /// A human player.
    pub fn human(id: PlayerId, name: impl Into<String>) -> Self {
        Self::Human {
            id,
            name: name.into(),
        }
    }

    /// An AI player.
    pub fn ai(
        id: PlayerId,
        name: impl Into<String>,
        personality: impl Into<String>,
        strategy: Strategy,
    ) -> Self {
        Self::Ai {
            id,
            name: name.into(),
            personality: personality.into(),
            strategy,
        }
    }

    /// Player id.
    pub fn id(&self) -> &PlayerId {
        match self {
            Self::Human { id, .. } | Self::Ai { id, .. } => id,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Human { name, .. } | Self::Ai { name, .. } => name,
        }
    }

    /// Whether moves are chosen automatically.
    pub fn is_ai(&self) -> bool {
        matches!(self, Self::Ai { .. })
    }

    /// The AI's personality.
    pub fn personality(&self) -> Option<&str> {
        match self {
            Self::Ai { personality, .. } => Some(personality),
            Self::Human { .. } => None,
        }
    }

    /// The AI's strategy.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Ai { strategy, .. } => Some(*strategy),
            Self::Human { .. } => None,
        }
    }
}

/// Wire shape: `{id, name, isAI?, personality?, strategy?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlayerRecord {
    id: PlayerId,
    #[serde(default)]
    name: String,
    #[serde(rename = "isAI", default, skip_serializing_if = "std::ops::Not::not")]
    is_ai: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    personality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strategy: Option<Strategy>,
}

impl From<PlayerRecord> for Player {
    fn from(record: PlayerRecord) -> Self {
        if record.is_ai {
            Self::Ai {
                id: record.id,
                name: record.name,
                personality: record
                    .personality
                    .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string()),
                strategy: record.strategy.unwrap_or_default(),
            }
        } else {
            Self::Human {
                id: record.id,
                name: record.name,
            }
        }
    }
}

impl From<Player> for PlayerRecord {
    fn from(player: Player) -> Self {
        match player {
            Player::Human { id, name } => Self {
                id,
                name,
                is_ai: false,
                personality: None,
                strategy: None,
            },
            Player::Ai {
                id,
                name,
                personality,
                strategy,
            } => Self {
                id,
                name,
                is_ai: true,
                personality: Some(personality),
                strategy: Some(strategy),
            },
        }
    }
}
