use serde::{Deserialize, Serialize};
use sw_core::{Edge, Graph, Node, NodeId};
use tracing::info;

use crate::error::{SessionError, SessionResult};
use crate::history::LogEntry;
use crate::player::Player;
use crate::seed::GameSeed;
use crate::session::Session;
use crate::turn::TurnState;

/// The complete save document.
///
/// Every field defaults when missing so older saves still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveFile {
    /// All nodes.
    pub nodes: Vec<Node>,
    /// All edges.
    pub edges: Vec<Edge>,
    /// Creative premise.
    pub game_seed: GameSeed,
    /// Turn order.
    pub players: Vec<Player>,
    /// Index of the active player.
    pub active_player_index: usize,
    /// Nodes the active player has created this turn.
    pub nodes_created_this_turn: u32,
    /// The first node created this turn.
    pub first_node_this_turn_id: Option<NodeId>,
    /// Node set when the turn started.
    pub nodes_at_turn_start: Vec<Node>,
    /// Every logged turn.
    pub history_log: Vec<LogEntry>,
    /// Theme hint.
    pub focus: String,
    /// Free-text legacies list.
    pub legacies: Vec<String>,
    /// Next id number to allocate.
    pub node_id_counter: u64,
}

impl SaveFile {
    /// Parse a save document.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Session {
    /// Snapshot the whole session.
    pub fn to_save_file(&self) -> SaveFile {
        SaveFile {
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            game_seed: self.seed.clone(),
            players: self.players.clone(),
            active_player_index: self.turn.active_index,
            nodes_created_this_turn: self.turn.nodes_created,
            first_node_this_turn_id: self.turn.first_node.clone(),
            nodes_at_turn_start: self.turn.nodes_at_start.clone(),
            history_log: self.history.clone(),
            focus: self.focus.clone(),
            legacies: self.legacies.clone(),
            node_id_counter: self.graph.id_counter(),
        }
    }

    /// Replace all live state with a save document.
    ///
    /// The document is fully validated first; on error nothing changes.
    /// Configuration, the RNG and override mode are kept.
    pub fn load_save_file(&mut self, save: SaveFile) -> SessionResult<()> {
        let graph = Graph::from_parts(save.nodes, save.edges, save.node_id_counter)?;

        if save.players.is_empty() {
            if save.active_player_index != 0 {
                return Err(SessionError::Load(
                    "active player index set without players".into(),
                ));
            }
        } else if save.active_player_index >= save.players.len() {
            return Err(SessionError::Load(format!(
                "active player index {} out of range for {} players",
                save.active_player_index,
                save.players.len()
            )));
        }
        for (i, player) in save.players.iter().enumerate() {
            if save.players[..i].iter().any(|p| p.id() == player.id()) {
                return Err(SessionError::Load(format!(
                    "duplicate player id {}",
                    player.id()
                )));
            }
        }

        self.graph = graph;
        self.seed = save.game_seed;
        self.players = save.players;
        self.turn = TurnState {
            active_index: save.active_player_index,
            nodes_created: save.nodes_created_this_turn,
            first_node: save.first_node_this_turn_id,
            nodes_at_start: save.nodes_at_turn_start,
        };
        self.history = save.history_log;
        self.focus = save.focus;
        self.legacies = save.legacies;
        self.ai_in_flight = false;
        info!(
            nodes = self.graph.node_count(),
            players = self.players.len(),
            "session loaded"
        );
        Ok(())
    }

    /// Save as pretty-printed JSON.
    pub fn save_json(&self) -> SessionResult<String> {
        self.to_save_file().to_json()
    }

    /// Load from JSON text. Nothing changes if the text is not a valid save.
    pub fn load_json(&mut self, json: &str) -> SessionResult<()> {
        let save = SaveFile::from_json(json)?;
        self.load_save_file(save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::player::Strategy;
    use sw_core::{NodeContent, NodeKind, PeerDirection};

    fn played_session() -> Session {
        let mut session = Session::new(SessionConfig::default());
        let host = session.add_human("Ann").unwrap();
        let bob = session.add_human("Bob").unwrap();
        session.add_ai(Some("Chaotic"), Strategy::Focuser);
        session.set_seed(GameSeed::new("Islands sink").with_banned("dragons"));
        session.set_focus("salt");
        session.add_legacy_note("The drowned bell");

        let period = session
            .add_period(&host, NodeContent::new("Dawn", "First light"))
            .unwrap();
        session
            .add_child(&host, &period, NodeKind::Event, NodeContent::new("Flood", "Water"))
            .unwrap();
        session.end_turn().unwrap();
        let dusk = session
            .add_peer(&bob, &period, PeerDirection::Right, NodeContent::new("Dusk", ""))
            .unwrap();
        session
            .connect_legacy(&bob, &period, &dusk, "The bell tolls")
            .unwrap();
        session
    }

    #[test]
    fn save_and_load_restore_everything() {
        let original = played_session();
        let json = original.save_json().unwrap();

        let mut restored = Session::new(SessionConfig::default());
        restored.load_json(&json).unwrap();

        assert_eq!(restored.to_save_file(), original.to_save_file());
        assert_eq!(restored.active_index(), 1);
        assert_eq!(restored.turn().nodes_created, 1);
        assert_eq!(restored.players()[2].strategy(), Some(Strategy::Focuser));
    }

    #[test]
    fn restored_session_keeps_allocating_fresh_ids() {
        let original = played_session();
        let mut restored = Session::new(SessionConfig::default());
        restored.load_save_file(original.to_save_file()).unwrap();

        restored.set_override(true);
        let bob = restored.players()[1].id().clone();
        restored
            .update_node(&bob, &"period-3".into(), sw_core::NodePatch::description("Embers"))
            .unwrap();
        restored.end_turn().unwrap();
        restored.end_turn().unwrap();
        let host = restored.players()[0].id().clone();
        let id = restored
            .add_period(&host, NodeContent::new("Noon", "Heat"))
            .unwrap();
        assert_eq!(id.as_str(), "period-5");
    }

    #[test]
    fn wire_shape_uses_camel_case_keys() {
        let json: serde_json::Value =
            serde_json::from_str(&played_session().save_json().unwrap()).unwrap();
        for key in [
            "nodes",
            "edges",
            "gameSeed",
            "players",
            "activePlayerIndex",
            "nodesCreatedThisTurn",
            "firstNodeThisTurnId",
            "nodesAtTurnStart",
            "historyLog",
            "focus",
            "legacies",
            "nodeIdCounter",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn missing_fields_default() {
        let mut session = Session::new(SessionConfig::default());
        session
            .load_json(r#"{"nodes":[{"id":"period-4","type":"period","position":{"x":0,"y":0},"data":{"name":"Dawn","description":"x"}}]}"#)
            .unwrap();
        assert_eq!(session.graph().node_count(), 1);
        assert!(session.legacy_notes().is_empty());
        assert_eq!(session.graph().id_counter(), 5);
    }

    #[test]
    fn malformed_documents_change_nothing() {
        let mut session = played_session();
        let before = session.to_save_file();

        assert!(session.load_json("{ not json").is_err());
        assert!(session.load_json(r#"{"nodes": 5}"#).is_err());

        let mut dangling = before.clone();
        dangling.edges.push(Edge::legacy(
            "legacy-90".into(),
            "period-1".into(),
            "scene-404".into(),
            "lost".into(),
        ));
        assert!(session.load_save_file(dangling).is_err());

        let mut bad_index = before.clone();
        bad_index.active_player_index = 9;
        assert!(matches!(
            session.load_save_file(bad_index),
            Err(SessionError::Load(_))
        ));

        assert_eq!(session.to_save_file(), before);
    }
}
