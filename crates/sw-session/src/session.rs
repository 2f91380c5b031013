//! Session management.
//!
//! `Session` owns the narrative graph and everything around it: the player
//! roster, the game seed, the history log, the free-text focus and legacies
//! list, and the active turn. Structural changes go through the session so
//! the turn rules are enforced: only the active player may act, each turn has
//! a node quota, and the host's later nodes must hang under the turn's first.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use sw_core::{
    EdgeId, Graph, NarrativePeriod, Node, NodeContent, NodeId, NodeKind, NodePatch, PEER_OFFSET_X,
    PeerDirection, Position,
};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::history::LogEntry;
use crate::player::{DEFAULT_PERSONALITY, Player, PlayerId, Strategy};
use crate::seed::GameSeed;
use crate::turn::{CreationDenied, Placement, TurnState};

/// Where the first root period lands on an empty board.
const ORIGIN: Position = Position { x: 100.0, y: 100.0 };

/// Everything a story generator needs to know about the story so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    /// Creative premise.
    pub game_seed: GameSeed,
    /// Current theme hint.
    pub focus: String,
    /// The nested period/event/scene tree.
    pub periods: Vec<NarrativePeriod>,
    /// Every turn so far.
    pub history_log: Vec<LogEntry>,
}

/// A game in progress.
#[derive(Debug)]
pub struct Session {
    pub(crate) graph: Graph,
    pub(crate) players: Vec<Player>,
    pub(crate) seed: GameSeed,
    pub(crate) history: Vec<LogEntry>,
    pub(crate) focus: String,
    pub(crate) legacies: Vec<String>,
    pub(crate) turn: TurnState,
    pub(crate) override_mode: bool,
    pub(crate) ai_in_flight: bool,
    pub(crate) config: SessionConfig,
    pub(crate) rng: StdRng,
}

impl Session {
    /// An empty session with no players.
    pub fn new(config: SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            graph: Graph::new(),
            players: Vec::new(),
            seed: GameSeed::default(),
            history: Vec::new(),
            focus: String::new(),
            legacies: Vec::new(),
            turn: TurnState::default(),
            override_mode: false,
            ai_in_flight: false,
            config,
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The narrative graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Players in turn order. The first is the host.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Look up a player.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    /// The player whose turn it is.
    pub fn active_player(&self) -> Option<&Player> {
        self.players.get(self.turn.active_index)
    }

    /// Index of the active player.
    pub fn active_index(&self) -> usize {
        self.turn.active_index
    }

    /// Whether the host is the active player.
    pub fn is_host_turn(&self) -> bool {
        self.turn.is_host()
    }

    /// Current turn bookkeeping.
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// The history log, oldest first.
    pub fn history(&self) -> &[LogEntry] {
        &self.history
    }

    /// The creative premise.
    pub fn seed(&self) -> &GameSeed {
        &self.seed
    }

    /// The theme hint for AI players.
    pub fn focus(&self) -> &str {
        &self.focus
    }

    /// The free-text legacies list.
    pub fn legacy_notes(&self) -> &[String] {
        &self.legacies
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether an AI turn has been started and not yet resolved.
    pub fn ai_turn_in_flight(&self) -> bool {
        self.ai_in_flight
    }

    /// Whether override mode has been switched on.
    pub fn override_requested(&self) -> bool {
        self.override_mode
    }

    /// Whether override mode applies right now (host's turn only).
    pub fn override_active(&self) -> bool {
        self.override_mode && self.is_host_turn()
    }

    /// Nodes the active player may create this turn, `None` when unlimited.
    pub fn quota(&self) -> Option<u32> {
        if self.override_active() {
            None
        } else if self.is_host_turn() {
            Some(self.config.host_quota)
        } else {
            Some(self.config.guest_quota)
        }
    }

    /// Seed, focus, tree and log bundled for generators and exports.
    pub fn narrative(&self) -> Narrative {
        Narrative {
            game_seed: self.seed.clone(),
            focus: self.focus.clone(),
            periods: self.graph.narrative_tree(),
            history_log: self.history.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    /// Add a human player at the end of the turn order.
    pub fn add_human(&mut self, name: &str) -> SessionResult<PlayerId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyPlayerName);
        }
        let id = self.next_player_id();
        self.players.push(Player::human(id.clone(), name));
        info!(player = %id, name, "player joined");
        Ok(id)
    }

    /// Add an AI player named `AI Player N`.
    pub fn add_ai(&mut self, personality: Option<&str>, strategy: Strategy) -> PlayerId {
        let id = self.next_player_id();
        let number = self.players.iter().filter(|p| p.is_ai()).count() + 1;
        let personality = personality
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERSONALITY);
        self.players.push(Player::ai(
            id.clone(),
            format!("AI Player {number}"),
            personality,
            strategy,
        ));
        info!(player = %id, %strategy, "AI player joined");
        id
    }

    /// Remove a player. The active index is adjusted so it stays valid; if
    /// the active player leaves, the next player starts a fresh turn.
    pub fn remove_player(&mut self, id: &PlayerId) -> SessionResult<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| SessionError::UnknownPlayer(id.clone()))?;
        if self.players.len() == 1 {
            return Err(SessionError::LastPlayer);
        }

        let removed = self.players.remove(index);
        let active = self.turn.active_index;
        if index < active {
            self.turn.active_index = active - 1;
        } else if index == active {
            let next = if active >= self.players.len() { 0 } else { active };
            self.turn = TurnState::starting(next, &self.graph);
            self.ai_in_flight = false;
        }
        info!(player = %id, "player left");
        Ok(removed)
    }

    fn next_player_id(&self) -> PlayerId {
        let highest = self
            .players
            .iter()
            .map(Player::id)
            .chain(self.history.iter().map(|e| &e.player_id))
            .filter_map(|id| id.as_str().strip_prefix("player-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        PlayerId(format!("player-{}", highest + 1))
    }

    // -----------------------------------------------------------------------
    // Shared context (not turn-gated)
    // -----------------------------------------------------------------------

    /// Replace the game seed.
    pub fn set_seed(&mut self, seed: GameSeed) {
        self.seed = seed;
    }

    /// Replace the focus.
    pub fn set_focus(&mut self, focus: impl Into<String>) {
        self.focus = focus.into();
    }

    /// Append to the legacies list. Blank entries are ignored.
    pub fn add_legacy_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !note.trim().is_empty() {
            self.legacies.push(note.trim().to_string());
        }
    }

    /// Remove an entry from the legacies list.
    pub fn remove_legacy_note(&mut self, index: usize) -> Option<String> {
        (index < self.legacies.len()).then(|| self.legacies.remove(index))
    }

    /// Switch override mode. It only takes effect on the host's turns.
    pub fn set_override(&mut self, enabled: bool) {
        self.override_mode = enabled;
        info!(enabled, "override mode");
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    /// Start a new free-standing period.
    pub fn add_period(&mut self, actor: &PlayerId, content: NodeContent) -> SessionResult<NodeId> {
        self.authorize_creation(actor, Placement::Root)?;
        let position = self.root_position();
        let id = self.graph.create_node(NodeKind::Period, position, content);
        self.turn.record_creation(&id);
        Ok(id)
    }

    /// Add a period beside `from`.
    pub fn add_peer(
        &mut self,
        actor: &PlayerId,
        from: &NodeId,
        direction: PeerDirection,
        content: NodeContent,
    ) -> SessionResult<NodeId> {
        self.authorize_creation(actor, Placement::Peer(from))?;
        let (id, _) = self.graph.create_peer(from, direction, content)?;
        self.turn.record_creation(&id);
        Ok(id)
    }

    /// Add an event under a period or a scene under an event.
    pub fn add_child(
        &mut self,
        actor: &PlayerId,
        parent: &NodeId,
        kind: NodeKind,
        content: NodeContent,
    ) -> SessionResult<NodeId> {
        self.authorize_creation(actor, Placement::Child(parent))?;
        let (id, _) = self.graph.create_child(parent, kind, content)?;
        self.turn.record_creation(&id);
        Ok(id)
    }

    /// Right of every node on the board, level with the origin.
    fn root_position(&self) -> Position {
        self.graph
            .nodes()
            .iter()
            .map(|n| n.position.x)
            .reduce(f64::max)
            .map_or(ORIGIN, |x| Position::new(x + PEER_OFFSET_X, ORIGIN.y))
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Merge a patch into a node.
    pub fn update_node(
        &mut self,
        actor: &PlayerId,
        id: &NodeId,
        patch: NodePatch,
    ) -> SessionResult<()> {
        self.ensure_active(actor)?;
        self.graph.update_node(id, patch)?;
        Ok(())
    }

    /// Move a node on the board. Layout is not turn-gated.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> SessionResult<()> {
        self.graph.move_node(id, position)?;
        Ok(())
    }

    /// Delete a node and the edges touching it. Children are left orphaned.
    pub fn delete_node(&mut self, actor: &PlayerId, id: &NodeId) -> SessionResult<Node> {
        self.ensure_active(actor)?;
        Ok(self.graph.delete_node(id)?)
    }

    /// Remove the peer edge on one side of a period.
    pub fn disconnect_peer(
        &mut self,
        actor: &PlayerId,
        id: &NodeId,
        direction: PeerDirection,
    ) -> SessionResult<()> {
        self.ensure_active(actor)?;
        self.graph.disconnect_peer(id, direction)?;
        Ok(())
    }

    /// Link two nodes with a legacy.
    pub fn connect_legacy(
        &mut self,
        actor: &PlayerId,
        source: &NodeId,
        target: &NodeId,
        description: impl Into<String>,
    ) -> SessionResult<EdgeId> {
        self.ensure_active(actor)?;
        Ok(self.graph.connect_legacy(source, target, description)?)
    }

    /// Reword a legacy.
    pub fn update_legacy(
        &mut self,
        actor: &PlayerId,
        id: &EdgeId,
        description: impl Into<String>,
    ) -> SessionResult<()> {
        self.ensure_active(actor)?;
        self.graph.update_legacy(id, description)?;
        Ok(())
    }

    /// Remove a legacy.
    pub fn remove_legacy(&mut self, actor: &PlayerId, id: &EdgeId) -> SessionResult<()> {
        self.ensure_active(actor)?;
        self.graph.remove_legacy(id)?;
        Ok(())
    }

    /// Edit a node without turn checks. Used for roleplay transcripts.
    pub(crate) fn patch_node(&mut self, id: &NodeId, patch: NodePatch) -> SessionResult<()> {
        self.graph.update_node(id, patch)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Turns
    // -----------------------------------------------------------------------

    /// End the active player's turn.
    ///
    /// Every node must have a name and a description first; otherwise the
    /// first incomplete node is reported and nothing changes. Returns the
    /// log entry written for the turn, if anything was added.
    pub fn end_turn(&mut self) -> SessionResult<Option<LogEntry>> {
        if self.players.is_empty() {
            return Err(SessionError::NoPlayers);
        }
        if self.ai_in_flight {
            return Err(SessionError::AiTurnInFlight);
        }
        if let Some(node) = self.graph.first_incomplete() {
            warn!(node = %node.id, "turn end rejected: incomplete node");
            return Err(SessionError::IncompleteNode {
                id: node.id.clone(),
                kind: node.kind,
            });
        }
        Ok(self.finish_turn())
    }

    /// End the turn without completeness checks, so an AI turn never stalls.
    pub(crate) fn force_end_turn(&mut self) -> Option<LogEntry> {
        if let Some(node) = self.graph.first_incomplete() {
            warn!(node = %node.id, "ending turn with an incomplete node");
        }
        self.ai_in_flight = false;
        self.finish_turn()
    }

    fn finish_turn(&mut self) -> Option<LogEntry> {
        let entry = self.active_player().and_then(|player| {
            let added = self.turn.added_since_start(&self.graph);
            (!added.is_empty()).then(|| {
                LogEntry::new(
                    player.id().clone(),
                    player.name(),
                    &added,
                    self.config.summary_excerpt_len,
                )
            })
        });
        if let Some(entry) = &entry {
            info!(player = %entry.player_id, summary = %entry.summary, "turn logged");
            self.history.push(entry.clone());
        }

        let next = (self.turn.active_index + 1) % self.players.len().max(1);
        self.turn = TurnState::starting(next, &self.graph);
        info!(active = next, "turn advanced");
        entry
    }

    /// Start over with an empty board, keeping players and seed.
    pub fn reset(&mut self) {
        self.graph = Graph::new();
        self.history.clear();
        self.focus.clear();
        self.legacies.clear();
        self.override_mode = false;
        self.ai_in_flight = false;
        self.turn = TurnState::starting(0, &self.graph);
        info!("session reset");
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    pub(crate) fn ensure_active(&self, actor: &PlayerId) -> SessionResult<()> {
        let active = self.active_player().ok_or(SessionError::NoPlayers)?;
        if self.player(actor).is_none() {
            return Err(SessionError::UnknownPlayer(actor.clone()));
        }
        if active.id() != actor {
            warn!(%actor, active = %active.id(), "action out of turn");
            return Err(SessionError::NotYourTurn(actor.clone()));
        }
        Ok(())
    }

    fn authorize_creation(&self, actor: &PlayerId, placement: Placement<'_>) -> SessionResult<()> {
        self.ensure_active(actor)?;
        self.turn
            .check_creation(self.quota(), placement)
            .map_err(|denied| {
                warn!(%actor, ?denied, "creation rejected");
                match denied {
                    CreationDenied::Quota { limit } => SessionError::QuotaExceeded { limit },
                    CreationDenied::NotUnderFirst { first } => {
                        SessionError::MustAttachToFirstNode { first }
                    }
                }
            })?;
        debug!(%actor, ?placement, "creation allowed");
        Ok(())
    }
}
