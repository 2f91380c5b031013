//! The AI turn: propose a move, generate content, review, commit or cancel.
//!
//! An [`AiTurn`] is started by the session, filled by a [`StoryGenerator`]
//! and handed back to the session to accept, cancel or fail. Whatever the
//! outcome, resolving the turn ends it, so an AI player never blocks the game.

use sw_core::{NodeContent, NodeId, NodeKind, PeerDirection};
use tracing::{info, warn};

use super::generator::{
    CritiqueRequest, GenerationError, GenerationResult, NodeRequest, StoryGenerator, non_empty,
};
use crate::error::{SessionError, SessionResult};
use crate::player::PlayerId;
use crate::session::Session;
use crate::strategy::{AiMove, determine_move};

/// Where an AI turn stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiTurnState {
    /// A move has been chosen; nothing generated yet.
    Proposing,
    /// Waiting on the generator.
    Generating,
    /// A proposal is waiting for a human decision.
    Reviewing(NodeContent),
    /// The proposal became this node.
    Committed(NodeId),
    /// The reviewer discarded the proposal.
    Cancelled,
    /// Generation or commit failed.
    Failed(String),
}

/// A reviewer's answer to a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Commit the proposal.
    Accept,
    /// Ask for a rewrite with this feedback.
    Regenerate(String),
    /// Drop the proposal; the turn still ends.
    Cancel,
}

/// How an AI turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiTurnOutcome {
    /// A node was added.
    Committed(NodeId),
    /// The reviewer cancelled.
    Cancelled,
    /// Something failed; the turn was consumed anyway.
    Failed(String),
}

/// One AI player's turn in progress.
#[derive(Debug, Clone)]
pub struct AiTurn {
    player: PlayerId,
    ai_move: AiMove,
    request: NodeRequest,
    state: AiTurnState,
}

impl AiTurn {
    /// The AI player taking the turn.
    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    /// The structural move chosen by the strategy.
    pub fn ai_move(&self) -> &AiMove {
        &self.ai_move
    }

    /// What the generator is asked for.
    pub fn request(&self) -> &NodeRequest {
        &self.request
    }

    /// Current state.
    pub fn state(&self) -> &AiTurnState {
        &self.state
    }

    /// The proposal under review.
    pub fn proposal(&self) -> Option<&NodeContent> {
        match &self.state {
            AiTurnState::Reviewing(content) => Some(content),
            _ => None,
        }
    }

    /// Ask the generator for a first proposal.
    ///
    /// On failure the turn is left in [`AiTurnState::Failed`]; hand it to
    /// [`Session::fail_ai_turn`] to end the turn.
    pub async fn generate<G: StoryGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> GenerationResult<&NodeContent> {
        self.state = AiTurnState::Generating;
        match generator.generate_node(&self.request).await.and_then(non_empty) {
            Ok(content) => {
                self.state = AiTurnState::Reviewing(content);
                self.proposal().ok_or(GenerationError::Empty)
            }
            Err(e) => {
                warn!(player = %self.player, error = %e, "AI generation failed");
                self.state = AiTurnState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Rewrite the proposal with reviewer feedback.
    ///
    /// If the rewrite fails the previous proposal stays under review.
    pub async fn regenerate<G: StoryGenerator + ?Sized>(
        &mut self,
        generator: &G,
        feedback: &str,
    ) -> GenerationResult<&NodeContent> {
        let Some(previous) = self.proposal().cloned() else {
            return Err(GenerationError::InvalidResponse(
                "no proposal to regenerate".into(),
            ));
        };
        let request = CritiqueRequest {
            personality: self.request.personality.clone(),
            kind: self.ai_move.kind,
            previous,
            feedback: feedback.to_string(),
        };
        match generator.regenerate_node(&request).await.and_then(non_empty) {
            Ok(content) => {
                self.state = AiTurnState::Reviewing(content);
                self.proposal().ok_or(GenerationError::Empty)
            }
            Err(e) => {
                warn!(player = %self.player, error = %e, "AI regeneration failed");
                Err(e)
            }
        }
    }
}

impl Session {
    /// Begin the active AI player's turn: pick a move with its strategy and
    /// prepare the generation request.
    pub fn start_ai_turn(&mut self) -> SessionResult<AiTurn> {
        if self.ai_in_flight {
            return Err(SessionError::AiTurnInFlight);
        }
        let player = self.active_player().ok_or(SessionError::NoPlayers)?;
        let (Some(personality), Some(strategy)) = (player.personality(), player.strategy()) else {
            return Err(SessionError::NotAnAiPlayer);
        };
        let player_id = player.id().clone();
        let personality = personality.to_string();

        let ai_move = determine_move(&self.graph, &self.history, strategy, &mut self.rng);
        let parent = ai_move
            .parent
            .as_ref()
            .and_then(|id| self.graph.node(id))
            .map(|n| n.content());
        let request = NodeRequest {
            game_seed: self.seed.clone(),
            personality,
            kind: ai_move.kind,
            parent,
            focus: self.focus.clone(),
        };

        self.ai_in_flight = true;
        info!(player = %player_id, %strategy, kind = %ai_move.kind, "AI turn started");
        Ok(AiTurn {
            player: player_id,
            ai_move,
            request,
            state: AiTurnState::Proposing,
        })
    }

    /// Commit the reviewed proposal and end the turn.
    ///
    /// If the move can no longer be applied (its parent was deleted, say)
    /// the turn ends anyway and the error is returned.
    pub fn accept_ai_turn(&mut self, turn: &mut AiTurn) -> SessionResult<NodeId> {
        self.check_owner(turn)?;
        let Some(content) = turn.proposal().cloned() else {
            return Err(SessionError::NotReviewing);
        };

        let committed = self.commit_move(&turn.player, &turn.ai_move, content);
        match &committed {
            Ok(id) => {
                info!(player = %turn.player, node = %id, "AI proposal committed");
                turn.state = AiTurnState::Committed(id.clone());
            }
            Err(e) => {
                warn!(player = %turn.player, error = %e, "AI proposal could not be committed");
                turn.state = AiTurnState::Failed(e.to_string());
            }
        }
        self.force_end_turn();
        committed
    }

    /// Discard the proposal and end the turn.
    pub fn cancel_ai_turn(&mut self, turn: &mut AiTurn) -> SessionResult<()> {
        self.check_owner(turn)?;
        turn.state = AiTurnState::Cancelled;
        info!(player = %turn.player, "AI turn cancelled");
        self.force_end_turn();
        Ok(())
    }

    /// Record a failure and end the turn.
    pub fn fail_ai_turn(&mut self, turn: &mut AiTurn, reason: impl Into<String>) -> SessionResult<()> {
        self.check_owner(turn)?;
        let reason = reason.into();
        warn!(player = %turn.player, %reason, "AI turn failed");
        turn.state = AiTurnState::Failed(reason);
        self.force_end_turn();
        Ok(())
    }

    fn check_owner(&self, turn: &AiTurn) -> SessionResult<()> {
        let active = self.active_player().map(|p| p.id());
        if !self.ai_in_flight || active != Some(&turn.player) {
            return Err(SessionError::NoAiTurn);
        }
        Ok(())
    }

    /// Apply a move through the same entry points a human uses.
    fn commit_move(
        &mut self,
        actor: &PlayerId,
        mv: &AiMove,
        content: NodeContent,
    ) -> SessionResult<NodeId> {
        match (&mv.parent, mv.kind) {
            (None, NodeKind::Period) => self.add_period(actor, content),
            (None, kind) => Err(SessionError::MissingParent(kind)),
            (Some(period), NodeKind::Period) => {
                let direction = if self.graph.peer_edge(period, PeerDirection::Right).is_none() {
                    PeerDirection::Right
                } else {
                    PeerDirection::Left
                };
                self.add_peer(actor, period, direction, content)
            }
            (Some(parent), kind) => self.add_child(actor, parent, kind, content),
        }
    }
}

/// Run a whole AI turn: start, generate, then loop on `review` until the
/// proposal is accepted or cancelled.
///
/// Generation failure ends the turn and reports [`AiTurnOutcome::Failed`].
/// A failed rewrite keeps the previous proposal and asks `review` again.
pub async fn drive_ai_turn<G, F>(
    session: &mut Session,
    generator: &G,
    mut review: F,
) -> SessionResult<AiTurnOutcome>
where
    G: StoryGenerator + ?Sized,
    F: FnMut(&AiMove, &NodeContent) -> ReviewDecision,
{
    let mut turn = session.start_ai_turn()?;
    if let Err(e) = turn.generate(generator).await {
        session.fail_ai_turn(&mut turn, e.to_string())?;
        return Ok(AiTurnOutcome::Failed(e.to_string()));
    }

    loop {
        let decision = match turn.proposal() {
            Some(proposal) => review(&turn.ai_move, proposal),
            None => ReviewDecision::Cancel,
        };
        match decision {
            ReviewDecision::Accept => {
                return Ok(match session.accept_ai_turn(&mut turn) {
                    Ok(id) => AiTurnOutcome::Committed(id),
                    Err(e) => AiTurnOutcome::Failed(e.to_string()),
                });
            }
            ReviewDecision::Regenerate(feedback) => {
                // A failed rewrite is logged; the old proposal is reviewed again.
                let _ = turn.regenerate(generator, &feedback).await;
            }
            ReviewDecision::Cancel => {
                session.cancel_ai_turn(&mut turn)?;
                return Ok(AiTurnOutcome::Cancelled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGenerator;
    use crate::config::SessionConfig;
    use crate::player::Strategy;
    use crate::seed::GameSeed;

    fn session_with_ai(strategy: Strategy) -> (Session, PlayerId, PlayerId) {
        let mut session = Session::new(SessionConfig::default().with_seed(4));
        let host = session.add_human("Ann").unwrap();
        let bot = session.add_ai(Some("Historian"), strategy);
        session.set_seed(GameSeed::new("Islands sink"));
        (session, host, bot)
    }

    /// Host adds one complete period, then hands over to the AI.
    fn ai_to_move(strategy: Strategy) -> (Session, NodeId) {
        let (mut session, host, _) = session_with_ai(strategy);
        let period = session
            .add_period(&host, NodeContent::new("Dawn", "First light"))
            .unwrap();
        session.end_turn().unwrap();
        (session, period)
    }

    #[tokio::test]
    async fn accepted_proposal_is_committed_and_ends_the_turn() {
        let (mut session, period) = ai_to_move(Strategy::Detailer);
        let generator = ScriptedGenerator::new().with_node("The Flood", "Water everywhere");

        let outcome = drive_ai_turn(&mut session, &generator, |_, _| ReviewDecision::Accept)
            .await
            .unwrap();

        let AiTurnOutcome::Committed(id) = outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        let node = session.graph().node(&id).unwrap();
        assert_eq!(node.kind, NodeKind::Event);
        assert_eq!(node.name(), "The Flood");
        assert_eq!(session.graph().parent_of(&id).unwrap().id, period);
        assert_eq!(session.active_index(), 0);
        assert!(!session.ai_turn_in_flight());
        assert_eq!(session.history().last().unwrap().added_node_ids, vec![id]);

        let request = &generator.node_requests.lock().unwrap()[0];
        assert_eq!(request.personality, "Historian");
        assert_eq!(request.parent.as_ref().unwrap().name, "Dawn");
        assert_eq!(request.game_seed.big_picture, "Islands sink");
    }

    #[tokio::test]
    async fn empty_board_gets_a_root_period() {
        let mut session = Session::new(SessionConfig::default().with_seed(1));
        session.add_ai(None, Strategy::Builder);
        let generator = ScriptedGenerator::new().with_node("Dawn", "First light");

        let outcome = drive_ai_turn(&mut session, &generator, |mv, _| {
            assert_eq!(*mv, AiMove::root());
            ReviewDecision::Accept
        })
        .await
        .unwrap();
        assert!(matches!(outcome, AiTurnOutcome::Committed(_)));
        assert_eq!(session.graph().count_of_kind(NodeKind::Period), 1);
    }

    #[tokio::test]
    async fn generation_failure_still_ends_the_turn() {
        let (mut session, _) = ai_to_move(Strategy::Balanced);
        let generator = ScriptedGenerator::new()
            .with_node_error(GenerationError::Request("connection refused".into()));
        let nodes_before = session.graph().node_count();

        let outcome = drive_ai_turn(&mut session, &generator, |_, _| ReviewDecision::Accept)
            .await
            .unwrap();

        assert!(matches!(outcome, AiTurnOutcome::Failed(msg) if msg.contains("connection refused")));
        assert_eq!(session.graph().node_count(), nodes_before);
        assert_eq!(session.active_index(), 0);
        assert!(!session.ai_turn_in_flight());
    }

    #[tokio::test]
    async fn empty_content_counts_as_failure() {
        let (mut session, _) = ai_to_move(Strategy::Balanced);
        let generator = ScriptedGenerator::new().with_node("  ", "");

        let outcome = drive_ai_turn(&mut session, &generator, |_, _| ReviewDecision::Accept)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AiTurnOutcome::Failed(GenerationError::Empty.to_string())
        );
    }

    #[tokio::test]
    async fn cancel_consumes_the_turn_without_changes() {
        let (mut session, _) = ai_to_move(Strategy::Balanced);
        let generator = ScriptedGenerator::new().with_node("The Flood", "Water");
        let nodes_before = session.graph().nodes().to_vec();

        let outcome = drive_ai_turn(&mut session, &generator, |_, _| ReviewDecision::Cancel)
            .await
            .unwrap();

        assert_eq!(outcome, AiTurnOutcome::Cancelled);
        assert_eq!(session.graph().nodes(), nodes_before.as_slice());
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn regenerate_replaces_the_proposal() {
        let (mut session, _) = ai_to_move(Strategy::Detailer);
        let generator = ScriptedGenerator::new()
            .with_node("The Flood", "Water")
            .with_node("The Great Flood", "Water, and then more water");

        let mut asked = 0;
        let outcome = drive_ai_turn(&mut session, &generator, |_, proposal| {
            asked += 1;
            if proposal.name == "The Flood" {
                ReviewDecision::Regenerate("bigger".into())
            } else {
                ReviewDecision::Accept
            }
        })
        .await
        .unwrap();

        assert_eq!(asked, 2);
        let AiTurnOutcome::Committed(id) = outcome else {
            panic!("expected a commit");
        };
        assert_eq!(session.graph().node(&id).unwrap().name(), "The Great Flood");

        let critique = &generator.critiques.lock().unwrap()[0];
        assert_eq!(critique.feedback, "bigger");
        assert_eq!(critique.previous.name, "The Flood");
        assert_eq!(critique.kind, NodeKind::Event);
    }

    #[tokio::test]
    async fn failed_rewrite_keeps_the_old_proposal() {
        let (mut session, _) = ai_to_move(Strategy::Detailer);
        let generator = ScriptedGenerator::new().with_node("The Flood", "Water");
        let mut turn = session.start_ai_turn().unwrap();
        turn.generate(&generator).await.unwrap();

        assert!(turn.regenerate(&generator, "again").await.is_err());
        assert_eq!(turn.proposal().unwrap().name, "The Flood");
        assert!(session.ai_turn_in_flight());
    }

    #[tokio::test]
    async fn commit_failure_ends_the_turn() {
        let (mut session, period) = ai_to_move(Strategy::Detailer);
        let generator = ScriptedGenerator::new().with_node("The Flood", "Water");
        let mut turn = session.start_ai_turn().unwrap();
        turn.generate(&generator).await.unwrap();

        // The parent vanishes while the proposal is under review.
        session.graph.delete_node(&period).unwrap();

        assert!(session.accept_ai_turn(&mut turn).is_err());
        assert!(matches!(turn.state(), AiTurnState::Failed(_)));
        assert_eq!(session.active_index(), 0);
        assert!(!session.ai_turn_in_flight());
    }

    #[test]
    fn only_one_ai_turn_at_a_time() {
        let (mut session, _) = ai_to_move(Strategy::Balanced);
        let _turn = session.start_ai_turn().unwrap();
        assert!(matches!(
            session.start_ai_turn(),
            Err(SessionError::AiTurnInFlight)
        ));
        assert!(matches!(session.end_turn(), Err(SessionError::AiTurnInFlight)));
    }

    #[test]
    fn humans_cannot_start_ai_turns() {
        let (mut session, _, _) = session_with_ai(Strategy::Balanced);
        assert!(matches!(
            session.start_ai_turn(),
            Err(SessionError::NotAnAiPlayer)
        ));
    }

    #[test]
    fn unreviewed_turns_cannot_be_accepted() {
        let (mut session, _) = ai_to_move(Strategy::Balanced);
        let mut turn = session.start_ai_turn().unwrap();
        assert!(matches!(
            session.accept_ai_turn(&mut turn),
            Err(SessionError::NotReviewing)
        ));
        assert!(session.ai_turn_in_flight());
        session.cancel_ai_turn(&mut turn).unwrap();
        assert!(matches!(
            session.cancel_ai_turn(&mut turn),
            Err(SessionError::NoAiTurn)
        ));
    }

    #[test]
    fn peer_moves_use_the_free_side() {
        let (mut session, period) = ai_to_move(Strategy::Builder);
        let bot = session.active_player().unwrap().id().clone();
        let mv = AiMove {
            kind: NodeKind::Period,
            parent: Some(period.clone()),
        };
        let id = session
            .commit_move(&bot, &mv, NodeContent::new("Dusk", "Last light"))
            .unwrap();
        assert_eq!(
            session.graph().peer_of(&period, PeerDirection::Right).unwrap().id,
            id
        );
    }
}
