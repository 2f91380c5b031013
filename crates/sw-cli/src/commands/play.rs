use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use sw_core::{NodeContent, NodeId, NodeKind, NodePatch, PeerDirection, Position};
use sw_session::ai::drive_ai_turn;
use sw_session::player::PERSONALITIES;
use sw_session::{
    AiMove, AiTurnOutcome, GameSeed, PlayerId, ReviewDecision, Session, StoryGenerator,
};
use tokio::runtime::Runtime;

use super::Context;
use crate::ollama::OllamaGenerator;

pub fn run(ctx: &Context) -> Result<(), String> {
    let session = super::load_session(ctx)?;
    let mut repl = Repl::new(session, ctx.file.clone(), OllamaGenerator::from_env())?;

    println!("  {} {}", "Session Weaver".bold(), ctx.file.display());
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{}> ", repl.prompt());
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match repl.process(input, review_from_stdin) {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{output}\n");
                }
                if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("q") {
                    return Ok(());
                }
            }
            Err(e) => {
                println!("{}\n", e.yellow());
            }
        }
    }

    repl.save()?;
    Ok(())
}

/// Ask the table what to do with an AI proposal.
fn review_from_stdin(mv: &AiMove, proposal: &NodeContent) -> ReviewDecision {
    let target = match &mv.parent {
        Some(parent) => format!(" ({} at {parent})", mv.kind),
        None => format!(" ({})", mv.kind),
    };
    println!("  {}{target}", "AI proposal".bold());
    println!("  {}", proposal.name.bold());
    println!("  {}", proposal.description);
    print!("  [a]ccept, [r]egenerate <feedback>, [c]ancel: ");
    if io::stdout().flush().is_err() {
        return ReviewDecision::Cancel;
    }

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => ReviewDecision::Cancel,
        Ok(_) => parse_review(&line),
    }
}

fn parse_review(line: &str) -> ReviewDecision {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word.to_lowercase().as_str() {
        "" | "a" | "accept" => ReviewDecision::Accept,
        "c" | "cancel" => ReviewDecision::Cancel,
        "r" | "regenerate" if rest.trim().is_empty() => {
            ReviewDecision::Regenerate("Try something different.".to_string())
        }
        "r" | "regenerate" => ReviewDecision::Regenerate(rest.trim().to_string()),
        _ => ReviewDecision::Regenerate(line.to_string()),
    }
}

fn parse_direction(s: &str) -> Result<PeerDirection, String> {
    PeerDirection::parse(s).ok_or_else(|| format!("expected left or right, got \"{s}\""))
}

/// Split `"<id> <text>"`.
fn id_and_text(rest: &str) -> Result<(NodeId, &str), String> {
    match rest.split_once(' ') {
        Some((id, text)) if !text.trim().is_empty() => Ok((NodeId::new(id), text.trim())),
        _ => Err("expected: <id> <text>".into()),
    }
}

fn one_id(rest: &str) -> Result<NodeId, String> {
    match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
        [id] => Ok(NodeId::new(*id)),
        _ => Err("expected: <id>".into()),
    }
}

/// The interactive table: one session, played hot-seat by whoever is active.
struct Repl<G> {
    session: Session,
    path: PathBuf,
    generator: G,
    runtime: Runtime,
}

impl<G: StoryGenerator> Repl<G> {
    fn new(session: Session, path: PathBuf, generator: G) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("failed to start async runtime: {e}"))?;
        Ok(Self {
            session,
            path,
            generator,
            runtime,
        })
    }

    fn prompt(&self) -> String {
        self.session
            .active_player()
            .map(|p| p.name().to_string())
            .unwrap_or_default()
    }

    fn save(&self) -> Result<(), String> {
        super::save_session(&self.session, &self.path)
    }

    /// The active player, who must be human for hand-made moves.
    fn actor(&self) -> Result<PlayerId, String> {
        let player = self
            .session
            .active_player()
            .ok_or("the session has no players")?;
        if player.is_ai() {
            return Err(format!(
                "{} is an AI player: type 'ai' to play their turn or 'end' to skip it",
                player.name()
            ));
        }
        Ok(player.id().clone())
    }

    fn process<F>(&mut self, input: &str, review: F) -> Result<String, String>
    where
        F: FnMut(&AiMove, &NodeContent) -> ReviewDecision,
    {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let rest = parts.get(1).map(|s| s.trim()).unwrap_or("");

        match cmd.as_str() {
            "period" => self.do_period(),
            "peer" => self.do_peer(rest),
            "event" => self.do_child(rest, NodeKind::Event),
            "scene" => self.do_child(rest, NodeKind::Scene),
            "name" => self.do_edit(rest, NodePatch::name),
            "describe" => self.do_edit(rest, NodePatch::description),
            "move" => self.do_move(rest),
            "legacy" => self.do_legacy(rest),
            "unlegacy" => self.do_unlegacy(rest),
            "delete" => self.do_delete(rest),
            "unpeer" => self.do_unpeer(rest),
            "premise" => self.do_premise(rest),
            "focus" => self.do_focus(rest),
            "override" => self.do_override(rest),
            "end" => self.do_end(),
            "ai" => self.do_ai(review),
            "roleplay" => self.do_roleplay(rest),
            "legacies" => self.do_suggest_legacies(),
            "tree" => Ok(super::render_tree(&self.session).trim_end().to_string()),
            "log" => Ok(super::render_log(&self.session).trim_end().to_string()),
            "status" => Ok(super::render_status(&self.session).trim_end().to_string()),
            "save" => {
                self.save()?;
                Ok(format!("Saved to {}", self.path.display()))
            }
            "help" => Ok(HELP.trim_end().to_string()),
            "quit" | "q" => {
                self.save()?;
                Ok("Goodbye!".to_string())
            }
            _ => Err(format!("unknown command: \"{cmd}\". Type 'help' for commands.")),
        }
    }

    fn created(&self, id: &NodeId) -> String {
        format!("Added {id}. Name it with 'name {id} <text>' and 'describe {id} <text>'.")
    }

    fn do_period(&mut self) -> Result<String, String> {
        let actor = self.actor()?;
        let id = self
            .session
            .add_period(&actor, NodeContent::placeholder(NodeKind::Period))
            .map_err(|e| e.to_string())?;
        Ok(self.created(&id))
    }

    fn do_peer(&mut self, rest: &str) -> Result<String, String> {
        let actor = self.actor()?;
        let (from, direction) = match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [from, direction] => (NodeId::new(*from), parse_direction(direction)?),
            _ => return Err("usage: peer <period-id> left|right".into()),
        };
        let id = self
            .session
            .add_peer(
                &actor,
                &from,
                direction,
                NodeContent::placeholder(NodeKind::Period),
            )
            .map_err(|e| e.to_string())?;
        Ok(self.created(&id))
    }

    fn do_child(&mut self, rest: &str, kind: NodeKind) -> Result<String, String> {
        let actor = self.actor()?;
        let parent = one_id(rest).map_err(|_| {
            let container = if kind == NodeKind::Event { "period" } else { "event" };
            format!("usage: {kind} <{container}-id>")
        })?;
        let id = self
            .session
            .add_child(&actor, &parent, kind, NodeContent::placeholder(kind))
            .map_err(|e| e.to_string())?;
        Ok(self.created(&id))
    }

    fn do_edit(&mut self, rest: &str, patch: fn(String) -> NodePatch) -> Result<String, String> {
        let actor = self.actor()?;
        let (id, text) = id_and_text(rest)?;
        self.session
            .update_node(&actor, &id, patch(text.to_string()))
            .map_err(|e| e.to_string())?;
        Ok(format!("Updated {id}."))
    }

    fn do_move(&mut self, rest: &str) -> Result<String, String> {
        let usage = || "usage: move <id> <x> <y>".to_string();
        let (id, x, y) = match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [id, x, y] => (
                NodeId::new(*id),
                x.parse::<f64>().map_err(|_| usage())?,
                y.parse::<f64>().map_err(|_| usage())?,
            ),
            _ => return Err(usage()),
        };
        self.session
            .move_node(&id, Position::new(x, y))
            .map_err(|e| e.to_string())?;
        Ok(format!("Moved {id}."))
    }

    fn do_legacy(&mut self, rest: &str) -> Result<String, String> {
        let actor = self.actor()?;
        let (source, rest) = rest
            .split_once(' ')
            .ok_or("usage: legacy <source-id> <target-id> <text>")?;
        let (target, text) = id_and_text(rest.trim())?;
        let id = self
            .session
            .connect_legacy(&actor, &NodeId::new(source), &target, text)
            .map_err(|e| e.to_string())?;
        Ok(format!("Added {id}."))
    }

    fn do_unlegacy(&mut self, rest: &str) -> Result<String, String> {
        let actor = self.actor()?;
        let id = one_id(rest).map_err(|_| "usage: unlegacy <legacy-id>".to_string())?;
        let id = sw_core::EdgeId::new(id.as_str());
        self.session
            .remove_legacy(&actor, &id)
            .map_err(|e| e.to_string())?;
        Ok(format!("Removed {id}."))
    }

    fn do_delete(&mut self, rest: &str) -> Result<String, String> {
        let actor = self.actor()?;
        let id = one_id(rest).map_err(|_| "usage: delete <id>".to_string())?;
        let node = self
            .session
            .delete_node(&actor, &id)
            .map_err(|e| e.to_string())?;
        Ok(format!("Deleted {} \"{}\".", node.id, node.name()))
    }

    fn do_unpeer(&mut self, rest: &str) -> Result<String, String> {
        let actor = self.actor()?;
        let (id, direction) = match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
            [id, direction] => (NodeId::new(*id), parse_direction(direction)?),
            _ => return Err("usage: unpeer <period-id> left|right".into()),
        };
        self.session
            .disconnect_peer(&actor, &id, direction)
            .map_err(|e| e.to_string())?;
        Ok(format!("Disconnected {id} on the {direction}."))
    }

    fn do_premise(&mut self, rest: &str) -> Result<String, String> {
        if rest.is_empty() {
            return Ok(format!("Premise: {}", self.session.seed().big_picture));
        }
        let seed = GameSeed {
            big_picture: rest.to_string(),
            ..self.session.seed().clone()
        };
        self.session.set_seed(seed);
        Ok("Premise updated.".to_string())
    }

    fn do_focus(&mut self, rest: &str) -> Result<String, String> {
        self.session.set_focus(rest);
        if rest.is_empty() {
            Ok("Focus cleared.".to_string())
        } else {
            Ok(format!("Focus: {rest}"))
        }
    }

    fn do_override(&mut self, rest: &str) -> Result<String, String> {
        let enabled = match rest.to_lowercase().as_str() {
            "on" => true,
            "off" => false,
            _ => return Err("usage: override on|off".into()),
        };
        self.session.set_override(enabled);
        Ok(match (enabled, self.session.override_active()) {
            (false, _) => "Override off.".to_string(),
            (true, true) => "Override on: no turn limits for the host.".to_string(),
            (true, false) => "Override on; it applies while the host is active.".to_string(),
        })
    }

    fn do_end(&mut self) -> Result<String, String> {
        let entry = self.session.end_turn().map_err(|e| e.to_string())?;
        let mut out = match entry {
            Some(entry) => entry.summary,
            None => "Turn passed.".to_string(),
        };
        out.push_str(&format!("\nNext up: {}", self.prompt()));
        Ok(out)
    }

    fn do_ai<F>(&mut self, review: F) -> Result<String, String>
    where
        F: FnMut(&AiMove, &NodeContent) -> ReviewDecision,
    {
        let name = self.prompt();
        let outcome = self
            .runtime
            .block_on(drive_ai_turn(&mut self.session, &self.generator, review))
            .map_err(|e| e.to_string())?;
        let mut out = match outcome {
            AiTurnOutcome::Committed(id) => {
                let title = self.session.graph().node(&id).map_or("", |n| n.name());
                format!("{name} added {id} \"{title}\".")
            }
            AiTurnOutcome::Cancelled => format!("{name}'s proposal was discarded."),
            AiTurnOutcome::Failed(reason) => format!("{name}'s turn failed: {reason}"),
        };
        out.push_str(&format!("\nNext up: {}", self.prompt()));
        Ok(out)
    }

    fn do_roleplay(&mut self, rest: &str) -> Result<String, String> {
        let (scene, message) =
            id_and_text(rest).map_err(|_| "usage: roleplay <scene-id> <text>".to_string())?;
        let personality = self
            .session
            .players()
            .iter()
            .find_map(|p| p.personality())
            .unwrap_or(PERSONALITIES[0])
            .to_string();
        let reply = self
            .runtime
            .block_on(
                self.session
                    .roleplay_turn(&self.generator, &scene, &personality, message),
            )
            .map_err(|e| e.to_string())?;
        Ok(format!("{}: {reply}", personality.bold()))
    }

    fn do_suggest_legacies(&mut self) -> Result<String, String> {
        let suggestions = self
            .runtime
            .block_on(self.session.suggest_legacies(&self.generator))
            .map_err(|e| e.to_string())?;
        if suggestions.is_empty() {
            return Ok("No legacy suggestions.".to_string());
        }
        Ok(suggestions
            .iter()
            .map(|s| format!("  legacy {} {} {}", s.source, s.target, s.reason))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

const HELP: &str = "\
  Building (active player only)
    period                         start a new period
    peer <period-id> left|right    add a period beside another
    event <period-id>              add an event to a period
    scene <event-id>               add a scene to an event
    name <id> <text>               rename a node
    describe <id> <text>           describe a node
    legacy <src> <dst> <text>      connect two nodes with a legacy
    unlegacy <legacy-id>           remove a legacy
    delete <id>                    delete a node
    unpeer <period-id> left|right  break a peer link
    move <id> <x> <y>              move a node on the board

  Turns
    end                            end the current turn
    ai                             play the active AI player's turn
    override on|off                lift the host's turn limits

  Story
    premise [text]                 show or set the big picture
    focus [text]                   set or clear the focus
    roleplay <scene-id> <text>     talk in character inside a scene
    legacies                       ask for legacy ideas

  Session
    tree | log | status            show the board, the log, the players
    save                           write the save file
    quit                           save and exit
";

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sw_session::ai::{
        CritiqueRequest, DialogueRequest, GenerationResult, LegacyRequest, LegacySuggestion,
        NodeRequest,
    };
    use sw_session::{SessionConfig, Strategy};
    use tempfile::TempDir;

    /// Always writes the same node and echoes dialogue.
    struct Canned;

    #[async_trait]
    impl StoryGenerator for Canned {
        async fn generate_node(&self, _: &NodeRequest) -> GenerationResult<NodeContent> {
            Ok(NodeContent::new("The Drowning", "Tides rise over the lowlands."))
        }

        async fn regenerate_node(&self, _: &CritiqueRequest) -> GenerationResult<NodeContent> {
            Ok(NodeContent::new("The Long Tide", "Slower, stranger."))
        }

        async fn dialogue_reply(&self, request: &DialogueRequest) -> GenerationResult<String> {
            Ok(format!("In {} I hear you.", request.scene.name))
        }

        async fn suggest_legacies(
            &self,
            _: &LegacyRequest,
        ) -> GenerationResult<Vec<LegacySuggestion>> {
            Ok(Vec::new())
        }
    }

    fn accept(_: &AiMove, _: &NodeContent) -> ReviewDecision {
        ReviewDecision::Accept
    }

    fn repl(dir: &TempDir) -> Repl<Canned> {
        let mut session = Session::new(SessionConfig::default().with_seed(7));
        session.add_human("Ann").unwrap();
        session.add_ai(Some("Historian"), Strategy::Detailer);
        Repl::new(session, dir.path().join("session.json"), Canned).unwrap()
    }

    fn run(repl: &mut Repl<Canned>, input: &str) -> Result<String, String> {
        repl.process(input, accept)
    }

    #[test]
    fn host_builds_and_ends_turn() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);

        assert!(run(&mut repl, "period").unwrap().contains("period-1"));
        run(&mut repl, "name period-1 Dawn").unwrap();
        run(&mut repl, "describe period-1 First light").unwrap();
        run(&mut repl, "event period-1").unwrap();
        run(&mut repl, "name event-2 Flood").unwrap();
        run(&mut repl, "describe event-2 Water everywhere").unwrap();

        let out = run(&mut repl, "end").unwrap();
        assert!(out.contains("Ann added: Period \"Dawn\""));
        assert!(out.contains("Next up: AI Player 1"));
    }

    #[test]
    fn incomplete_nodes_block_the_turn() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        run(&mut repl, "period").unwrap();
        let err = run(&mut repl, "end").unwrap_err();
        assert!(err.contains("period-1"));
    }

    #[test]
    fn ai_turn_commits_the_proposal() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        run(&mut repl, "period").unwrap();
        run(&mut repl, "name period-1 Dawn").unwrap();
        run(&mut repl, "describe period-1 First light").unwrap();
        run(&mut repl, "event period-1").unwrap();
        run(&mut repl, "name event-2 Flood").unwrap();
        run(&mut repl, "describe event-2 Water").unwrap();
        run(&mut repl, "end").unwrap();

        assert!(run(&mut repl, "period").unwrap_err().contains("AI player"));
        let out = run(&mut repl, "ai").unwrap();
        assert!(out.contains("added scene-3 \"The Drowning\""), "{out}");
        assert!(out.contains("Next up: Ann"));
    }

    #[test]
    fn roleplay_answers_in_the_scene() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        run(&mut repl, "period").unwrap();
        run(&mut repl, "event period-1").unwrap();
        run(&mut repl, "override on").unwrap();
        run(&mut repl, "scene event-2").unwrap();
        let out = run(&mut repl, "roleplay scene-3 Hello?").unwrap();
        assert!(out.contains("In New Scene I hear you."));
    }

    #[test]
    fn legacies_and_peers_are_managed() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        run(&mut repl, "override on").unwrap();
        run(&mut repl, "period").unwrap();
        run(&mut repl, "peer period-1 right").unwrap();
        assert!(run(&mut repl, "legacy period-1 period-2 The bell").unwrap().contains("legacy-3"));
        run(&mut repl, "unlegacy legacy-3").unwrap();
        run(&mut repl, "unpeer period-1 right").unwrap();
        assert!(run(&mut repl, "unpeer period-1 right").is_err());
        assert!(run(&mut repl, "peer period-1 up").is_err());
    }

    #[test]
    fn save_writes_the_file() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        run(&mut repl, "period").unwrap();
        run(&mut repl, "save").unwrap();
        let json = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
        assert!(json.contains("period-1"));
    }

    #[test]
    fn unknown_commands_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut repl = repl(&dir);
        assert!(run(&mut repl, "dance").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn review_answers_parse() {
        assert_eq!(parse_review("\n"), ReviewDecision::Accept);
        assert_eq!(parse_review("c"), ReviewDecision::Cancel);
        assert_eq!(
            parse_review("r darker please"),
            ReviewDecision::Regenerate("darker please".into())
        );
        assert_eq!(
            parse_review("regenerate"),
            ReviewDecision::Regenerate("Try something different.".into())
        );
    }
}
