pub mod export;
pub mod import;
pub mod log;
pub mod new;
pub mod play;
pub mod status;
pub mod suggest;
pub mod tree;

use std::path::{Path, PathBuf};

use colored::Colorize;
use sw_session::{Session, SessionConfig, Strategy};

/// Global options shared by every command.
pub struct Context {
    pub file: PathBuf,
    pub seed: Option<u64>,
    pub strategy: Option<String>,
}

impl Context {
    fn config(&self) -> SessionConfig {
        match self.seed {
            Some(seed) => SessionConfig::default().with_seed(seed),
            None => SessionConfig::default(),
        }
    }

    /// The `--strategy` flag, if given. Unknown names are an error here,
    /// not a silent fallback.
    pub fn strategy(&self) -> Result<Option<Strategy>, String> {
        self.strategy.as_deref().map(parse_strategy).transpose()
    }
}

fn parse_strategy(name: &str) -> Result<Strategy, String> {
    Strategy::ALL
        .into_iter()
        .find(|s| s.label().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            format!("unknown strategy: \"{name}\". Use: balanced, builder, detailer, focuser")
        })
}

/// Load the session stored at `ctx.file`.
fn load_session(ctx: &Context) -> Result<Session, String> {
    let json = std::fs::read_to_string(&ctx.file).map_err(|e| {
        format!(
            "cannot read {}: {e} (create one with `weaver new`)",
            ctx.file.display()
        )
    })?;
    let mut session = Session::new(ctx.config());
    session
        .load_json(&json)
        .map_err(|e| format!("{}: {e}", ctx.file.display()))?;
    Ok(session)
}

fn save_session(session: &Session, path: &Path) -> Result<(), String> {
    let json = session.save_json().map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| format!("cannot write to {}: {e}", path.display()))
}

/// Player list with the active player marked, plus turn and board counts.
fn render_status(session: &Session) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {}\n", "Players".bold()));
    for (i, player) in session.players().iter().enumerate() {
        let marker = if i == session.active_index() { ">" } else { " " };
        let role = match (i, player.strategy()) {
            (0, _) => "host".to_string(),
            (_, Some(strategy)) => format!(
                "AI, {}, {strategy}",
                player.personality().unwrap_or_default()
            ),
            _ => "guest".to_string(),
        };
        out.push_str(&format!(
            "  {marker} {} {} ({role})\n",
            player.id().as_str().dimmed(),
            player.name()
        ));
    }

    let used = session.turn().nodes_created;
    let quota = match session.quota() {
        Some(limit) => format!("{used}/{limit} nodes this turn"),
        None => format!("{used} nodes this turn (override)"),
    };
    out.push_str(&format!("\n  Turn: {quota}\n"));

    let graph = session.graph();
    out.push_str(&format!(
        "  Board: {} periods, {} events, {} scenes, {} legacies\n",
        graph.count_of_kind(sw_core::NodeKind::Period),
        graph.count_of_kind(sw_core::NodeKind::Event),
        graph.count_of_kind(sw_core::NodeKind::Scene),
        graph.legacies().count(),
    ));
    if !session.seed().is_empty() {
        out.push_str(&format!("  Premise: {}\n", session.seed().big_picture));
    }
    if !session.focus().is_empty() {
        out.push_str(&format!("  Focus: {}\n", session.focus()));
    }
    out
}

/// Indented period/event/scene outline.
fn render_tree(session: &Session) -> String {
    let periods = session.graph().narrative_tree();
    if periods.is_empty() {
        return "  (no periods yet)\n".to_string();
    }
    let mut out = String::new();
    for period in &periods {
        out.push_str(&format!("  {} {}\n", period.id.as_str().dimmed(), period.name.bold()));
        for event in &period.events {
            out.push_str(&format!("    {} {}\n", event.id.as_str().dimmed(), event.name));
            for scene in &event.scenes {
                out.push_str(&format!("      {} {}\n", scene.id.as_str().dimmed(), scene.name));
            }
        }
    }
    let graph = session.graph();
    for edge in graph.legacies() {
        out.push_str(&format!(
            "  {} {} -> {}: {}\n",
            "legacy".cyan(),
            edge.source,
            edge.target,
            edge.legacy_description().unwrap_or_default()
        ));
    }
    out
}

fn render_log(session: &Session) -> String {
    if session.history().is_empty() {
        return "  (no turns logged yet)\n".to_string();
    }
    session
        .history()
        .iter()
        .map(|entry| {
            format!(
                "  {} {}\n",
                entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                entry.summary
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_are_case_insensitive() {
        assert_eq!(parse_strategy("Builder"), Ok(Strategy::Builder));
        assert_eq!(parse_strategy(" focuser "), Ok(Strategy::Focuser));
        assert!(parse_strategy("sneaky").is_err());
    }

    #[test]
    fn empty_session_renders_placeholders() {
        let session = Session::new(SessionConfig::default());
        assert!(render_tree(&session).contains("no periods"));
        assert!(render_log(&session).contains("no turns"));
    }
}
