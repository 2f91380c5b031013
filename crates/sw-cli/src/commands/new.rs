use colored::Colorize;
use sw_session::{GameSeed, Session, Strategy};

use super::Context;

pub fn run(
    ctx: &Context,
    players: &str,
    ai: usize,
    premise: Option<&str>,
    force: bool,
) -> Result<(), String> {
    if ctx.file.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            ctx.file.display()
        ));
    }
    let strategy = ctx.strategy()?.unwrap_or_default();

    let mut session = Session::new(ctx.config());
    for name in players.split(',').filter(|n| !n.trim().is_empty()) {
        session.add_human(name).map_err(|e| e.to_string())?;
    }
    if session.players().is_empty() {
        return Err("at least one human player is needed to host".into());
    }
    for _ in 0..ai {
        session.add_ai(None, strategy);
    }
    if let Some(premise) = premise {
        session.set_seed(GameSeed::new(premise));
    }

    super::save_session(&session, &ctx.file)?;
    println!(
        "  {} session {} with {} players",
        "Created".green().bold(),
        ctx.file.display(),
        session.players().len()
    );
    if ai > 0 && strategy != Strategy::Balanced {
        println!("  AI strategy: {strategy}");
    }
    Ok(())
}
