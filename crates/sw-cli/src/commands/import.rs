use std::path::Path;

use colored::Colorize;
use sw_session::HistoryDocument;

use super::Context;

pub fn run(ctx: &Context, path: &Path) -> Result<(), String> {
    let mut session = super::load_session(ctx)?;
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let document =
        HistoryDocument::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?;
    session
        .import_history(document)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    super::save_session(&session, &ctx.file)?;
    println!(
        "  {} {} nodes from {}",
        "Imported".green().bold(),
        session.graph().node_count(),
        path.display()
    );
    Ok(())
}
