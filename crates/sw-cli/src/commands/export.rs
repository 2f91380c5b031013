use std::path::Path;

use super::Context;

pub fn run(ctx: &Context, format: &str, output: Option<&Path>) -> Result<(), String> {
    let session = super::load_session(ctx)?;

    let content = match format {
        "json" => session.save_json().map_err(|e| e.to_string())?,
        "history" => session
            .export_history()
            .to_json()
            .map_err(|e| e.to_string())?,
        "markdown" | "md" => session.export_markdown(),
        _ => {
            return Err(format!(
                "unsupported format: \"{format}\". Use: json, history, md"
            ));
        }
    };

    if let Some(path) = output {
        std::fs::write(path, &content)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  Exported to {}", path.display());
    } else {
        print!("{content}");
    }

    Ok(())
}
