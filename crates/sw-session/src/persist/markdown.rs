use sw_core::text::strip_html_tags;
use sw_core::{Graph, NodeId};

use crate::session::Session;

fn plain(html: &str) -> String {
    strip_html_tags(html).trim().to_string()
}

fn name_of<'g>(graph: &'g Graph, id: &'g NodeId) -> &'g str {
    graph.node(id).map_or(id.as_str(), |n| n.name())
}

impl Session {
    /// Export the story as a Markdown document.
    pub fn export_markdown(&self) -> String {
        let narrative = self.narrative();
        let mut out = String::from("# Session Weaver History\n\n");

        let seed = &narrative.game_seed;
        if !seed.is_empty() {
            out.push_str(&format!("**Big Picture**: {}\n", seed.big_picture));
            if !seed.palette.is_empty() {
                out.push_str(&format!("**Palette**: {}\n", seed.palette.join(", ")));
            }
            if !seed.banned.is_empty() {
                out.push_str(&format!("**Banned**: {}\n", seed.banned.join(", ")));
            }
            out.push('\n');
        }
        if !narrative.focus.trim().is_empty() {
            out.push_str(&format!("**Focus**: {}\n\n", narrative.focus.trim()));
        }

        for period in &narrative.periods {
            out.push_str(&format!("## {}\n\n", period.name));
            let text = plain(&period.description);
            if !text.is_empty() {
                out.push_str(&format!("{text}\n\n"));
            }
            for event in &period.events {
                out.push_str(&format!("### {}\n\n", event.name));
                let text = plain(&event.description);
                if !text.is_empty() {
                    out.push_str(&format!("{text}\n\n"));
                }
                for scene in &event.scenes {
                    out.push_str(&format!("#### {}\n\n", scene.name));
                    let text = plain(&scene.description);
                    if !text.is_empty() {
                        out.push_str(&format!("> {text}\n\n"));
                    }
                }
            }
        }

        let mut legacies = self.graph.legacies().peekable();
        if legacies.peek().is_some() {
            out.push_str("## Legacies\n\n");
            for edge in legacies {
                out.push_str(&format!(
                    "- **{}** -> **{}**: {}\n",
                    name_of(&self.graph, &edge.source),
                    name_of(&self.graph, &edge.target),
                    edge.legacy_description().unwrap_or_default()
                ));
            }
            out.push('\n');
        }

        if !narrative.history_log.is_empty() {
            out.push_str("## Turn Log\n\n");
            for entry in &narrative.history_log {
                out.push_str(&format!(
                    "- *{}*: {}\n",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.summary
                ));
            }
        }
        out
    }
}
