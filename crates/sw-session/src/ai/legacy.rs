use std::collections::HashSet;

use sw_core::text::strip_html_tags;
use sw_core::{EdgeId, Graph, Node, NodeKind};
use tracing::debug;

use super::generator::{
    LegacyBrief, LegacyRequest, LegacySuggestion, NodeBrief, StoryGenerator,
};
use crate::error::SessionResult;
use crate::player::PlayerId;
use crate::session::Session;

fn brief(node: &Node) -> NodeBrief {
    NodeBrief {
        id: node.id.clone(),
        name: node.name().to_string(),
        description: strip_html_tags(node.description()).trim().to_string(),
    }
}

/// Periods, events and existing legacies as suggestion context.
pub fn legacy_request(graph: &Graph) -> LegacyRequest {
    LegacyRequest {
        periods: graph.nodes_of_kind(NodeKind::Period).map(brief).collect(),
        events: graph.nodes_of_kind(NodeKind::Event).map(brief).collect(),
        legacies: graph
            .legacies()
            .map(|edge| LegacyBrief {
                id: edge.id.to_string(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                description: edge.legacy_description().unwrap_or_default().to_string(),
            })
            .collect(),
    }
}

/// Drop suggestions that point at missing nodes, link a node to itself, or
/// repeat an earlier suggestion.
pub fn filter_suggestions(graph: &Graph, suggestions: Vec<LegacySuggestion>) -> Vec<LegacySuggestion> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|s| {
            let valid = s.source != s.target
                && graph.contains(&s.source)
                && graph.contains(&s.target);
            if !valid {
                debug!(source = %s.source, target = %s.target, "dropping legacy suggestion");
            }
            valid && seen.insert((s.source.clone(), s.target.clone()))
        })
        .collect()
}

impl Session {
    /// Ask the generator for legacy ideas. Only suggestions naming existing
    /// nodes are returned.
    pub async fn suggest_legacies<G: StoryGenerator + ?Sized>(
        &self,
        generator: &G,
    ) -> SessionResult<Vec<LegacySuggestion>> {
        let request = legacy_request(&self.graph);
        let suggestions = generator.suggest_legacies(&request).await?;
        Ok(filter_suggestions(&self.graph, suggestions))
    }

    /// Turn a suggestion into a legacy edge.
    pub fn accept_legacy_suggestion(
        &mut self,
        actor: &PlayerId,
        suggestion: &LegacySuggestion,
    ) -> SessionResult<EdgeId> {
        self.connect_legacy(
            actor,
            &suggestion.source,
            &suggestion.target,
            suggestion.reason.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedGenerator;
    use crate::config::SessionConfig;
    use sw_core::NodeContent;

    fn suggestion(source: &str, target: &str) -> LegacySuggestion {
        LegacySuggestion {
            source: source.into(),
            target: target.into(),
            reason: format!("{source} echoes in {target}"),
        }
    }

    fn session() -> (Session, PlayerId) {
        let mut session = Session::new(SessionConfig::default());
        let host = session.add_human("Ann").unwrap();
        let period = session
            .add_period(&host, NodeContent::new("Dawn", "<p>First <b>light</b></p>"))
            .unwrap();
        session
            .add_child(&host, &period, NodeKind::Event, NodeContent::new("Flood", "Water"))
            .unwrap();
        (session, host)
    }

    #[test]
    fn request_lists_plain_text_context() {
        let (mut session, host) = session();
        session
            .connect_legacy(&host, &"period-1".into(), &"event-2".into(), "rain")
            .unwrap();
        let request = legacy_request(session.graph());
        assert_eq!(request.periods.len(), 1);
        assert_eq!(request.periods[0].description, "First light");
        assert_eq!(request.events[0].name, "Flood");
        assert_eq!(request.legacies[0].description, "rain");
    }

    #[tokio::test]
    async fn unknown_ids_are_dropped() {
        let (session, _) = session();
        let generator = ScriptedGenerator::new().with_suggestions(vec![
            suggestion("period-1", "event-2"),
            suggestion("period-1", "event-77"),
            suggestion("event-2", "event-2"),
            suggestion("period-1", "event-2"),
        ]);
        let suggestions = session.suggest_legacies(&generator).await.unwrap();
        assert_eq!(suggestions, vec![suggestion("period-1", "event-2")]);
    }

    #[test]
    fn accepted_suggestion_becomes_a_legacy() {
        let (mut session, host) = session();
        let id = session
            .accept_legacy_suggestion(&host, &suggestion("event-2", "period-1"))
            .unwrap();
        let edge = session.graph().edge(&id).unwrap();
        assert_eq!(edge.legacy_description(), Some("event-2 echoes in period-1"));
    }
}
