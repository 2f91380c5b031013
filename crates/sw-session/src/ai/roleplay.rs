use sw_core::{DialogueMessage, NodeId, NodeKind, NodePatch, SceneMode};
use tracing::warn;

use super::generator::{DialogueRequest, StoryGenerator};
use crate::error::{SessionError, SessionResult};
use crate::session::Session;

impl Session {
    /// Play one exchange of a scene's roleplay.
    ///
    /// The player's line is appended and the scene switched to roleplay mode,
    /// then the generator answers in character. If it fails, the transcript
    /// and mode are put back exactly as they were.
    pub async fn roleplay_turn<G: StoryGenerator + ?Sized>(
        &mut self,
        generator: &G,
        scene: &NodeId,
        personality: &str,
        message: &str,
    ) -> SessionResult<String> {
        let node = self
            .graph
            .node(scene)
            .ok_or_else(|| sw_core::GraphError::NodeNotFound(scene.clone()))?;
        if node.kind != NodeKind::Scene {
            return Err(sw_core::GraphError::NotAScene(scene.clone()).into());
        }
        let previous = node.scene().cloned().unwrap_or_default();
        let content = node.content();

        let mut history = previous.dialogue.clone();
        history.push(DialogueMessage::user(message));
        self.patch_node(
            scene,
            NodePatch::default()
                .with_mode(SceneMode::Roleplay)
                .with_dialogue(history.clone()),
        )?;

        let request = DialogueRequest {
            personality: personality.to_string(),
            scene: content,
            history: history.clone(),
        };
        match generator.dialogue_reply(&request).await {
            Ok(reply) if !reply.trim().is_empty() => {
                history.push(DialogueMessage::model(reply.clone()));
                self.patch_node(scene, NodePatch::default().with_dialogue(history))?;
                Ok(reply)
            }
            outcome => {
                let error = match outcome {
                    Err(e) => e,
                    Ok(_) => super::GenerationError::Empty,
                };
                warn!(%scene, %error, "roleplay reply failed; restoring transcript");
                self.patch_node(
                    scene,
                    NodePatch::default()
                        .with_mode(previous.mode)
                        .with_dialogue(previous.dialogue),
                )?;
                Err(SessionError::Generation(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sw_core::{DialogueRole, NodeContent};

    use crate::ai::GenerationError;
    use crate::ai::testing::ScriptedGenerator;
    use crate::config::SessionConfig;
    use crate::error::SessionError;
    use crate::session::Session;
    use sw_core::{NodeId, NodeKind, SceneMode};

    fn session_with_scene() -> (Session, NodeId) {
        let mut session = Session::new(SessionConfig::default());
        let host = session.add_human("Ann").unwrap();
        let period = session
            .add_period(&host, NodeContent::new("Dawn", "First light"))
            .unwrap();
        let event = session
            .add_child(&host, &period, NodeKind::Event, NodeContent::new("Flood", "Water"))
            .unwrap();
        session.end_turn().unwrap();
        let scene = session
            .add_child(&host, &event, NodeKind::Scene, NodeContent::new("Rooftops", "Waiting"))
            .unwrap();
        (session, scene)
    }

    #[tokio::test]
    async fn exchange_is_appended() {
        let (mut session, scene) = session_with_scene();
        let generator = ScriptedGenerator::new().with_reply(Ok("The water is rising.".into()));

        let reply = session
            .roleplay_turn(&generator, &scene, "Creative", "What do you see?")
            .await
            .unwrap();
        assert_eq!(reply, "The water is rising.");

        let state = session.graph().node(&scene).unwrap().scene().unwrap().clone();
        assert_eq!(state.mode, SceneMode::Roleplay);
        assert_eq!(state.dialogue.len(), 2);
        assert_eq!(state.dialogue[0].role, DialogueRole::User);
        assert_eq!(state.dialogue[1].content, "The water is rising.");

        let request = &generator.dialogues.lock().unwrap()[0];
        assert_eq!(request.scene.name, "Rooftops");
        assert_eq!(request.history.len(), 1);
    }

    #[tokio::test]
    async fn failure_restores_the_transcript() {
        let (mut session, scene) = session_with_scene();
        let generator = ScriptedGenerator::new()
            .with_reply(Ok("Hello.".into()))
            .with_reply(Err(GenerationError::Request("timeout".into())));

        session
            .roleplay_turn(&generator, &scene, "Logical", "Hi")
            .await
            .unwrap();
        let before = session.graph().node(&scene).unwrap().clone();

        let err = session
            .roleplay_turn(&generator, &scene, "Logical", "Anyone there?")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Generation(GenerationError::Request(_))));
        assert_eq!(session.graph().node(&scene).unwrap(), &before);
    }

    #[tokio::test]
    async fn only_scenes_roleplay() {
        let (mut session, _) = session_with_scene();
        let generator = ScriptedGenerator::new();
        let period = NodeId::from("period-1");
        assert!(
            session
                .roleplay_turn(&generator, &period, "Creative", "Hi")
                .await
                .is_err()
        );
        assert!(generator.dialogues.lock().unwrap().is_empty());
    }
}
