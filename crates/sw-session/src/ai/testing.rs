//! A scripted generator for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sw_core::NodeContent;

use super::generator::{
    CritiqueRequest, DialogueRequest, GenerationError, GenerationResult, LegacyRequest,
    LegacySuggestion, NodeRequest, StoryGenerator,
};

/// Replays queued answers in order and records what it was asked.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    nodes: Mutex<VecDeque<GenerationResult<NodeContent>>>,
    replies: Mutex<VecDeque<GenerationResult<String>>>,
    suggestions: Mutex<VecDeque<GenerationResult<Vec<LegacySuggestion>>>>,
    pub(crate) node_requests: Mutex<Vec<NodeRequest>>,
    pub(crate) critiques: Mutex<Vec<CritiqueRequest>>,
    pub(crate) dialogues: Mutex<Vec<DialogueRequest>>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_node(self, name: &str, description: &str) -> Self {
        self.push_node(Ok(NodeContent::new(name, description)));
        self
    }

    pub(crate) fn with_node_error(self, error: GenerationError) -> Self {
        self.push_node(Err(error));
        self
    }

    pub(crate) fn with_reply(self, reply: GenerationResult<String>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn with_suggestions(self, suggestions: Vec<LegacySuggestion>) -> Self {
        self.suggestions.lock().unwrap().push_back(Ok(suggestions));
        self
    }

    fn push_node(&self, result: GenerationResult<NodeContent>) {
        self.nodes.lock().unwrap().push_back(result);
    }

    fn next_node(&self) -> GenerationResult<NodeContent> {
        self.nodes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::Request("script exhausted".into())))
    }
}

#[async_trait]
impl StoryGenerator for ScriptedGenerator {
    async fn generate_node(&self, request: &NodeRequest) -> GenerationResult<NodeContent> {
        self.node_requests.lock().unwrap().push(request.clone());
        self.next_node()
    }

    async fn regenerate_node(&self, request: &CritiqueRequest) -> GenerationResult<NodeContent> {
        self.critiques.lock().unwrap().push(request.clone());
        self.next_node()
    }

    async fn dialogue_reply(&self, request: &DialogueRequest) -> GenerationResult<String> {
        self.dialogues.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty))
    }

    async fn suggest_legacies(
        &self,
        _request: &LegacyRequest,
    ) -> GenerationResult<Vec<LegacySuggestion>> {
        self.suggestions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Vec::new()))
    }
}
