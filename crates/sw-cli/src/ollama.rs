//! Story generator backed by Ollama's OpenAI-compatible chat API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sw_core::{DialogueRole, NodeContent};
use sw_session::ai::{
    CritiqueRequest, DialogueRequest, GenerationError, GenerationResult, LegacyRequest,
    LegacySuggestion, NodeRequest, StoryGenerator, non_empty,
};
use tracing::debug;

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model for Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for Ollama's `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Uses `OLLAMA_BASE_URL` and `OLLAMA_MODEL`, falling back to defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string());
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
        Self::new(&base_url, &model)
    }

    async fn chat(&self, messages: Vec<ChatMessage>, json: bool) -> GenerationResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(0.9),
            response_format: json.then(|| ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| GenerationError::Request(e.to_string()))?;
            return Err(GenerationError::Request(error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("no choices in response".into()))?;
        debug!(chars = content.len(), "generation response received");
        Ok(content)
    }

    async fn chat_json<T: DeserializeOwned>(&self, prompt: String) -> GenerationResult<T> {
        let content = self.chat(vec![ChatMessage::user(prompt)], true).await?;
        parse_json(&content)
    }
}

#[async_trait]
impl StoryGenerator for OllamaGenerator {
    async fn generate_node(&self, request: &NodeRequest) -> GenerationResult<NodeContent> {
        let content: NodeContent = self.chat_json(node_prompt(request)).await?;
        non_empty(content)
    }

    async fn regenerate_node(&self, request: &CritiqueRequest) -> GenerationResult<NodeContent> {
        let content: NodeContent = self.chat_json(critique_prompt(request)).await?;
        non_empty(content)
    }

    async fn dialogue_reply(&self, request: &DialogueRequest) -> GenerationResult<String> {
        let mut messages = vec![ChatMessage::system(dialogue_prompt(request))];
        messages.extend(request.history.iter().map(|m| ChatMessage {
            role: match m.role {
                DialogueRole::User => "user",
                DialogueRole::Model => "assistant",
            }
            .to_string(),
            content: Some(m.content.clone()),
        }));
        let reply = self.chat(messages, false).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(reply.to_string())
    }

    async fn suggest_legacies(
        &self,
        request: &LegacyRequest,
    ) -> GenerationResult<Vec<LegacySuggestion>> {
        let wrapped: LegacyList = self.chat_json(legacy_prompt(request)).await?;
        Ok(wrapped.legacies)
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn node_prompt(request: &NodeRequest) -> String {
    let kind = request.kind.label().to_lowercase();
    let placement = match &request.parent {
        Some(parent) => format!(
            "It attaches to \"{}\", which is about: \"{}\".",
            parent.name, parent.description
        ),
        None => "This is the very first entry in the timeline.".to_string(),
    };
    let mut prompt = format!(
        "You are an AI player with a \"{personality}\" personality in a collaborative \
         storytelling game. Invent a creative name and a compelling description for a new \
         {kind}.\n\nThe overall story guidelines are:\n{seed}\n{placement}\n",
        personality = request.personality,
        seed = request.game_seed.to_prompt(),
    );
    if !request.focus.trim().is_empty() {
        prompt.push_str(&format!("The current focus is: {}\n", request.focus.trim()));
    }
    prompt.push_str(
        "\nReply with a JSON object with the keys \"name\" and \"description\" and nothing else.",
    );
    prompt
}

fn critique_prompt(request: &CritiqueRequest) -> String {
    let kind = request.kind.label().to_lowercase();
    format!(
        "You are an AI player with a \"{personality}\" personality in a collaborative \
         storytelling game. You suggested a new {kind} named \"{name}\" with the description \
         \"{description}\".\n\nThe other players said:\n\"{feedback}\"\n\nRewrite the name and \
         description taking this feedback into account. Do not repeat the original suggestion.\n\
         Reply with a JSON object with the keys \"name\" and \"description\" and nothing else.",
        personality = request.personality,
        name = request.previous.name,
        description = request.previous.description,
        feedback = request.feedback,
    )
}

fn dialogue_prompt(request: &DialogueRequest) -> String {
    format!(
        "You are roleplaying in a collaborative story with a \"{}\" personality. The scene is \
         \"{}\": {}\nStay in character and answer the latest line in a few sentences.",
        request.personality, request.scene.name, request.scene.description
    )
}

fn legacy_prompt(request: &LegacyRequest) -> String {
    let mut prompt = String::from(
        "You are helping players of a collaborative timeline game. Given the periods, events \
         and legacies below, suggest new legacies that connect these elements and explain the \
         reasoning behind each.\n\nPeriods:\n",
    );
    for p in &request.periods {
        prompt.push_str(&format!("- Id: {}, Name: {}, Description: {}\n", p.id, p.name, p.description));
    }
    prompt.push_str("\nEvents:\n");
    for e in &request.events {
        prompt.push_str(&format!("- Id: {}, Name: {}, Description: {}\n", e.id, e.name, e.description));
    }
    prompt.push_str("\nLegacies:\n");
    for l in &request.legacies {
        prompt.push_str(&format!(
            "- Source: {}, Target: {}, Description: {}\n",
            l.source, l.target, l.description
        ));
    }
    prompt.push_str(
        "\nReply with a JSON object {\"legacies\": [{\"source\": id, \"target\": id, \
         \"reason\": text}]} using only the ids above.",
    );
    prompt
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse the JSON object in a model reply, ignoring any prose or code fences
/// around it.
fn parse_json<T: DeserializeOwned>(content: &str) -> GenerationResult<T> {
    let start = content.find('{');
    let end = content.rfind('}');
    let body = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(GenerationError::InvalidResponse(
                "no JSON object in response".into(),
            ));
        }
    };
    serde_json::from_str(body).map_err(|e| GenerationError::InvalidResponse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct LegacyList {
    #[serde(default)]
    legacies: Vec<LegacySuggestion>,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl ChatMessage {
    fn system(content: String) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content),
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
