use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// The three tiers of the narrative hierarchy. A node's kind never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A top-level era of the timeline.
    Period,
    /// Something that happened within a period.
    Event,
    /// A moment played out within an event.
    Scene,
}

impl NodeKind {
    /// The kind a node of this kind must hang under, if any.
    pub fn required_parent(self) -> Option<NodeKind> {
        match self {
            Self::Period => None,
            Self::Event => Some(Self::Period),
            Self::Scene => Some(Self::Event),
        }
    }

    /// The kind of node that can be attached beneath this one, if any.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            Self::Period => Some(Self::Event),
            Self::Event => Some(Self::Scene),
            Self::Scene => None,
        }
    }

    /// Capitalized label used in summaries and prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Period => "Period",
            Self::Event => "Event",
            Self::Scene => "Scene",
        }
    }

    /// Parse a kind from user input (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "period" => Some(Self::Period),
            "event" => Some(Self::Event),
            "scene" => Some(Self::Scene),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Period => write!(f, "period"),
            Self::Event => write!(f, "event"),
            Self::Scene => write!(f, "scene"),
        }
    }
}

/// Layout position on the board. Presentation-only, but persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// How a scene is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneMode {
    /// Prose description only.
    #[default]
    Description,
    /// Played out as a dialogue transcript.
    Roleplay,
}

/// Who spoke a line of dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueRole {
    /// A human player.
    User,
    /// The generation service.
    Model,
}

/// One line of a scene's roleplay transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueMessage {
    /// Speaker.
    pub role: DialogueRole,
    /// Spoken text.
    pub content: String,
}

impl DialogueMessage {
    /// A line spoken by a player.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::User,
            content: content.into(),
        }
    }

    /// A line produced by the model.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::Model,
            content: content.into(),
        }
    }
}

/// Scene-only state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneState {
    /// Description or roleplay presentation.
    #[serde(default)]
    pub mode: SceneMode,
    /// Roleplay transcript, oldest first.
    #[serde(default)]
    pub dialogue: Vec<DialogueMessage>,
}

/// Editable content of a node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rich-text (HTML) description.
    #[serde(default)]
    pub description: String,
    /// Optional banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Present on scenes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<SceneState>,
}

/// A name and description pair, as typed by a player or produced by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeContent {
    /// Display name.
    pub name: String,
    /// Description text.
    pub description: String,
}

impl NodeContent {
    /// Content with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// The `"New Period"`-style placeholder used for freshly added nodes.
    pub fn placeholder(kind: NodeKind) -> Self {
        Self::new(format!("New {}", kind.label()), "")
    }
}

/// A narrative unit on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable, globally unique id.
    pub id: NodeId,
    /// Tier in the hierarchy.
    #[serde(alias = "type")]
    pub kind: NodeKind,
    /// Layout position.
    #[serde(default)]
    pub position: Position,
    /// Editable content.
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Build a node; scenes get default scene state.
    pub fn new(id: NodeId, kind: NodeKind, position: Position, content: NodeContent) -> Self {
        let scene = (kind == NodeKind::Scene).then(SceneState::default);
        Self {
            id,
            kind,
            position,
            data: NodeData {
                name: content.name,
                description: content.description,
                image_url: None,
                scene,
            },
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Description (rich text).
    pub fn description(&self) -> &str {
        &self.data.description
    }

    /// Scene state if this is a scene.
    pub fn scene(&self) -> Option<&SceneState> {
        self.data.scene.as_ref()
    }

    /// Name and description as a content pair.
    pub fn content(&self) -> NodeContent {
        NodeContent::new(self.data.name.clone(), self.data.description.clone())
    }

    /// True when both name and description carry visible text.
    pub fn is_complete(&self) -> bool {
        !self.data.name.trim().is_empty() && !crate::text::is_blank(&self.data.description)
    }
}

/// A partial update to a node's data. `None` fields are left alone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New image reference (`Some(None)` clears it).
    pub image_url: Option<Option<String>>,
    /// New scene mode (scenes only).
    pub mode: Option<SceneMode>,
    /// Replacement transcript (scenes only).
    pub dialogue: Option<Vec<DialogueMessage>>,
}

impl NodePatch {
    /// Patch that sets the name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Patch that sets the description.
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Patch that sets both name and description.
    pub fn content(content: NodeContent) -> Self {
        Self {
            name: Some(content.name),
            description: Some(content.description),
            ..Self::default()
        }
    }

    /// Also set the scene mode.
    pub fn with_mode(mut self, mode: SceneMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Also replace the transcript.
    pub fn with_dialogue(mut self, dialogue: Vec<DialogueMessage>) -> Self {
        self.dialogue = Some(dialogue);
        self
    }

    /// Also set or clear the image reference.
    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = Some(image_url);
        self
    }

    /// Whether this patch touches scene-only fields.
    pub fn touches_scene(&self) -> bool {
        self.mode.is_some() || self.dialogue.is_some()
    }

    /// Merge the supplied fields into `data`. Last write wins.
    pub(crate) fn apply(self, data: &mut NodeData) {
        if let Some(name) = self.name {
            data.name = name;
        }
        if let Some(description) = self.description {
            data.description = description;
        }
        if let Some(image_url) = self.image_url {
            data.image_url = image_url;
        }
        if self.mode.is_some() || self.dialogue.is_some() {
            let scene = data.scene.get_or_insert_with(SceneState::default);
            if let Some(mode) = self.mode {
                scene.mode = mode;
            }
            if let Some(dialogue) = self.dialogue {
                scene.dialogue = dialogue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_rules() {
        assert_eq!(NodeKind::Period.required_parent(), None);
        assert_eq!(NodeKind::Event.required_parent(), Some(NodeKind::Period));
        assert_eq!(NodeKind::Scene.required_parent(), Some(NodeKind::Event));
        assert_eq!(NodeKind::Scene.child_kind(), None);
    }

    #[test]
    fn only_scenes_get_scene_state() {
        let scene = Node::new(
            "scene-1".into(),
            NodeKind::Scene,
            Position::default(),
            NodeContent::placeholder(NodeKind::Scene),
        );
        assert_eq!(scene.scene().map(|s| s.mode), Some(SceneMode::Description));

        let period = Node::new(
            "period-2".into(),
            NodeKind::Period,
            Position::default(),
            NodeContent::placeholder(NodeKind::Period),
        );
        assert!(period.scene().is_none());
        assert_eq!(period.name(), "New Period");
    }

    #[test]
    fn completeness_ignores_markup() {
        let mut node = Node::new(
            "event-1".into(),
            NodeKind::Event,
            Position::default(),
            NodeContent::new("The Fall", "<p> </p>"),
        );
        assert!(!node.is_complete());
        node.data.description = "<p>The walls came down.</p>".into();
        assert!(node.is_complete());
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut data = NodeData {
            name: "Old".into(),
            description: "Kept".into(),
            ..NodeData::default()
        };
        NodePatch::name("New").with_image(Some("banner.png".into())).apply(&mut data);
        assert_eq!(data.name, "New");
        assert_eq!(data.description, "Kept");
        assert_eq!(data.image_url.as_deref(), Some("banner.png"));
    }

    #[test]
    fn kind_accepts_legacy_type_key() {
        let json = r#"{"id":"period-1","type":"period","position":{"x":1.0,"y":2.0},"data":{"name":"A","description":"B"}}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::Period);
        assert_eq!(node.position, Position::new(1.0, 2.0));
    }
}
