//! The creative premise shared with every generation call.

use serde::{Deserialize, Serialize};

/// Big-picture premise plus ordered inclusion and exclusion prompts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSeed {
    /// One-paragraph premise of the history.
    #[serde(default)]
    pub big_picture: String,
    /// Things the story should include.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Things the story must leave out.
    #[serde(default)]
    pub banned: Vec<String>,
}

impl GameSeed {
    /// A seed with only a premise.
    pub fn new(big_picture: impl Into<String>) -> Self {
        Self {
            big_picture: big_picture.into(),
            ..Self::default()
        }
    }

    /// Add a palette entry.
    pub fn with_palette(mut self, item: impl Into<String>) -> Self {
        self.palette.push(item.into());
        self
    }

    /// Add a banned entry.
    pub fn with_banned(mut self, item: impl Into<String>) -> Self {
        self.banned.push(item.into());
        self
    }

    /// True when nothing has been filled in.
    pub fn is_empty(&self) -> bool {
        self.big_picture.trim().is_empty() && self.palette.is_empty() && self.banned.is_empty()
    }

    /// Render the seed as prompt context.
    pub fn to_prompt(&self) -> String {
        let mut out = format!("Big picture: {}\n", self.big_picture.trim());
        if !self.palette.is_empty() {
            out.push_str(&format!("Include: {}\n", self.palette.join("; ")));
        }
        if !self.banned.is_empty() {
            out.push_str(&format!("Exclude: {}\n", self.banned.join("; ")));
        }
        out
    }
}
