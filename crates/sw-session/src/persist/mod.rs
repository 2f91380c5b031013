//! Persistence: the full save document, the shareable history document and
//! a Markdown rendering of the story.

mod history;
mod markdown;
mod save;

pub use history::{HistoryDocument, HistoryLegacy, HistoryNode};
pub use save::SaveFile;
