mod prompt;
mod workspace;
mod registry;
pub mod persistence;

pub use prompt::{PromptDefaults, SavedPrompt};
pub use workspace::Workspace;
pub use registry::PromptLibrary;
pub use persistence::{JsonPromptStore, MemoryPromptStore, PromptMetadata, PromptPersistence};
