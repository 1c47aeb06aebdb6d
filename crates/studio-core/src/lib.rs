pub mod error;
pub mod constants;
pub mod config;
pub mod llm;
pub mod attachment;
pub mod session;
pub mod conversation;
pub mod library;
pub mod export;
pub mod studio;

// Re-export key types
pub use error::{Result, StudioError};
pub use config::{Settings, SyncPolicy};
pub use llm::{ChatContext, ChatInput, GeminiClient, GenerationConfig, LlmClient, Part, StreamEvent};
pub use attachment::{Attachment, AttachmentKind, PendingAttachments, RawFile};
pub use session::ChatSession;
pub use conversation::{ConversationLog, Message, MessagePatch, Role};
pub use library::{PromptLibrary, SavedPrompt, Workspace};
pub use export::{project, ConversationSnapshot, TargetLanguage};
pub use studio::Studio;
