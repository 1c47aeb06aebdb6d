mod message;
mod log;

pub use message::{Message, MessagePatch};
pub use log::ConversationLog;
pub use crate::llm::Role;
