use super::message::{Message, MessagePatch};
use crate::error::StudioError;
use serde::{Deserialize, Serialize};

/// Ordered message log of the active conversation, addressed by message id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append in order. Either every message goes in or, when an id would
    /// collide, none do.
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) -> Result<(), StudioError> {
        let incoming: Vec<Message> = messages.into_iter().collect();
        for (i, msg) in incoming.iter().enumerate() {
            let clashes_existing = self.get(&msg.id).is_some();
            let clashes_batch = incoming[..i].iter().any(|m| m.id == msg.id);
            if clashes_existing || clashes_batch {
                return Err(StudioError::DuplicateMessageId(msg.id.clone()));
            }
        }
        self.messages.extend(incoming);
        Ok(())
    }

    /// Apply `patch` to the message with `id`. Returns false when there is none.
    pub fn update_by_id(&mut self, id: &str, patch: MessagePatch) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
