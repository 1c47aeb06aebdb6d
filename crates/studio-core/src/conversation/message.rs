use crate::attachment::Attachment;
use crate::llm::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub error: bool,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            attachments: Vec::new(),
            is_streaming: false,
            error: false,
        }
    }

    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::new(Role::User, text)
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Empty model message that streaming output is written into.
    pub fn placeholder() -> Self {
        Self {
            is_streaming: true,
            ..Self::new(Role::Model, "")
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Nothing worth exporting: blank text and no attachments.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    pub fn apply(&mut self, patch: MessagePatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(is_streaming) = patch.is_streaming {
            self.is_streaming = is_streaming;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
    }
}

/// The fields of a message that may change after it was created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub is_streaming: Option<bool>,
    pub error: Option<bool>,
}

impl MessagePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            is_streaming: Some(false),
            ..Self::default()
        }
    }

    /// Stop streaming and mark failed, keeping whatever text arrived.
    pub fn interrupted() -> Self {
        Self {
            is_streaming: Some(false),
            error: Some(true),
            ..Self::default()
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_streaming: Some(false),
            error: Some(true),
        }
    }
}
