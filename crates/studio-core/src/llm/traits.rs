use crate::constants::{defaults, limits};
use crate::error::StudioError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// Sampling parameters sent with every request of a chat context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE,
            top_p: defaults::TOP_P,
            top_k: defaults::TOP_K,
            max_output_tokens: defaults::MAX_OUTPUT_TOKENS,
        }
    }
}

impl GenerationConfig {
    /// Pull every value into the range the run-settings controls allow.
    /// NaN temperatures or top-p values fall back to the defaults.
    pub fn clamped(self) -> Self {
        let temperature = if self.temperature.is_nan() {
            defaults::TEMPERATURE
        } else {
            self.temperature
                .clamp(limits::TEMPERATURE_MIN, limits::TEMPERATURE_MAX)
        };
        let top_p = if self.top_p.is_nan() {
            defaults::TOP_P
        } else {
            self.top_p.clamp(limits::TOP_P_MIN, limits::TOP_P_MAX)
        };
        Self {
            temperature,
            top_p,
            top_k: self.top_k.clamp(limits::TOP_K_MIN, limits::TOP_K_MAX),
            max_output_tokens: self
                .max_output_tokens
                .clamp(limits::MAX_OUTPUT_TOKENS_MIN, limits::MAX_OUTPUT_TOKENS_MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    /// Raw base64, never a data URL.
    pub data: String,
}

/// A typed unit of a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData(InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(t),
            Part::InlineData(_) => None,
        }
    }
}

/// What a single send carries: a bare string or a structured part list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Text(String),
    Parts(Vec<Part>),
}

impl ChatInput {
    /// A lone text part is sent as a bare string, anything else as parts.
    pub fn from_parts(mut parts: Vec<Part>) -> Self {
        if parts.len() == 1 && matches!(parts[0], Part::Text(_)) {
            if let Some(Part::Text(text)) = parts.pop() {
                return ChatInput::Text(text);
            }
        }
        ChatInput::Parts(parts)
    }

    pub fn to_parts(&self) -> Vec<Part> {
        match self {
            ChatInput::Text(text) => vec![Part::Text(text.clone())],
            ChatInput::Parts(parts) => parts.clone(),
        }
    }
}

/// One turn held in the provider-side context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// Provider-side conversation context: the parameters every request is sent
/// with plus the turns exchanged since the context was created.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub model: String,
    pub system_instruction: Option<String>,
    pub config: GenerationConfig,
    history: Vec<Content>,
}

impl ChatContext {
    pub fn new(
        model: impl Into<String>,
        system_instruction: Option<String>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.filter(|s| !s.trim().is_empty()),
            config,
            history: Vec::new(),
        }
    }

    /// Seed the context with turns the provider should treat as already said.
    pub fn with_history(mut self, history: Vec<Content>) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// The full `contents` list for a request: prior turns then the new user turn.
    pub fn contents_for(&self, input: &ChatInput) -> Vec<Content> {
        let mut contents = self.history.clone();
        contents.push(Content {
            role: Role::User,
            parts: input.to_parts(),
        });
        contents
    }

    /// Remember a completed exchange so the next request carries it.
    pub fn record_turn(&mut self, input: &ChatInput, reply: impl Into<String>) {
        self.history.push(Content {
            role: Role::User,
            parts: input.to_parts(),
        });
        self.history.push(Content {
            role: Role::Model,
            parts: vec![Part::Text(reply.into())],
        });
    }
}

/// Events emitted during streaming LLM responses.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Newly generated text, not the running total.
    TextDelta(String),
    Done,
    Error(String),
}

/// The model provider boundary. Implementations turn a context plus a new
/// user turn into a stream of fragments.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_stream(
        &self,
        context: &ChatContext,
        input: &ChatInput,
    ) -> Result<futures::channel::mpsc::UnboundedReceiver<StreamEvent>, StudioError>;
}
