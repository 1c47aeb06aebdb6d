use crate::config::Settings;
use crate::constants::defaults;
use crate::conversation::Message;
use crate::llm::GenerationConfig;
use serde::{Deserialize, Serialize};

/// A named snapshot of a whole conversation and the settings it ran with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedPrompt {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub system_instruction: String,
    pub config: GenerationConfig,
    pub model_id: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl SavedPrompt {
    pub fn new(id: impl Into<String>, defaults: &PromptDefaults) -> Self {
        Self {
            id: id.into(),
            name: defaults::PROMPT_NAME.to_string(),
            messages: Vec::new(),
            system_instruction: defaults.system_instruction.clone(),
            config: defaults.config,
            model_id: defaults.model_id.clone(),
            updated_at: now_millis(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// What a fresh conversation starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptDefaults {
    pub model_id: String,
    pub system_instruction: String,
    pub config: GenerationConfig,
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            model_id: defaults::MODEL.to_string(),
            system_instruction: defaults::SYSTEM_INSTRUCTION.to_string(),
            config: GenerationConfig::default(),
        }
    }
}

impl From<&Settings> for PromptDefaults {
    fn from(settings: &Settings) -> Self {
        Self {
            model_id: settings.gemini.model.clone(),
            system_instruction: settings.system_instruction.clone(),
            config: settings.generation.clamped(),
        }
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
