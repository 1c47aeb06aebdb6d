use super::prompt::{PromptDefaults, SavedPrompt};
use crate::attachment::PendingAttachments;
use crate::constants::defaults;
use crate::conversation::ConversationLog;
use crate::llm::GenerationConfig;

/// The live, editable state the user is working in.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub prompt_name: String,
    pub messages: ConversationLog,
    pub system_instruction: String,
    pub config: GenerationConfig,
    pub model_id: String,
    pub pending: PendingAttachments,
}

impl Workspace {
    pub fn new(defaults: &PromptDefaults) -> Self {
        Self {
            prompt_name: defaults::PROMPT_NAME.to_string(),
            messages: ConversationLog::new(),
            system_instruction: defaults.system_instruction.clone(),
            config: defaults.config,
            model_id: defaults.model_id.clone(),
            pending: PendingAttachments::new(),
        }
    }

    pub(crate) fn reset(&mut self, defaults: &PromptDefaults) {
        *self = Self::new(defaults);
    }

    /// Copy a saved prompt's fields in. Pending attachments are kept.
    pub(crate) fn load(&mut self, prompt: &SavedPrompt) {
        self.prompt_name = prompt.name.clone();
        self.messages = ConversationLog::from_messages(prompt.messages.clone());
        self.system_instruction = prompt.system_instruction.clone();
        self.config = prompt.config;
        self.model_id = prompt.model_id.clone();
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(&PromptDefaults::default())
    }
}
