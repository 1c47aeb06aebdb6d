use crate::attachment::{self, Attachment};
use crate::config::{Settings, SyncPolicy};
use crate::conversation::{Message, MessagePatch};
use crate::error::{Result, StudioError};
use crate::export::{self, ConversationSnapshot};
use crate::library::{PromptDefaults, PromptLibrary, PromptPersistence, SavedPrompt, Workspace};
use crate::llm::{GenerationConfig, LlmClient};
use crate::session::{self, ChatSession};
use std::path::Path;
use std::sync::Arc;

/// The whole chat workspace: the live conversation, the prompt library it
/// is bound to, and the session that talks to the model.
pub struct Studio {
    workspace: Workspace,
    library: PromptLibrary,
    session: ChatSession,
    sync_policy: SyncPolicy,
    store: Option<Box<dyn PromptPersistence>>,
}

impl Studio {
    /// A studio whose library lives in memory only.
    pub fn new(client: Arc<dyn LlmClient>, settings: &Settings) -> Self {
        let defaults = PromptDefaults::from(settings);
        let library = PromptLibrary::new(defaults.clone());
        Self::assemble(client, settings, library, defaults, None)
    }

    /// A studio backed by `store`; previously saved prompts are loaded and
    /// the most recent one becomes current.
    pub fn with_store(
        client: Arc<dyn LlmClient>,
        settings: &Settings,
        store: Box<dyn PromptPersistence>,
    ) -> Result<Self> {
        let defaults = PromptDefaults::from(settings);
        let library = PromptLibrary::load(store.as_ref(), defaults.clone())?;
        Ok(Self::assemble(client, settings, library, defaults, Some(store)))
    }

    fn assemble(
        client: Arc<dyn LlmClient>,
        settings: &Settings,
        mut library: PromptLibrary,
        defaults: PromptDefaults,
        store: Option<Box<dyn PromptPersistence>>,
    ) -> Self {
        let mut workspace = Workspace::new(&defaults);
        library.ensure_current(&mut workspace);
        let studio = Self {
            workspace,
            library,
            session: ChatSession::new(client),
            sync_policy: settings.library.sync_policy,
            store,
        };
        studio.reinitialize();
        studio
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn library(&self) -> &PromptLibrary {
        &self.library
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn sync_policy(&self) -> SyncPolicy {
        self.sync_policy
    }

    pub fn set_sync_policy(&mut self, policy: SyncPolicy) {
        self.sync_policy = policy;
    }

    /// Push the workspace parameters (and its finished turns) into a new
    /// provider context.
    fn reinitialize(&self) {
        let ws = &self.workspace;
        self.session.initialize_with_history(
            ws.model_id.clone(),
            Some(ws.system_instruction.clone()),
            ws.config,
            session::history_from_messages(ws.messages.all()),
        );
    }

    pub fn set_model(&mut self, model_id: impl Into<String>) {
        self.workspace.model_id = model_id.into();
        self.reinitialize();
    }

    pub fn set_system_instruction(&mut self, instruction: impl Into<String>) {
        self.workspace.system_instruction = instruction.into();
        self.reinitialize();
    }

    pub fn set_config(&mut self, config: GenerationConfig) {
        self.workspace.config = config;
        self.reinitialize();
    }

    pub fn new_chat(&mut self) -> String {
        let id = self.library.create_new(&mut self.workspace);
        self.reinitialize();
        id
    }

    /// Switch to a saved prompt. Unknown ids leave everything as it was.
    pub fn select(&mut self, id: &str) -> bool {
        match self.library.select(id, &mut self.workspace) {
            Ok(()) => {
                self.reinitialize();
                true
            }
            Err(e) => {
                tracing::debug!("{}", e);
                false
            }
        }
    }

    /// Delete a saved prompt. Unknown ids are ignored.
    pub fn delete(&mut self, id: &str) -> bool {
        let was_current = self.library.current_id() == Some(id);
        match self.library.delete(id, &mut self.workspace) {
            Ok(removed) => {
                if let Some(ref store) = self.store {
                    if let Err(e) = store.delete(&removed.id) {
                        tracing::warn!("Failed to delete saved prompt {}: {}", removed.id, e);
                    }
                }
                if was_current {
                    self.reinitialize();
                }
                true
            }
            Err(e) => {
                tracing::debug!("{}", e);
                false
            }
        }
    }

    fn persist_current(&self) -> Result<()> {
        match (&self.store, self.library.current()) {
            (Some(store), Some(prompt)) => store.save(prompt),
            _ => Ok(()),
        }
    }

    /// Write the workspace into the current library entry (and the store).
    pub fn save(&mut self) -> Result<Option<SavedPrompt>> {
        let saved = self.library.save(&self.workspace).cloned();
        if saved.is_some() {
            self.persist_current()?;
        }
        Ok(saved)
    }

    pub fn rename(&mut self, new_name: &str) -> Result<bool> {
        if !self.library.rename(new_name, &mut self.workspace) {
            return Ok(false);
        }
        self.persist_current()?;
        Ok(true)
    }

    fn mirror(&mut self) {
        if self.sync_policy != SyncPolicy::OnSend {
            return;
        }
        if self.library.mirror_messages(&self.workspace).is_some() {
            if let Err(e) = self.persist_current() {
                tracing::warn!("Failed to persist conversation: {}", e);
            }
        }
    }

    pub fn attach(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.workspace.pending.extend(attachments);
    }

    /// Read and queue files for the next message. Returns how many made it.
    pub async fn attach_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let attachments = attachment::ingest_paths(paths).await;
        let count = attachments.len();
        self.attach(attachments);
        count
    }

    pub fn remove_attachment(&mut self, id: &str) -> bool {
        self.workspace.pending.remove(id).is_some()
    }

    /// Send `text` plus the pending attachments and stream the reply into
    /// the conversation. Returns the id of the model message.
    ///
    /// Generation failures do not surface here: they end up on the model
    /// message as `error` with replacement text.
    pub async fn send<F>(&mut self, text: &str, mut on_progress: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() && self.workspace.pending.is_empty() {
            return Err(StudioError::EmptyMessage);
        }
        if !self.session.is_initialized() {
            return Err(StudioError::NotInitialized);
        }

        let attachments = self.workspace.pending.take();
        let user = Message::user(text, attachments.clone());
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();
        self.workspace.messages.append([user, placeholder])?;
        self.mirror();

        let session = &self.session;
        let messages = &mut self.workspace.messages;
        let result = session
            .send_stream(text, &attachments, |full| {
                messages.update_by_id(&placeholder_id, MessagePatch::text(full));
                on_progress(full);
            })
            .await;

        match result {
            Ok(_) => {
                self.workspace
                    .messages
                    .update_by_id(&placeholder_id, MessagePatch::finished());
            }
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                self.workspace
                    .messages
                    .update_by_id(&placeholder_id, MessagePatch::failed(format!("Error: {e}")));
            }
        }
        self.mirror();

        Ok(placeholder_id)
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot::from(&self.workspace)
    }

    pub fn export(&self, target: &str) -> String {
        export::project(&self.snapshot(), target)
    }
}
