use super::persistence::PromptPersistence;
use super::prompt::{PromptDefaults, SavedPrompt};
use super::workspace::Workspace;
use crate::conversation::MessagePatch;
use crate::error::{Result, StudioError};

/// Saved prompts, newest first, plus which one the workspace is bound to.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    prompts: Vec<SavedPrompt>,
    current_id: Option<String>,
    defaults: PromptDefaults,
}

impl PromptLibrary {
    pub fn new(defaults: PromptDefaults) -> Self {
        Self {
            prompts: Vec::new(),
            current_id: None,
            defaults,
        }
    }

    /// Rebuild a library from persisted entries, most recently updated first.
    /// Nothing is current until [`ensure_current`](Self::ensure_current) or
    /// [`select`](Self::select) runs.
    ///
    /// A reply saved mid-stream can never finish, so it comes back failed.
    pub fn from_prompts(mut prompts: Vec<SavedPrompt>, defaults: PromptDefaults) -> Self {
        prompts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        for message in prompts
            .iter_mut()
            .flat_map(|p| p.messages.iter_mut())
            .filter(|m| m.is_streaming)
        {
            message.apply(MessagePatch::interrupted());
        }
        Self {
            prompts,
            current_id: None,
            defaults,
        }
    }

    /// Restore every entry `store` holds.
    pub fn load(store: &dyn PromptPersistence, defaults: PromptDefaults) -> Result<Self> {
        let prompts = store.load_all()?;
        tracing::info!("Loaded {} saved prompts", prompts.len());
        Ok(Self::from_prompts(prompts, defaults))
    }

    pub fn defaults(&self) -> &PromptDefaults {
        &self.defaults
    }

    pub fn prompts(&self) -> &[SavedPrompt] {
        &self.prompts
    }

    pub fn get(&self, id: &str) -> Option<&SavedPrompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&SavedPrompt> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    fn current_mut(&mut self) -> Option<&mut SavedPrompt> {
        let id = self.current_id.as_deref()?;
        self.prompts.iter_mut().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Start a fresh conversation at the front of the library and reset the
    /// workspace to defaults. Returns the new id.
    pub fn create_new(&mut self, workspace: &mut Workspace) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.prompts.insert(0, SavedPrompt::new(id.clone(), &self.defaults));
        self.current_id = Some(id.clone());
        workspace.reset(&self.defaults);
        tracing::debug!(id = %id, "Created new prompt");
        id
    }

    /// Load a saved prompt into the workspace and make it current.
    pub fn select(&mut self, id: &str, workspace: &mut Workspace) -> Result<()> {
        let prompt = self
            .get(id)
            .ok_or_else(|| StudioError::UnknownPromptId(id.to_string()))?;
        workspace.load(prompt);
        self.current_id = Some(id.to_string());
        Ok(())
    }

    /// Remove a prompt. Deleting the current one moves the workspace to the
    /// next entry, or to a brand new conversation when none is left.
    pub fn delete(&mut self, id: &str, workspace: &mut Workspace) -> Result<SavedPrompt> {
        let pos = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StudioError::UnknownPromptId(id.to_string()))?;
        let removed = self.prompts.remove(pos);

        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
            self.ensure_current(workspace);
        }
        Ok(removed)
    }

    /// Make sure some prompt is current: the first one if any exist,
    /// otherwise a new one.
    pub fn ensure_current(&mut self, workspace: &mut Workspace) {
        if self.current().is_some() {
            return;
        }
        match self.prompts.first().map(|p| p.id.clone()) {
            Some(first) => {
                // first() came from the list, so select cannot miss
                let _ = self.select(&first, workspace);
            }
            None => {
                self.create_new(workspace);
            }
        }
    }

    /// Overwrite the current entry with the workspace. No-op without one.
    pub fn save(&mut self, workspace: &Workspace) -> Option<&SavedPrompt> {
        let prompt = self.current_mut()?;
        prompt.name = workspace.prompt_name.clone();
        prompt.messages = workspace.messages.to_vec();
        prompt.system_instruction = workspace.system_instruction.clone();
        prompt.config = workspace.config;
        prompt.model_id = workspace.model_id.clone();
        prompt.touch();
        Some(prompt)
    }

    /// Copy only the message log into the current entry.
    pub fn mirror_messages(&mut self, workspace: &Workspace) -> Option<&SavedPrompt> {
        let prompt = self.current_mut()?;
        prompt.messages = workspace.messages.to_vec();
        prompt.touch();
        Some(prompt)
    }

    /// Rename the current entry. Returns false when nothing is current.
    pub fn rename(&mut self, new_name: &str, workspace: &mut Workspace) -> bool {
        let Some(prompt) = self.current_mut() else {
            return false;
        };
        prompt.name = new_name.to_string();
        workspace.prompt_name = new_name.to_string();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Message;
    use crate::llm::GenerationConfig;

    fn setup() -> (PromptLibrary, Workspace) {
        let mut lib = PromptLibrary::default();
        let mut ws = Workspace::default();
        lib.create_new(&mut ws);
        (lib, ws)
    }

    #[test]
    fn test_create_new_inserts_at_front_and_resets() {
        let (mut lib, mut ws) = setup();
        let first = lib.current_id().unwrap().to_string();
        ws.system_instruction = "custom".into();
        ws.messages.append([Message::user("hi", vec![])]).unwrap();

        let second = lib.create_new(&mut ws);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.prompts()[0].id, second);
        assert_eq!(lib.prompts()[1].id, first);
        assert_eq!(lib.current_id(), Some(second.as_str()));
        assert!(ws.messages.is_empty());
        assert_eq!(ws.system_instruction, lib.defaults().system_instruction);
    }

    #[test]
    fn test_select_unknown_leaves_workspace() {
        let (mut lib, mut ws) = setup();
        ws.prompt_name = "draft".into();
        let err = lib.select("missing", &mut ws).unwrap_err();
        assert!(matches!(err, StudioError::UnknownPromptId(_)));
        assert_eq!(ws.prompt_name, "draft");
    }

    #[test]
    fn test_save_then_select_is_idempotent() {
        let (mut lib, mut ws) = setup();
        ws.prompt_name = "Poems".into();
        ws.system_instruction = "Rhyme everything".into();
        ws.model_id = "gemini-3-pro-preview".into();
        ws.config = GenerationConfig {
            temperature: 0.4,
            top_p: 0.5,
            top_k: 10,
            max_output_tokens: 1000,
        };
        ws.messages
            .append([Message::user("roses", vec![]), Message::model("are red")])
            .unwrap();

        lib.save(&ws).unwrap();
        let before = ws.clone();
        let id = lib.current_id().unwrap().to_string();
        lib.select(&id, &mut ws).unwrap();

        assert_eq!(ws.prompt_name, before.prompt_name);
        assert_eq!(ws.messages, before.messages);
        assert_eq!(ws.system_instruction, before.system_instruction);
        assert_eq!(ws.config, before.config);
        assert_eq!(ws.model_id, before.model_id);
    }

    #[test]
    fn test_save_without_current_is_noop() {
        let mut lib = PromptLibrary::default();
        let ws = Workspace::default();
        assert!(lib.save(&ws).is_none());
        assert!(lib.is_empty());
    }

    #[test]
    fn test_delete_current_promotes_first() {
        let (mut lib, mut ws) = setup();
        let older = lib.current_id().unwrap().to_string();
        ws.prompt_name = "older".into();
        lib.save(&ws).unwrap();
        let newer = lib.create_new(&mut ws);

        lib.delete(&newer, &mut ws).unwrap();
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.current_id(), Some(older.as_str()));
        assert_eq!(ws.prompt_name, "older");
    }

    #[test]
    fn test_delete_last_creates_fresh() {
        let (mut lib, mut ws) = setup();
        let only = lib.current_id().unwrap().to_string();
        lib.delete(&only, &mut ws).unwrap();
        assert_eq!(lib.len(), 1);
        let current = lib.current_id().unwrap();
        assert_ne!(current, only);
    }

    #[test]
    fn test_delete_never_leaves_library_empty() {
        let (mut lib, mut ws) = setup();
        for _ in 0..3 {
            lib.create_new(&mut ws);
        }
        for _ in 0..6 {
            let id = lib.current_id().unwrap().to_string();
            lib.delete(&id, &mut ws).unwrap();
            assert!(!lib.is_empty());
            assert!(lib.current().is_some());
        }
    }

    #[test]
    fn test_delete_other_keeps_current() {
        let (mut lib, mut ws) = setup();
        let first = lib.current_id().unwrap().to_string();
        let second = lib.create_new(&mut ws);
        lib.delete(&first, &mut ws).unwrap();
        assert_eq!(lib.current_id(), Some(second.as_str()));
    }

    #[test]
    fn test_rename_touches_only_name() {
        let (mut lib, mut ws) = setup();
        ws.messages.append([Message::user("unsaved", vec![])]).unwrap();
        assert!(lib.rename("Renamed", &mut ws));
        let current = lib.current().unwrap();
        assert_eq!(current.name, "Renamed");
        assert!(current.messages.is_empty());
        assert_eq!(ws.prompt_name, "Renamed");
    }

    #[test]
    fn test_mirror_messages() {
        let (mut lib, mut ws) = setup();
        ws.system_instruction = "not mirrored".into();
        ws.messages.append([Message::user("hello", vec![])]).unwrap();
        lib.mirror_messages(&ws).unwrap();
        let current = lib.current().unwrap();
        assert_eq!(current.messages.len(), 1);
        assert_ne!(current.system_instruction, "not mirrored");
    }

    #[test]
    fn test_from_prompts_sorts_newest_first() {
        let defaults = PromptDefaults::default();
        let mut a = SavedPrompt::new("a", &defaults);
        a.updated_at = 10;
        let mut b = SavedPrompt::new("b", &defaults);
        b.updated_at = 20;
        let mut lib = PromptLibrary::from_prompts(vec![a, b], defaults);
        assert!(lib.current().is_none());

        let mut ws = Workspace::default();
        lib.ensure_current(&mut ws);
        assert_eq!(lib.current_id(), Some("b"));
    }

    #[test]
    fn test_load_orders_newest_first() {
        let store = crate::library::MemoryPromptStore::new();
        let defaults = PromptDefaults::default();
        for (id, at) in [("old", 1), ("new", 3), ("mid", 2)] {
            let mut p = SavedPrompt::new(id, &defaults);
            p.updated_at = at;
            store.save(&p).unwrap();
        }

        let lib = PromptLibrary::load(&store, defaults).unwrap();
        let ids: Vec<&str> = lib.prompts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert!(lib.current_id().is_none());
    }

    #[test]
    fn test_mirror_bumps_updated_at() {
        let (mut lib, mut ws) = setup();
        lib.prompts[0].updated_at = 0;
        ws.messages.append([Message::user("hi", vec![])]).unwrap();

        let mirrored = lib.mirror_messages(&ws).unwrap();
        assert_eq!(mirrored.messages.len(), 1);
        assert!(mirrored.updated_at > 0);
    }

    #[test]
    fn test_restored_streaming_reply_is_marked_failed() {
        let defaults = PromptDefaults::default();
        let mut prompt = SavedPrompt::new("p", &defaults);
        let mut partial = Message::placeholder();
        partial.text = "Half an ans".into();
        prompt.messages = vec![Message::user("question", vec![]), partial];

        let lib = PromptLibrary::from_prompts(vec![prompt], defaults);
        let restored = &lib.prompts()[0].messages;
        assert!(!restored[0].error);
        assert!(!restored[1].is_streaming);
        assert!(restored[1].error);
        assert_eq!(restored[1].text, "Half an ans");
    }
}
