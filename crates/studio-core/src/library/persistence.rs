use super::prompt::SavedPrompt;
use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where saved prompts live between runs, keyed by prompt id.
pub trait PromptPersistence: Send + Sync {
    fn load_all(&self) -> Result<Vec<SavedPrompt>, StudioError>;
    fn save(&self, prompt: &SavedPrompt) -> Result<(), StudioError>;
    fn delete(&self, id: &str) -> Result<(), StudioError>;
}

impl<T: PromptPersistence + ?Sized> PromptPersistence for std::sync::Arc<T> {
    fn load_all(&self) -> Result<Vec<SavedPrompt>, StudioError> {
        (**self).load_all()
    }

    fn save(&self, prompt: &SavedPrompt) -> Result<(), StudioError> {
        (**self).save(prompt)
    }

    fn delete(&self, id: &str) -> Result<(), StudioError> {
        (**self).delete(id)
    }
}

/// Summary of a saved prompt kept in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub name: String,
    pub model_id: String,
    pub message_count: usize,
    pub updated_at: i64,
}

impl From<&SavedPrompt> for PromptMetadata {
    fn from(prompt: &SavedPrompt) -> Self {
        Self {
            id: prompt.id.clone(),
            name: prompt.name.clone(),
            model_id: prompt.model_id.clone(),
            message_count: prompt.messages.len(),
            updated_at: prompt.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PromptIndex {
    prompts: Vec<PromptMetadata>,
}

/// Stores each prompt as `<id>.json` next to an `index.json`.
pub struct JsonPromptStore {
    base_dir: PathBuf,
}

impl JsonPromptStore {
    /// Open the store in the default directory (~/.studio/prompts/)
    pub fn new() -> Result<Self, StudioError> {
        let home = dirs::home_dir().ok_or_else(|| {
            StudioError::Config("Could not determine home directory".to_string())
        })?;
        Self::with_dir(home.join(".studio").join("prompts"))
    }

    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self, StudioError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            StudioError::Config(format!("Failed to create prompts directory: {}", e))
        })?;
        Ok(Self { base_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.json")
    }

    fn prompt_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }

    /// Write through a temporary file so a crash never leaves half a file.
    fn write_atomic(path: &Path, contents: &str) -> Result<(), StudioError> {
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|e| {
            StudioError::Config(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        fs::rename(&tmp_path, path).map_err(|e| {
            StudioError::Config(format!("Failed to rename {}: {}", tmp_path.display(), e))
        })
    }

    fn load_index(&self) -> Result<PromptIndex, StudioError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(PromptIndex::default());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| StudioError::Config(format!("Failed to read prompt index: {}", e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| StudioError::Config(format!("Failed to parse prompt index: {}", e)))
    }

    fn save_index(&self, index: &PromptIndex) -> Result<(), StudioError> {
        let contents = serde_json::to_string_pretty(index)?;
        Self::write_atomic(&self.index_path(), &contents)
    }

    pub fn load(&self, id: &str) -> Result<SavedPrompt, StudioError> {
        let path = self.prompt_path(id);
        if !path.exists() {
            return Err(StudioError::UnknownPromptId(id.to_string()));
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| StudioError::Config(format!("Failed to read prompt {}: {}", id, e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| StudioError::Config(format!("Failed to parse prompt {}: {}", id, e)))
    }

    /// Index entries, most recently updated first.
    pub fn list(&self) -> Result<Vec<PromptMetadata>, StudioError> {
        Ok(self.load_index()?.prompts)
    }
}

impl PromptPersistence for JsonPromptStore {
    fn load_all(&self) -> Result<Vec<SavedPrompt>, StudioError> {
        let index = self.load_index()?;
        let mut prompts = Vec::with_capacity(index.prompts.len());
        for meta in &index.prompts {
            match self.load(&meta.id) {
                Ok(prompt) => prompts.push(prompt),
                Err(e) => tracing::warn!("Skipping saved prompt {}: {}", meta.id, e),
            }
        }
        Ok(prompts)
    }

    fn save(&self, prompt: &SavedPrompt) -> Result<(), StudioError> {
        let contents = serde_json::to_string_pretty(prompt)?;
        Self::write_atomic(&self.prompt_path(&prompt.id), &contents)?;

        let mut index = self.load_index()?;
        index.prompts.retain(|m| m.id != prompt.id);
        index.prompts.push(PromptMetadata::from(prompt));
        index.prompts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.save_index(&index)
    }

    fn delete(&self, id: &str) -> Result<(), StudioError> {
        let path = self.prompt_path(id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StudioError::Config(format!("Failed to delete prompt file: {}", e))
            })?;
        }

        let mut index = self.load_index()?;
        index.prompts.retain(|m| m.id != id);
        self.save_index(&index)
    }
}

/// Keeps prompts for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryPromptStore {
    prompts: Mutex<Vec<SavedPrompt>>,
}

impl MemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn prompts(&self) -> std::sync::MutexGuard<'_, Vec<SavedPrompt>> {
        self.prompts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PromptPersistence for MemoryPromptStore {
    fn load_all(&self) -> Result<Vec<SavedPrompt>, StudioError> {
        Ok(self.prompts().clone())
    }

    fn save(&self, prompt: &SavedPrompt) -> Result<(), StudioError> {
        let mut prompts = self.prompts();
        prompts.retain(|p| p.id != prompt.id);
        prompts.push(prompt.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StudioError> {
        self.prompts().retain(|p| p.id != id);
        Ok(())
    }
}
