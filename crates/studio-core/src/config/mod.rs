use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{defaults, endpoints};
use crate::error::StudioError;
use crate::llm::{GeminiClient, GenerationConfig, LlmClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub model: String,
}

/// When the live workspace is copied into the current library entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Mirror the message log after every send and again once the reply
    /// has finished streaming.
    #[default]
    OnSend,
    /// Only an explicit save writes to the library.
    ExplicitSave,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LibrarySettings {
    /// Directory for saved prompts; `None` means ~/.studio/prompts.
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub sync_policy: SyncPolicy,
}

fn default_system_instruction() -> String {
    defaults::SYSTEM_INSTRUCTION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_instruction: default_system_instruction(),
            gemini: GeminiSettings {
                api_key_env: endpoints::GEMINI_API_KEY_ENV.to_string(),
                base_url: None,
                model: defaults::MODEL.to_string(),
            },
            generation: GenerationConfig::default(),
            library: LibrarySettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studio")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring invalid config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Could not read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), StudioError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StudioError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| StudioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.gemini.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Build the Gemini client from the current settings.
    pub fn build_client(&self) -> Result<Arc<dyn LlmClient>, StudioError> {
        let api_key = self.api_key().ok_or_else(|| {
            StudioError::Config(format!(
                "No API key found; set the {} environment variable",
                self.gemini.api_key_env
            ))
        })?;
        let mut client = GeminiClient::new(api_key);
        if let Some(ref url) = self.gemini.base_url {
            client = client.with_base_url(url.clone());
        }
        Ok(Arc::new(client))
    }
}
