use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Chat session not initialized")]
    NotInitialized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to read file {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("Unknown prompt id: {0}")]
    UnknownPromptId(String),

    #[error("A message is already being generated")]
    Busy,

    #[error("Nothing to send: message text and attachments are both empty")]
    EmptyMessage,

    #[error("Duplicate message id: {0}")]
    DuplicateMessageId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StudioError {
    pub fn file_read(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Errors that happen while a response is being produced, as opposed to
    /// misuse of the session.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
