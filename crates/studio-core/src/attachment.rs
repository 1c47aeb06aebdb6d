//! Turning user-selected files into attachment records.

use crate::constants::defaults;
use crate::error::StudioError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Text,
    Audio,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub name: String,
    /// A `data:` URL for images and audio, decoded text otherwise.
    pub data: String,
}

impl Attachment {
    /// The payload with any `data:<mime>;base64,` prefix removed.
    pub fn base64_payload(&self) -> &str {
        match self.data.split_once("base64,") {
            Some((_, payload)) => payload,
            None => &self.data,
        }
    }

    /// Binary media goes to the provider inline, everything else as text.
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, AttachmentKind::Image | AttachmentKind::Audio)
    }
}

/// A file as handed over by whatever picked it: name, declared type, contents.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }
}

/// Decide what kind of attachment a file becomes. Never fails.
pub fn classify(mime_type: &str, bytes: &[u8]) -> AttachmentKind {
    if mime_type.starts_with("image/") {
        AttachmentKind::Image
    } else if mime_type.starts_with("audio/") {
        AttachmentKind::Audio
    } else if std::str::from_utf8(bytes).is_ok() {
        AttachmentKind::Text
    } else {
        AttachmentKind::File
    }
}

pub fn ingest_file(file: RawFile) -> Attachment {
    let mime_type = file
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| defaults::MIME_OCTET_STREAM.to_string());
    let kind = classify(&mime_type, &file.bytes);

    let data = match kind {
        AttachmentKind::Image | AttachmentKind::Audio => format!(
            "data:{};base64,{}",
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(&file.bytes)
        ),
        AttachmentKind::Text => String::from_utf8(file.bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        AttachmentKind::File => defaults::BINARY_PLACEHOLDER.to_string(),
    };

    Attachment {
        id: uuid::Uuid::new_v4().to_string(),
        kind,
        mime_type,
        name: file.name,
        data,
    }
}

pub fn ingest_files(files: Vec<RawFile>) -> Vec<Attachment> {
    files.into_iter().map(ingest_file).collect()
}

/// Best-effort MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

async fn read_path(path: PathBuf) -> Result<RawFile, StudioError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| StudioError::file_read(path.display().to_string(), e.to_string()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(RawFile::new(
        name,
        mime_from_path(&path).map(str::to_string),
        bytes,
    ))
}

/// Read every path concurrently. Unreadable files are logged and skipped;
/// the rest keep their input order.
pub async fn ingest_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<Attachment> {
    let reads = paths.iter().map(|p| read_path(p.as_ref().to_path_buf()));
    futures::future::join_all(reads)
        .await
        .into_iter()
        .filter_map(|result| match result {
            Ok(file) => Some(ingest_file(file)),
            Err(e) => {
                tracing::warn!("Skipping attachment: {}", e);
                None
            }
        })
        .collect()
}

/// Attachments waiting to go out with the next message.
#[derive(Debug, Clone, Default)]
pub struct PendingAttachments {
    items: Vec<Attachment>,
}

impl PendingAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to what is already pending.
    pub fn extend(&mut self, attachments: impl IntoIterator<Item = Attachment>) {
        self.items.extend(attachments);
    }

    pub fn remove(&mut self, id: &str) -> Option<Attachment> {
        let pos = self.items.iter().position(|a| a.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Hand everything over for a send, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
