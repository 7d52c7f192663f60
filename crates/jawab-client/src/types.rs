// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::Path;

use jawab_config::Mode;
use serde::{Deserialize, Serialize};

// ─── Upload ───────────────────────────────────────────────────────────────────

/// A file selected for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// Original file name, forwarded to the backend with the multipart part.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk.  The file name part of `path` becomes
    /// [`DocumentUpload::file_name`].
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        let ext = Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("md") => "text/markdown",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "application/octet-stream",
        }
    }
}

/// Ingestion state reported by the backend alongside a new document id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Indexing continues in the background.
    Processing,
    /// The content was already indexed for this mode.
    Done,
    /// The backend did not say.
    #[default]
    Unknown,
}

impl IngestStatus {
    pub(crate) fn from_wire(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_uppercase).as_deref() {
            Some("PROCESSING") => IngestStatus::Processing,
            Some("DONE") => IngestStatus::Done,
            _ => IngestStatus::Unknown,
        }
    }
}

/// Successful result of a document submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Opaque identifier assigned by the backend.  Forwarded unchanged with
    /// every question about this document.
    pub document_id: String,
    /// Human-readable confirmation, if the backend sent one.
    pub message: Option<String>,
    pub ingest: IngestStatus,
    /// The backend recognised the content and reused an earlier ingestion.
    pub cached: bool,
}

impl UploadReceipt {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            message: None,
            ingest: IngestStatus::Unknown,
            cached: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// ─── Chat ─────────────────────────────────────────────────────────────────────

/// Author of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => f.write_str("user"),
            Sender::Assistant => f.write_str("assistant"),
        }
    }
}

/// A prior turn as sent upstream: sender and text only, never sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub text: String,
}

/// One question/answer exchange against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Windowed prior turns, oldest first.
    pub history: Vec<HistoryEntry>,
    pub use_case: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerPayload {
    /// Never empty.
    pub answer: String,
    /// Supporting excerpts in backend order; empty means "no citations".
    pub sources: Vec<String>,
    /// Served from the backend's query cache.
    pub cached: bool,
}

impl AnswerPayload {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            cached: false,
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}
