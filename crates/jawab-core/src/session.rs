// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::fmt;

use jawab_client::{IngestStatus, UploadReceipt};
use jawab_config::Mode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::Turn;

/// Lifecycle position of the session's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Absent,
    Uploading,
    Ready,
    Failed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentStatus::Absent => "absent",
            DocumentStatus::Uploading => "uploading",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Failed => "failed",
        })
    }
}

/// Per-status data.  The backend id only exists once the document is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    Absent,
    Uploading {
        file_name: String,
    },
    Ready {
        file_name: String,
        id: String,
        message: Option<String>,
        ingest: IngestStatus,
        cached: bool,
    },
    Failed {
        file_name: String,
        error: String,
    },
}

/// The document currently bound to the session, scoped to one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    mode: Mode,
    state: DocumentState,
}

impl Document {
    pub(crate) fn absent(mode: Mode) -> Self {
        Self {
            mode,
            state: DocumentState::Absent,
        }
    }

    pub(crate) fn uploading(mode: Mode, file_name: impl Into<String>) -> Self {
        Self {
            mode,
            state: DocumentState::Uploading {
                file_name: file_name.into(),
            },
        }
    }

    pub(crate) fn ready(mode: Mode, file_name: impl Into<String>, receipt: &UploadReceipt) -> Self {
        Self {
            mode,
            state: DocumentState::Ready {
                file_name: file_name.into(),
                id: receipt.document_id.clone(),
                message: receipt.message.clone(),
                ingest: receipt.ingest,
                cached: receipt.cached,
            },
        }
    }

    pub(crate) fn failed(mode: Mode, file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            mode,
            state: DocumentState::Failed {
                file_name: file_name.into(),
                error: error.into(),
            },
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn status(&self) -> DocumentStatus {
        match self.state {
            DocumentState::Absent => DocumentStatus::Absent,
            DocumentState::Uploading { .. } => DocumentStatus::Uploading,
            DocumentState::Ready { .. } => DocumentStatus::Ready,
            DocumentState::Failed { .. } => DocumentStatus::Failed,
        }
    }

    /// Backend identifier; `Some` exactly when the status is `Ready`.
    pub fn id(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Ready { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Absent => None,
            DocumentState::Uploading { file_name }
            | DocumentState::Ready { file_name, .. }
            | DocumentState::Failed { file_name, .. } => Some(file_name),
        }
    }

    /// Text for the status line: confirmation when ready, reason when failed.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            DocumentState::Ready { message, .. } => message.as_deref(),
            DocumentState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// State of one chat session.  Only the controller mutates it; callers get
/// read-only copies via `SessionController::snapshot`.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    pub(crate) mode: Mode,
    pub(crate) document: Document,
    pub(crate) conversation: Vec<Turn>,
    pub(crate) pending: bool,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode,
            document: Document::absent(mode),
            conversation: Vec::new(),
            pending: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    /// True while an upload or a question is awaiting the backend.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop the document and every turn; the mode is kept.
    pub(crate) fn clear_document(&mut self) {
        self.document = Document::absent(self.mode);
        self.conversation.clear();
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
