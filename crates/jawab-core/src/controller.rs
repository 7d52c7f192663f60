// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, MutexGuard};

use jawab_client::{
    Backend, ChatClient, ChatError, ChatRequest, DocumentClient, DocumentUpload, UploadReceipt,
};
use jawab_config::{Mode, SessionConfig};
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::history::{history_for, Turn};
use crate::session::{Document, Session};

/// How a question was resolved.  Either way exactly one assistant turn was
/// appended to the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered { turn: Turn, cached: bool },
    /// The exchange failed; `turn` is the fallback reply.
    Fallback { turn: Turn, error: ChatError },
}

impl AskOutcome {
    pub fn turn(&self) -> &Turn {
        match self {
            AskOutcome::Answered { turn, .. } | AskOutcome::Fallback { turn, .. } => turn,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AskOutcome::Fallback { .. })
    }
}

fn lock(m: &Mutex<Session>) -> MutexGuard<'_, Session> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks the session busy for the lifetime of one backend call.
///
/// `settle` clears the flag and applies the result.  If the owning future is
/// dropped first, `on_abandon` repairs the session instead so the flag never
/// stays set.
struct InFlight<'a> {
    session: &'a Mutex<Session>,
    on_abandon: fn(&mut Session),
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn settle<R>(mut self, apply: impl FnOnce(&mut Session) -> R) -> R {
        self.settled = true;
        let mut session = lock(self.session);
        session.pending = false;
        apply(&mut *session)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut session = lock(self.session);
        session.pending = false;
        (self.on_abandon)(&mut *session);
        warn!(session = session.id(), "request abandoned before the backend replied");
    }
}

/// Drives one chat session: the sole mutator of its [`Session`].
///
/// All operations take `&self`.  The session lock is only held for state
/// transitions, never across a backend call, so front-ends can keep reading
/// snapshots while a request is in flight.
pub struct SessionController {
    documents: Arc<dyn DocumentClient>,
    chat: Arc<dyn ChatClient>,
    config: SessionConfig,
    session: Mutex<Session>,
}

impl SessionController {
    pub fn new(backend: Backend, config: SessionConfig) -> Self {
        Self::with_clients(backend.documents, backend.chat, config)
    }

    pub fn with_clients(
        documents: Arc<dyn DocumentClient>,
        chat: Arc<dyn ChatClient>,
        config: SessionConfig,
    ) -> Self {
        let session = Session::new(config.default_mode);
        debug!(
            session = session.id(),
            mode = %session.mode(),
            documents = documents.name(),
            chat = chat.name(),
            "session started"
        );
        Self {
            documents,
            chat,
            config,
            session: Mutex::new(session),
        }
    }

    /// Read-only copy of the current state for rendering.
    pub fn snapshot(&self) -> Session {
        lock(&self.session).clone()
    }

    pub fn mode(&self) -> Mode {
        lock(&self.session).mode
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.session).pending
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn begin(&self, on_abandon: fn(&mut Session)) -> InFlight<'_> {
        InFlight {
            session: &self.session,
            on_abandon,
            settled: false,
        }
    }

    /// Submit a document for the current mode.
    ///
    /// Replaces any previous document and clears the conversation.  On
    /// failure the document is left `failed` with the backend's reason and
    /// the error is returned; the session stays usable for a retry.
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, SessionError> {
        let (mode, flight) = {
            let mut session = lock(&self.session);
            if session.pending {
                return Err(SessionError::Busy);
            }
            if upload.is_empty() {
                return Err(SessionError::NoFileSelected);
            }
            let mode = session.mode;
            session.conversation.clear();
            session.document = Document::uploading(mode, &upload.file_name);
            session.pending = true;
            info!(
                session = session.id(),
                %mode,
                file = %upload.file_name,
                bytes = upload.bytes.len(),
                "uploading document"
            );
            (mode, self.begin(|s| {
                let file_name = s.document.file_name().unwrap_or_default().to_owned();
                s.document = Document::failed(s.mode, file_name, "upload was cancelled");
            }))
        };

        let result = self.documents.submit(&upload, mode).await;

        flight.settle(|session| match result {
            Ok(receipt) => {
                info!(
                    session = session.id(),
                    document_id = %receipt.document_id,
                    ingest = ?receipt.ingest,
                    cached = receipt.cached,
                    "document ready"
                );
                session.document = Document::ready(mode, &upload.file_name, &receipt);
                Ok(receipt)
            }
            Err(e) => {
                warn!(session = session.id(), kind = e.kind(), "upload failed: {e}");
                session.document = Document::failed(mode, &upload.file_name, e.to_string());
                Err(SessionError::Upload(e))
            }
        })
    }

    /// Switch to `mode`.  Returns `false` when it is already current, in
    /// which case nothing changes.  Otherwise the document and conversation
    /// are discarded.
    pub fn set_mode(&self, mode: Mode) -> Result<bool, SessionError> {
        let mut session = lock(&self.session);
        if session.pending {
            return Err(SessionError::Busy);
        }
        if session.mode == mode {
            return Ok(false);
        }
        info!(session = session.id(), from = %session.mode, to = %mode, "mode changed");
        session.mode = mode;
        session.clear_document();
        Ok(true)
    }

    /// Ask a question about the current document.
    ///
    /// The user turn is appended immediately.  Backend failures do not
    /// surface as `Err`: a fallback reply is appended and reported through
    /// [`AskOutcome::Fallback`].
    pub async fn ask(&self, question: &str) -> Result<AskOutcome, SessionError> {
        let question = question.trim();
        let (request, flight) = {
            let mut session = lock(&self.session);
            if session.pending {
                return Err(SessionError::Busy);
            }
            if question.is_empty() {
                return Err(SessionError::EmptyQuestion);
            }
            let document_id = session.document.id().map(str::to_owned);
            if document_id.is_none() && self.config.requires_document(session.mode) {
                return Err(SessionError::DocumentNotReady {
                    status: session.document.status(),
                });
            }

            // Window over the turns preceding this question.
            let history = history_for(&session.conversation, self.config.history_window);
            session.conversation.push(Turn::user(question));
            session.pending = true;
            debug!(
                session = session.id(),
                mode = %session.mode,
                document_id = document_id.as_deref().unwrap_or("-"),
                history = history.len(),
                "asking"
            );
            let request = ChatRequest {
                question: question.to_owned(),
                history,
                use_case: session.mode,
                document_id,
            };
            (request, self.begin(|s| s.conversation.push(Turn::fallback())))
        };

        let result = self.chat.ask(request).await;

        Ok(flight.settle(|session| match result {
            Ok(payload) => {
                debug!(
                    session = session.id(),
                    sources = payload.sources.len(),
                    cached = payload.cached,
                    "answer received"
                );
                let turn = Turn::assistant(payload.answer, payload.sources);
                session.conversation.push(turn.clone());
                AskOutcome::Answered {
                    turn,
                    cached: payload.cached,
                }
            }
            Err(error) => {
                warn!(session = session.id(), kind = error.kind(), "chat failed: {error}");
                let turn = Turn::fallback();
                session.conversation.push(turn.clone());
                AskOutcome::Fallback { turn, error }
            }
        }))
    }

    /// Drop the document and the conversation, keeping the mode.
    pub fn reset_document(&self) -> Result<(), SessionError> {
        let mut session = lock(&self.session);
        if session.pending {
            return Err(SessionError::Busy);
        }
        info!(session = session.id(), mode = %session.mode, "document reset");
        session.clear_document();
        Ok(())
    }
}
