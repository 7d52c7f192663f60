// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use jawab_config::Mode;

use crate::{
    AnswerPayload, BackendError, ChatError, ChatRequest, DocumentUpload, IngestStatus,
    UploadError, UploadReceipt,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deterministic offline backend.  Assigns sequential document ids and
/// echoes each question back as the answer.
#[derive(Default)]
pub struct MockBackend {
    uploads: AtomicUsize,
}

#[async_trait]
impl crate::DocumentClient for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, upload: &DocumentUpload, mode: Mode) -> Result<UploadReceipt, UploadError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(UploadReceipt {
            document_id: format!("mock-doc-{n}"),
            message: Some(format!("{} ingested for {mode}", upload.file_name)),
            ingest: IngestStatus::Done,
            cached: false,
        })
    }
}

#[async_trait]
impl crate::ChatClient for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ask(&self, req: ChatRequest) -> Result<AnswerPayload, ChatError> {
        let answer = AnswerPayload::new(format!("MOCK: {}", req.question));
        Ok(match req.document_id {
            Some(id) => answer.with_sources([format!("{id} ({})", req.use_case)]),
            None => answer,
        })
    }
}

/// A pre-scripted document client.  Each call to `submit` pops the next
/// result from the front of the queue and records what was sent.
pub struct ScriptedDocumentClient {
    scripts: Mutex<Vec<Result<UploadReceipt, UploadError>>>,
    calls: AtomicUsize,
    /// Every `(upload, mode)` pair seen, in call order.
    pub requests: Arc<Mutex<Vec<(DocumentUpload, Mode)>>>,
}

impl ScriptedDocumentClient {
    pub fn new(scripts: Vec<Result<UploadReceipt, UploadError>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            calls: AtomicUsize::new(0),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: client whose first upload succeeds with `document_id`.
    pub fn accepting(document_id: impl Into<String>) -> Self {
        Self::new(vec![Ok(UploadReceipt::new(document_id))])
    }

    /// Number of `submit` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Modes of all recorded submissions.
    pub fn modes(&self) -> Vec<Mode> {
        lock(&self.requests).iter().map(|(_, m)| *m).collect()
    }
}

#[async_trait]
impl crate::DocumentClient for ScriptedDocumentClient {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn submit(&self, upload: &DocumentUpload, mode: Mode) -> Result<UploadReceipt, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push((upload.clone(), mode));
        let mut scripts = lock(&self.scripts);
        if scripts.is_empty() {
            Err(BackendError::Protocol("[no more scripts]".into()))
        } else {
            scripts.remove(0)
        }
    }
}

/// A pre-scripted chat client.  Each call to `ask` pops the next result and
/// records the request so tests can inspect the window and document id.
pub struct ScriptedChatClient {
    scripts: Mutex<Vec<Result<AnswerPayload, ChatError>>>,
    calls: AtomicUsize,
    /// Every request seen, in call order.
    pub requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedChatClient {
    pub fn new(scripts: Vec<Result<AnswerPayload, ChatError>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            calls: AtomicUsize::new(0),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: client that answers the first question with `answer`.
    pub fn always_text(answer: impl Into<String>) -> Self {
        Self::new(vec![Ok(AnswerPayload::new(answer))])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl crate::ChatClient for ScriptedChatClient {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn ask(&self, req: ChatRequest) -> Result<AnswerPayload, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(req);
        let mut scripts = lock(&self.scripts);
        if scripts.is_empty() {
            // Default fallback when all scripts are consumed
            Ok(AnswerPayload::new("[no more scripts]"))
        } else {
            scripts.remove(0)
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatClient, DocumentClient};

    fn req(question: &str, document_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            question: question.into(),
            history: vec![],
            use_case: Mode::Study,
            document_id: document_id.map(String::from),
        }
    }

    #[tokio::test]
    async fn mock_assigns_sequential_document_ids() {
        let m = MockBackend::default();
        let up = DocumentUpload::new("a.pdf", b"x".to_vec());
        assert_eq!(m.submit(&up, Mode::Study).await.unwrap().document_id, "mock-doc-1");
        assert_eq!(m.submit(&up, Mode::Invoice).await.unwrap().document_id, "mock-doc-2");
    }

    #[tokio::test]
    async fn mock_echoes_question() {
        let m = MockBackend::default();
        let a = m.ask(req("hi", Some("d1"))).await.unwrap();
        assert_eq!(a.answer, "MOCK: hi");
        assert_eq!(a.sources, vec!["d1 (study)"]);
    }

    #[tokio::test]
    async fn mock_without_document_has_no_sources() {
        let a = MockBackend::default().ask(req("hi", None)).await.unwrap();
        assert!(a.sources.is_empty());
    }

    #[tokio::test]
    async fn scripted_chat_pops_in_order_and_records() {
        let c = ScriptedChatClient::new(vec![
            Ok(AnswerPayload::new("one")),
            Err(BackendError::Network("down".into())),
        ]);
        assert_eq!(c.ask(req("a", None)).await.unwrap().answer, "one");
        assert!(c.ask(req("b", None)).await.is_err());
        assert_eq!(c.call_count(), 2);
        assert_eq!(c.last_request().unwrap().question, "b");
    }

    #[tokio::test]
    async fn scripted_chat_fallback_when_scripts_exhausted() {
        let c = ScriptedChatClient::new(vec![]);
        let a = c.ask(req("a", None)).await.unwrap();
        assert!(a.answer.contains("no more scripts"));
    }

    #[tokio::test]
    async fn scripted_documents_record_mode() {
        let d = ScriptedDocumentClient::accepting("doc_1");
        let up = DocumentUpload::new("notes.pdf", b"x".to_vec());
        let r = d.submit(&up, Mode::Invoice).await.unwrap();
        assert_eq!(r.document_id, "doc_1");
        assert_eq!(d.modes(), vec![Mode::Invoice]);
        assert!(d.submit(&up, Mode::Study).await.is_err());
        assert_eq!(d.call_count(), 2);
    }
}
