// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! HTTP driver for the RAG backend.
//!
//! Two endpoints are spoken:
//!
//! - `POST <upload_url>` — multipart form with a `file` part and a
//!   `use_case` text field.  Success body: `{"document_id", "message"?,
//!   "status"?, "cached"?}`.
//! - `POST <chat_url>` — JSON `{"question", "history", "use_case",
//!   "document_id"?}`.  Success body: `{"answer", "sources"?, "cached"?}`.
//!
//! Error bodies carry `error`, `message`, or (FastAPI) `detail`.  Any
//! non-2xx status is a rejection regardless of body shape; a 2xx body that
//! carries `error` is a rejection too.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use jawab_config::{BackendConfig, Mode};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    AnswerPayload, BackendError, ChatError, ChatRequest, DocumentUpload, IngestStatus,
    UploadError, UploadReceipt,
};

/// Talks to the upload and chat endpoints of one backend.
///
/// Implements both [`crate::DocumentClient`] and [`crate::ChatClient`] so the
/// two share a connection pool.
pub struct HttpBackend {
    upload_url: String,
    chat_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Construct from explicit endpoint URLs.  `timeout` bounds each call;
    /// `None` leaves calls unbounded.
    pub fn new(
        upload_url: impl Into<String>,
        chat_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self {
            upload_url: upload_url.into(),
            chat_url: chat_url.into(),
            client,
        })
    }

    pub fn from_config(cfg: &BackendConfig) -> anyhow::Result<Self> {
        let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
        Self::new(cfg.upload_url(), cfg.chat_url(), timeout)
    }
}

#[async_trait]
impl crate::DocumentClient for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(&self, upload: &DocumentUpload, mode: Mode) -> Result<UploadReceipt, UploadError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.content_type())
            .map_err(|e| BackendError::Protocol(format!("invalid content type: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("use_case", mode.as_str());

        debug!(
            url = %self.upload_url,
            use_case = %mode,
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            "submitting document"
        );

        let resp = self.client.post(&self.upload_url).multipart(form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, body = %body, "upload response");

        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        parse_upload_response(&body)
    }
}

#[async_trait]
impl crate::ChatClient for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn ask(&self, req: ChatRequest) -> Result<AnswerPayload, ChatError> {
        debug!(
            url = %self.chat_url,
            use_case = %req.use_case,
            document_id = req.document_id.as_deref().unwrap_or("-"),
            history_len = req.history.len(),
            "sending question"
        );

        let resp = self.client.post(&self.chat_url).json(&req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, body = %body, "chat response");

        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        parse_chat_response(&body)
    }
}

// ─── Response parsing ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UploadBody {
    document_id: Option<String>,
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    cached: bool,
}

#[derive(Deserialize)]
struct ChatBody {
    answer: Option<String>,
    #[serde(default)]
    sources: Option<Vec<SourceEntry>>,
    #[serde(default)]
    cached: bool,
}

/// A citation as the backend returns it: either a bare excerpt or a
/// retrieval-match record.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceEntry {
    Excerpt(String),
    Match {
        text: Option<String>,
        source: Option<String>,
        page: Option<Value>,
    },
}

impl SourceEntry {
    fn into_excerpt(self) -> String {
        match self {
            SourceEntry::Excerpt(s) => s,
            SourceEntry::Match { text: Some(t), .. } if !t.trim().is_empty() => t,
            SourceEntry::Match { source, page, .. } => {
                let source = source.unwrap_or_else(|| "document".to_string());
                match page.as_ref().and_then(scalar_text) {
                    Some(p) => format!("{source} (page {p})"),
                    None => source,
                }
            }
        }
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_upload_response(body: &str) -> Result<UploadReceipt, UploadError> {
    let value = parse_json(body)?;
    if let Some(err) = value.get("error").and_then(message_text) {
        return Err(BackendError::Rejected(err));
    }
    let parsed: UploadBody = serde_json::from_value(value)
        .map_err(|e| BackendError::Protocol(format!("unexpected upload response: {e}")))?;
    let document_id = parsed
        .document_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BackendError::Protocol("upload response has no document_id".into()))?;
    Ok(UploadReceipt {
        document_id,
        message: parsed.message,
        ingest: IngestStatus::from_wire(parsed.status.as_deref()),
        cached: parsed.cached,
    })
}

pub(crate) fn parse_chat_response(body: &str) -> Result<AnswerPayload, ChatError> {
    let value = parse_json(body)?;
    if let Some(err) = value.get("error").and_then(message_text) {
        return Err(BackendError::Rejected(err));
    }
    let parsed: ChatBody = serde_json::from_value(value)
        .map_err(|e| BackendError::Protocol(format!("unexpected chat response: {e}")))?;
    let answer = parsed
        .answer
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| BackendError::Protocol("chat response has no answer".into()))?;
    let sources = parsed
        .sources
        .unwrap_or_default()
        .into_iter()
        .map(SourceEntry::into_excerpt)
        .collect();
    Ok(AnswerPayload {
        answer,
        sources,
        cached: parsed.cached,
    })
}

fn parse_json(body: &str) -> Result<Value, BackendError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BackendError::Protocol(format!("response is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(BackendError::Protocol("response is not a JSON object".into()));
    }
    Ok(value)
}

/// Build the rejection for a non-2xx response.
fn rejection(status: reqwest::StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| service_message(&v))
        .unwrap_or_else(|| format!("backend returned {status}"));
    BackendError::Rejected(message)
}

/// First of `error`, `message`, `detail` that carries something printable.
fn service_message(v: &Value) -> Option<String> {
    ["error", "message", "detail"]
        .iter()
        .find_map(|k| v.get(*k).and_then(message_text))
}

fn message_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        // FastAPI validation errors put a list of objects under `detail`.
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Upload ────────────────────────────────────────────────────────────────

    #[test]
    fn upload_success_with_all_fields() {
        let r = parse_upload_response(
            r#"{"document_id":"doc_1","message":"Upload successful","status":"PROCESSING","cached":false}"#,
        )
        .unwrap();
        assert_eq!(r.document_id, "doc_1");
        assert_eq!(r.message.as_deref(), Some("Upload successful"));
        assert_eq!(r.ingest, IngestStatus::Processing);
        assert!(!r.cached);
    }

    #[test]
    fn upload_success_with_only_document_id() {
        let r = parse_upload_response(r#"{"document_id":"doc_1"}"#).unwrap();
        assert_eq!(r, UploadReceipt::new("doc_1"));
    }

    #[test]
    fn upload_without_document_id_is_protocol_violation() {
        let err = parse_upload_response(r#"{"message":"File uploaded. Processing started."}"#)
            .unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }

    #[test]
    fn upload_with_empty_document_id_is_protocol_violation() {
        let err = parse_upload_response(r#"{"document_id":""}"#).unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }

    #[test]
    fn upload_2xx_with_error_field_is_rejection() {
        let err = parse_upload_response(r#"{"error":"unsupported file"}"#).unwrap_err();
        assert_eq!(err, BackendError::Rejected("unsupported file".into()));
    }

    #[test]
    fn upload_non_json_is_protocol_violation() {
        let err = parse_upload_response("<html>oops</html>").unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }

    // ── Chat ──────────────────────────────────────────────────────────────────

    #[test]
    fn chat_string_sources_keep_order() {
        let a = parse_chat_response(r#"{"answer":"42","sources":["chunk A","chunk B"]}"#).unwrap();
        assert_eq!(a.answer, "42");
        assert_eq!(a.sources, vec!["chunk A", "chunk B"]);
    }

    #[test]
    fn chat_missing_and_null_sources_mean_no_citations() {
        let a = parse_chat_response(r#"{"answer":"x"}"#).unwrap();
        assert!(a.sources.is_empty());
        let b = parse_chat_response(r#"{"answer":"x","sources":null}"#).unwrap();
        assert!(b.sources.is_empty());
        let c = parse_chat_response(r#"{"answer":"x","sources":[]}"#).unwrap();
        assert!(c.sources.is_empty());
    }

    #[test]
    fn chat_structured_sources_render_as_excerpts() {
        let a = parse_chat_response(
            r#"{"answer":"x","sources":[
                {"page":3,"source":"notes.pdf","score":0.91},
                {"page":"N/A","source":"document","score":0.5},
                {"text":"Photosynthesis converts light","page":1},
                {"score":0.1}
            ],"cached":true}"#,
        )
        .unwrap();
        assert_eq!(
            a.sources,
            vec![
                "notes.pdf (page 3)",
                "document (page N/A)",
                "Photosynthesis converts light",
                "document",
            ]
        );
        assert!(a.cached);
    }

    #[test]
    fn chat_empty_answer_is_protocol_violation() {
        let err = parse_chat_response(r#"{"answer":"   ","sources":[]}"#).unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }

    #[test]
    fn chat_2xx_with_error_field_is_rejection() {
        let err = parse_chat_response(r#"{"error":"Document not ready"}"#).unwrap_err();
        assert_eq!(err, BackendError::Rejected("Document not ready".into()));
    }

    #[test]
    fn chat_sources_of_wrong_type_is_protocol_violation() {
        let err = parse_chat_response(r#"{"answer":"x","sources":[1,2]}"#).unwrap_err();
        assert!(matches!(err, BackendError::Protocol(_)));
    }

    // ── Rejections ────────────────────────────────────────────────────────────

    #[test]
    fn rejection_prefers_error_then_message_then_detail() {
        let s = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            rejection(s, r#"{"error":"e","message":"m","detail":"d"}"#),
            BackendError::Rejected("e".into())
        );
        assert_eq!(
            rejection(s, r#"{"message":"m","detail":"d"}"#),
            BackendError::Rejected("m".into())
        );
        assert_eq!(
            rejection(s, r#"{"detail":"No question provided."}"#),
            BackendError::Rejected("No question provided.".into())
        );
    }

    #[test]
    fn rejection_without_usable_body_reports_status() {
        let err = rejection(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        match err {
            BackendError::Rejected(m) => assert!(m.contains("500"), "got {m}"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejection_stringifies_structured_detail() {
        let err = rejection(
            reqwest::StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","file"],"msg":"field required"}]}"#,
        );
        match err {
            BackendError::Rejected(m) => assert!(m.contains("field required")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
