// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use jawab_config::Mode;

use crate::{AnswerPayload, ChatError, ChatRequest, DocumentUpload, UploadError, UploadReceipt};

/// Submits documents for ingestion.
///
/// Implementations perform exactly one backend call per invocation and never
/// retry.  Callers are responsible for not overlapping calls within a session.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Backend name for status display and logs.
    fn name(&self) -> &str;

    /// Upload `upload` for use under `mode`.
    async fn submit(&self, upload: &DocumentUpload, mode: Mode) -> Result<UploadReceipt, UploadError>;
}

/// Performs one question/answer exchange.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Backend name for status display and logs.
    fn name(&self) -> &str;

    /// Ask a question with its windowed context.  A successful payload always
    /// carries a non-empty answer.
    async fn ask(&self, req: ChatRequest) -> Result<AnswerPayload, ChatError>;
}
