// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use jawab_client::UploadError;
use thiserror::Error;

use crate::session::DocumentStatus;

/// Why a session operation was refused or did not complete.
///
/// Every variant except `Upload` is detected before any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An upload or a question is already awaiting the backend.
    #[error("another request is still in progress")]
    Busy,
    #[error("no file selected")]
    NoFileSelected,
    #[error("question is empty")]
    EmptyQuestion,
    /// The current mode needs a ready document before questions are accepted.
    #[error("upload a document first (document is {status})")]
    DocumentNotReady { status: DocumentStatus },
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}
