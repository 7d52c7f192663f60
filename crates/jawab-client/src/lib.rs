// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod types;
mod error;
mod provider;
mod http;
mod mock;

pub use types::*;
pub use error::{BackendError, ChatError, UploadError};
pub use provider::{ChatClient, DocumentClient};
pub use http::HttpBackend;
pub use mock::{MockBackend, ScriptedChatClient, ScriptedDocumentClient};

use std::sync::Arc;

use anyhow::bail;
use jawab_config::BackendConfig;

/// The pair of clients a session talks to.
#[derive(Clone)]
pub struct Backend {
    pub documents: Arc<dyn DocumentClient>,
    pub chat: Arc<dyn ChatClient>,
}

/// Construct the backend clients from configuration.
///
/// Provider selection:
/// - `"http"` → [`HttpBackend`] against `base_url`
/// - `"mock"` → [`MockBackend`] (offline echo)
pub fn from_config(cfg: &BackendConfig) -> anyhow::Result<Backend> {
    match cfg.provider.as_str() {
        "http" => {
            let http = Arc::new(HttpBackend::from_config(cfg)?);
            Ok(Backend {
                documents: http.clone(),
                chat: http,
            })
        }
        "mock" => {
            let mock = Arc::new(MockBackend::default());
            Ok(Backend {
                documents: mock.clone(),
                chat: mock,
            })
        }
        other => bail!("unknown backend provider: {other}"),
    }
}
