// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// Number of prior turns sent as context with a new question.
pub const DEFAULT_HISTORY_WINDOW: usize = 4;

/// Serde default helper — returns `true`.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend identifier: "http" talks to the RAG service, "mock" answers
    /// locally without any network access.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the RAG service, e.g. `http://127.0.0.1:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the multipart ingestion endpoint, relative to `base_url`.
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    /// Path of the question/answer endpoint, relative to `base_url`.
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    /// Deadline for a single backend call in seconds (0 = no deadline).
    ///
    /// An expired deadline resolves the call as a network failure so the
    /// session applies its usual fallback behaviour.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "http".into()
}
fn default_base_url() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_upload_path() -> String {
    "/upload".into()
}
fn default_chat_path() -> String {
    "/chat".into()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            upload_path: default_upload_path(),
            chat_path: default_chat_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> String {
        join_url(&self.base_url, &self.upload_path)
    }

    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Mode selected when a session starts.
    #[serde(default)]
    pub default_mode: Mode,
    /// How many of the most recent turns accompany a new question.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Modes whose backend accepts a question without an uploaded document.
    #[serde(default)]
    pub documentless_modes: Vec<Mode>,
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            documentless_modes: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Whether a question in `mode` needs a ready document first.
    pub fn requires_document(&self, mode: Mode) -> bool {
        !self.documentless_modes.contains(&mode)
    }
}

/// Presentation defaults.  Read by front-ends only, never by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Print the supporting excerpts below each answer.
    #[serde(default = "default_true")]
    pub show_sources: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_sources: true }
    }
}

/// The use case a document is uploaded for.
///
/// Selects backend routing (`use_case`) and scopes document validity: a
/// document uploaded under one mode is never reused under another.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Study material: notes, textbooks, lecture slides
    #[default]
    Study,
    /// Invoices and receipts
    Invoice,
}

impl Mode {
    /// Identifier sent to the backend as `use_case`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Study => "study",
            Mode::Invoice => "invoice",
        }
    }

    /// One-line description for front-ends.
    pub fn tagline(&self) -> &'static str {
        match self {
            Mode::Study => "Your AI study companion",
            Mode::Invoice => "Smart invoice intelligence",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(Mode::Study),
            "invoice" => Ok(Mode::Invoice),
            other => Err(format!("unknown mode: {other:?} (expected study | invoice)")),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
