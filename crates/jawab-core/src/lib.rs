// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod history;
mod session;
mod error;
mod controller;

pub use history::{history_for, window_for, Turn, FALLBACK_ANSWER};
pub use session::{Document, DocumentState, DocumentStatus, Session};
pub use error::SessionError;
pub use controller::{AskOutcome, SessionController};
