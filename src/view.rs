// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Plain-text rendering of session snapshots.  Display preferences live
//! here, never on the session.

use std::fmt::Write;

use jawab_client::Sender;
use jawab_config::UiConfig;
use jawab_core::{DocumentState, Session, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewModel {
    pub show_sources: bool,
}

impl ViewModel {
    pub fn from_config(ui: &UiConfig) -> Self {
        Self {
            show_sources: ui.show_sources,
        }
    }

    /// Flip citation display; returns the new setting.
    pub fn toggle_sources(&mut self) -> bool {
        self.show_sources = !self.show_sources;
        self.show_sources
    }

    pub fn render_turn(&self, turn: &Turn) -> String {
        let label = match turn.sender {
            Sender::User => "you",
            Sender::Assistant if turn.is_error => "error",
            Sender::Assistant => "jawab",
        };
        let mut out = format!("{label}> {}", turn.text);
        if self.show_sources && turn.has_sources() {
            out.push_str("\n  sources:");
            for (i, source) in turn.sources.iter().enumerate() {
                let _ = write!(out, "\n  [{}] {}", i + 1, source.trim());
            }
        }
        out
    }

    pub fn render_conversation(&self, session: &Session) -> String {
        if session.conversation().is_empty() {
            return "(no messages yet)".to_string();
        }
        session
            .conversation()
            .iter()
            .map(|t| self.render_turn(t))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One-line summary of mode, document and activity.
pub fn render_status(session: &Session) -> String {
    let mode = session.mode();
    let document = match session.document().state() {
        DocumentState::Absent => "no document".to_string(),
        DocumentState::Uploading { file_name } => format!("uploading {file_name}…"),
        DocumentState::Ready {
            file_name,
            id,
            cached,
            ..
        } => {
            let cached = if *cached { ", cached" } else { "" };
            format!("{file_name} ready ({id}{cached})")
        }
        DocumentState::Failed { file_name, error } => format!("{file_name} failed: {error}"),
    };
    let busy = if session.is_pending() { " [waiting]" } else { "" };
    format!(
        "{mode} · {} · {document} · {} turns{busy}",
        mode.tagline(),
        session.conversation().len()
    )
}
