// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chrono::{DateTime, Utc};
use jawab_client::{HistoryEntry, Sender};
use serde::{Deserialize, Serialize};

/// Text of the assistant turn that stands in for a failed exchange.
pub const FALLBACK_ANSWER: &str = "Failed to get a response from the server.";

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    /// Supporting excerpts.  Only assistant turns carry any; an empty list
    /// means the answer has no citations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Set on the placeholder reply that follows a failed exchange.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            sources: Vec::new(),
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            sources,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// The fixed reply appended when an exchange fails.
    pub fn fallback() -> Self {
        Self {
            is_error: true,
            ..Self::assistant(FALLBACK_ANSWER, Vec::new())
        }
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Wire form sent upstream as context: sender and text only.
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            sender: self.sender,
            text: self.text.clone(),
        }
    }
}

/// The most recent `window` turns of `conversation`, oldest first.
///
/// `conversation` must not yet contain the question being asked: the window
/// is always taken over the turns that strictly precede it.  Returns every
/// turn when fewer than `window` exist.
pub fn window_for(conversation: &[Turn], window: usize) -> &[Turn] {
    let start = conversation.len().saturating_sub(window);
    &conversation[start..]
}

/// [`window_for`] converted to the wire form the chat endpoint expects.
pub fn history_for(conversation: &[Turn], window: usize) -> Vec<HistoryEntry> {
    window_for(conversation, window)
        .iter()
        .map(Turn::to_history_entry)
        .collect()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn convo(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("t{i}"))
                } else {
                    Turn::assistant(format!("t{i}"), vec![])
                }
            })
            .collect()
    }

    fn texts(turns: &[Turn]) -> Vec<&str> {
        turns.iter().map(|t| t.text.as_str()).collect()
    }

    // ── Windowing ────────────────────────────────────────────────────────────

    #[test]
    fn window_returns_min_of_size_and_len() {
        for n in 0..10 {
            let c = convo(n);
            assert_eq!(window_for(&c, 4).len(), n.min(4), "n = {n}");
        }
    }

    #[test]
    fn window_keeps_most_recent_in_order() {
        let c = convo(7);
        assert_eq!(texts(window_for(&c, 4)), vec!["t3", "t4", "t5", "t6"]);
    }

    #[test]
    fn window_shorter_conversation_returns_everything() {
        let c = convo(3);
        assert_eq!(texts(window_for(&c, 4)), vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn window_of_zero_is_empty() {
        let c = convo(5);
        assert!(window_for(&c, 0).is_empty());
    }

    #[test]
    fn window_respects_configured_size() {
        let c = convo(10);
        assert_eq!(texts(window_for(&c, 2)), vec!["t8", "t9"]);
        assert_eq!(window_for(&c, 6).len(), 6);
    }

    #[test]
    fn history_drops_sources() {
        let c = vec![
            Turn::user("q"),
            Turn::assistant("a", vec!["chunk A".into()]),
        ];
        let h = history_for(&c, 4);
        assert_eq!(h.len(), 2);
        assert_eq!(h[1].sender, Sender::Assistant);
        assert_eq!(h[1].text, "a");
        let v = serde_json::to_value(&h[1]).unwrap();
        assert!(v.get("sources").is_none());
    }

    // ── Turns ────────────────────────────────────────────────────────────────

    #[test]
    fn fallback_turn_is_assistant_with_fixed_text_and_no_sources() {
        let t = Turn::fallback();
        assert_eq!(t.sender, Sender::Assistant);
        assert_eq!(t.text, FALLBACK_ANSWER);
        assert!(t.sources.is_empty());
        assert!(t.is_error);
    }

    #[test]
    fn user_turn_has_no_sources() {
        let t = Turn::user("hello");
        assert!(!t.has_sources());
        assert!(!t.is_error);
    }
}
