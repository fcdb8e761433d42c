//! Per-sender conversation buffers.
//!
//! Process-lifetime only. Access is strictly sequential from the poll
//! loop, so a plain `HashMap` suffices.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded conversation history keyed by sender address.
///
/// Keeps the most recent `cap` turns per sender; the oldest turn is
/// evicted on overflow.
#[derive(Debug)]
pub struct ConversationStore {
    conversations: HashMap<String, Vec<Turn>>,
    cap: usize,
}

impl ConversationStore {
    pub fn new(cap: usize) -> Self {
        Self {
            conversations: HashMap::new(),
            cap: cap.max(2),
        }
    }

    /// Buffered turns for a sender, oldest first.
    pub fn history(&self, sender: &str) -> &[Turn] {
        self.conversations
            .get(sender)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of user turns buffered for a sender.
    pub fn exchanges(&self, sender: &str) -> usize {
        self.history(sender)
            .iter()
            .filter(|t| t.role == Role::User)
            .count()
    }

    /// Append a turn, evicting the oldest beyond the cap.
    pub fn record(&mut self, sender: &str, role: Role, text: impl Into<String>) {
        let turns = self.conversations.entry(sender.to_string()).or_default();
        turns.push(Turn::new(role, text));
        while turns.len() > self.cap {
            turns.remove(0);
        }
    }

    /// Drop any buffered history for a sender (fresh conversation).
    pub fn reset(&mut self, sender: &str) {
        self.conversations.remove(sender);
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
