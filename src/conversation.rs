//! In-session conversation log
//!
//! An append-only, strictly chronological sequence of turns. The store is
//! owned by the pipeline and lives only for the duration of a session; there
//! is no persistence across restarts.

use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One utterance in the conversation
///
/// Immutable once appended. Content is never empty; the pipeline rejects
/// blank transcriptions and blank replies before they reach the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered in-memory log of conversation turns
///
/// Sequence order is chat chronology and is never reordered. Concurrency is
/// the orchestrator's problem: it runs one cycle at a time, so the store
/// needs no locking of its own.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Append a turn, preserving order
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Read-only snapshot of all turns, oldest first
    #[must_use]
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Clear the store to empty
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Number of turns in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the store holds no turns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_chronological_order() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("hello"));
        store.append(Turn::assistant("hi there"));
        store.append(Turn::user("how are you?"));

        let turns = store.all();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], Turn::user("hello"));
        assert_eq!(turns[1], Turn::assistant("hi there"));
        assert_eq!(turns[2], Turn::user("how are you?"));
    }

    #[test]
    fn reset_clears_to_empty() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("one"));
        store.append(Turn::assistant("two"));
        assert_eq!(store.len(), 2);

        store.reset();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let turn = Turn::assistant("ok");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);

        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
