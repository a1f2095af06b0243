//! Conversation history management
//!
//! The session keeps the history between runs; each run gets a copy and hands
//! back the extended history when it returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Message, Role};

/// Append-only conversation history with a stable id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: String,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Resume a conversation from stored messages
    pub fn restore(id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            messages,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Messages without the system prompt
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Copy handed to a run
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Adopt the history returned by a run.
    ///
    /// The run only ever appends, so the old history is a prefix of the new one.
    pub fn update(&mut self, history: Vec<Message>) {
        debug_assert!(history.len() >= self.messages.len());
        self.messages = history;
    }

    /// Append one message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get the last assistant message
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Start over with a new id so the previous transcript stays on disk
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_extends_history() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));

        let mut history = conv.snapshot();
        history.push(Message::assistant("hello"));
        conv.update(history);

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last_assistant_message().unwrap().text(), "hello");
    }

    #[test]
    fn test_clear_starts_new_conversation() {
        let mut conv = Conversation::new();
        let old_id = conv.id().to_string();
        conv.push(Message::user("hi"));

        conv.clear();

        assert!(conv.is_empty());
        assert_ne!(conv.id(), old_id);
    }
}
