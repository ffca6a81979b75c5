//! Ordered record of everything said in a conversation

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
    User,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Position in the transcript, starting at 1
    pub sequence_id: u64,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

/// Append-only message log owned by one conversation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of the stored entry
    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> Message {
        let message = Message {
            sequence_id: self.messages.len() as u64 + 1,
            text: text.into(),
            sender,
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
