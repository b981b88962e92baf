use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque chat identifier, sent to the backend as `chatId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(String);

impl ChatId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Unique even when chats are created within the same millisecond.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "msg-{}", self.0)
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    /// Empty assistant message that the typewriter fills in.
    pub fn assistant_placeholder(id: MessageId) -> Self {
        Self::new(id, Role::Assistant, String::new())
    }
}

/// One conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Chat {
    pub fn new(id: ChatId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn message(&self, message_id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }
}
