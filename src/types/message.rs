use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Typed by the person using the client.
    User,

    /// Generated by the backend.
    Assistant,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::User => write!(f, "user"),
            MessageType::Assistant => write!(f, "assistant"),
        }
    }
}

/// Client-side tag for a message that the server has not confirmed yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PendingId(Uuid);

impl PendingId {
    /// Generates a fresh, unique tag.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server identifier; `None` until the server has stored the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Author of the message.
    pub message_type: MessageType,

    /// Raw text of the message.
    pub content: String,

    /// When the message was written.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// Numeric id of the owning session, when the endpoint includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<i64>,

    /// Set only on optimistic entries inserted by the controller.
    #[serde(skip)]
    pub pending: Option<PendingId>,
}

impl Message {
    /// Create a confirmed message.
    pub fn new(
        id: i64,
        message_type: MessageType,
        content: impl Into<String>,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            id: Some(id),
            message_type,
            content: content.into(),
            timestamp,
            session: None,
            pending: None,
        }
    }

    /// Create an unconfirmed user message stamped with the current time.
    pub fn pending_user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            message_type: MessageType::User,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
            session: None,
            pending: Some(PendingId::generate()),
        }
    }

    /// Sets the owning session.
    pub fn with_session(mut self, session: i64) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns true when the message was written by the user.
    pub fn is_user(&self) -> bool {
        self.message_type == MessageType::User
    }

    /// Returns true for optimistic entries that the server has not confirmed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
