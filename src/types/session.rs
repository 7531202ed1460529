use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::Message;

/// A conversation thread tracked by the session service.
///
/// Sessions carry two identifiers: the numeric `id` the server assigns and
/// uses in URLs, and the opaque `session_id` string proposed by the client
/// when the session was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Server-assigned numeric identifier.
    pub id: i64,

    /// Client-visible opaque identifier.
    pub session_id: String,

    /// When the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the session last changed; drives sidebar ordering.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Messages in server order. Some endpoints omit them.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Create a session with no messages.
    pub fn new(
        id: i64,
        session_id: impl Into<String>,
        created_at: OffsetDateTime,
        updated_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            session_id: session_id.into(),
            created_at,
            updated_at,
            messages: Vec::new(),
        }
    }

    /// Attach messages to the session.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }
}

/// Sorts sessions most recently updated first.
///
/// The sort is stable, so sessions with equal `updated_at` keep the order the
/// server returned them in.
pub fn sort_by_recent(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Body of a create-session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionParams {
    /// Candidate opaque identifier; the server may replace it.
    pub session_id: String,
}

/// Partial session body for an update request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// New opaque identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl SessionUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the opaque identifier.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}
