//! The session service contract.
//!
//! [`SessionApi`] is the seam between the [`ChatController`](crate::ChatController)
//! and the network. [`SessionClient`](crate::SessionClient) implements it over
//! HTTP; tests substitute in-memory fakes.

use crate::error::Result;
use crate::types::{Message, SendMessageResponse, Session, SessionUpdate};

/// Operations offered by the remote session service.
#[async_trait::async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a session, proposing `candidate_id` as its opaque identifier.
    async fn create_session(&self, candidate_id: &str) -> Result<Session>;

    /// Post a user message and receive the stored exchange.
    async fn send_message(&self, id: i64, message: &str) -> Result<SendMessageResponse>;

    /// List every session.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Fetch one session by numeric id.
    async fn get_session(&self, id: i64) -> Result<Session>;

    /// Fetch the messages of one session in server order.
    async fn list_messages(&self, id: i64) -> Result<Vec<Message>>;

    /// Delete a session.
    async fn delete_session(&self, id: i64) -> Result<()>;

    /// Apply a partial update to a session.
    async fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<Session>;

    /// Find a session by its opaque string identifier.
    ///
    /// The service has no direct lookup for this, so the full list is scanned.
    async fn session_by_client_id(&self, session_id: &str) -> Result<Option<Session>> {
        let sessions = self.list_sessions().await?;
        Ok(sessions.into_iter().find(|s| s.session_id == session_id))
    }
}
