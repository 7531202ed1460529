use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body of a send-message request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageParams {
    /// The user's text.
    pub message: String,
}

/// The service's answer to a send-message request: the stored user turn and
/// the generated reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    /// The user message as stored by the server.
    pub user_message: Message,

    /// The assistant's reply.
    pub assistant_message: Message,

    /// Opaque identifier of the session the exchange belongs to.
    pub session_id: String,
}
