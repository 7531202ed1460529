// Public modules
pub mod message;
pub mod send_message;
pub mod session;

// Re-exports
pub use message::{Message, MessageType, PendingId};
pub use send_message::{SendMessageParams, SendMessageResponse};
pub use session::{CreateSessionParams, Session, SessionUpdate, sort_by_recent};
