// Public modules
pub mod api;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod controller;
pub mod csrf;
pub mod error;
pub mod markup;
pub mod render;
pub mod sidebar;
pub mod store;
pub mod types;

mod observability;

#[cfg(test)]
mod testing;

// Re-exports
pub use api::SessionApi;
pub use client::SessionClient;
pub use client_logger::{ClientLogger, TracingClientLogger};
pub use controller::{ChatController, ChatState};
pub use error::{Error, Result};
pub use markup::{Block, ListKind, Span, blocks_or_plain, parse_blocks, parse_spans};
pub use observability::register_biometrics;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
