//! Interactive terminal front end.
//!
//! This module provides the pieces of the `chatterbox` REPL on top of the
//! [`ChatController`](crate::ChatController):
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: slash command parsing
//! - [`shell`]: dispatch of input lines to controller operations

mod commands;
mod config;
mod shell;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use shell::{ChatShell, Flow};
