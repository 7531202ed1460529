//! Command dispatch for the interactive shell.
//!
//! [`ChatShell`] sits between the REPL loop and the [`ChatController`]: it
//! turns each input line into a controller operation and prints the outcome
//! through a [`Renderer`].

use time::OffsetDateTime;

use crate::api::SessionApi;
use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::controller::ChatController;
use crate::error::Error;
use crate::render::Renderer;
use crate::store::SessionStore;

/// Whether the REPL should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Interactive front end over a [`ChatController`].
pub struct ChatShell<A: SessionApi, S: SessionStore> {
    controller: ChatController<A, S>,
    server: String,
}

impl<A: SessionApi, S: SessionStore> ChatShell<A, S> {
    /// Wraps `controller`; `server` is only used for display.
    pub fn new(controller: ChatController<A, S>, server: impl Into<String>) -> Self {
        Self {
            controller,
            server: server.into(),
        }
    }

    /// The underlying controller.
    pub fn controller(&self) -> &ChatController<A, S> {
        &self.controller
    }

    /// Restore or create the active session and print its thread.
    pub async fn start(&self, renderer: &mut dyn Renderer) {
        if let Err(err) = self.controller.start().await {
            self.report(renderer, &err);
        }
        self.print_active(renderer);
    }

    /// Handle one line of input.
    pub async fn handle_line(&self, line: &str, renderer: &mut dyn Renderer) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        match parse_command(line) {
            Some(command) => self.run_command(command, renderer).await,
            None => {
                self.send(line, renderer).await;
                Flow::Continue
            }
        }
    }

    async fn send(&self, text: &str, renderer: &mut dyn Renderer) {
        if self.controller.session().is_none() {
            renderer.print_error("No active session; use /new to start one.");
            return;
        }
        let before = self.controller.messages().len();
        match self.controller.send_message(text).await {
            Ok(()) => {
                let messages = self.controller.messages();
                renderer.print_thread(&messages[before.min(messages.len())..]);
            }
            Err(err) => self.report(renderer, &err),
        }
    }

    async fn run_command(&self, command: ChatCommand, renderer: &mut dyn Renderer) -> Flow {
        match command {
            ChatCommand::New => match self.controller.initialize_session().await {
                Ok(session) => renderer.print_info(&format!("Started session {}.", session.id)),
                Err(err) => self.report(renderer, &err),
            },
            ChatCommand::Sessions => {
                let active = self.controller.session().map(|s| s.id);
                renderer.print_sessions(
                    &self.controller.sessions(),
                    active,
                    OffsetDateTime::now_utc(),
                );
            }
            ChatCommand::Load(id) => match self.controller.load_session(id).await {
                Ok(()) => self.print_active(renderer),
                Err(err) => self.report(renderer, &err),
            },
            ChatCommand::Delete(id) => self.delete(id, renderer).await,
            ChatCommand::Refresh => {
                self.controller.refresh_sessions().await;
                let count = self.controller.sessions().len();
                renderer.print_info(&format!("{count} session(s)."));
            }
            ChatCommand::Dismiss => {
                self.controller.clear_error();
                renderer.print_info("Error dismissed.");
            }
            ChatCommand::Status => self.print_status(renderer),
            ChatCommand::Help => {
                for line in help_text().lines() {
                    renderer.print_info(&format!("    {line}"));
                }
            }
            ChatCommand::Quit => return Flow::Quit,
            ChatCommand::Invalid(message) => renderer.print_error(&message),
        }
        Flow::Continue
    }

    /// Deleting the active session leaves the controller pointing at it, so
    /// the shell starts a replacement.
    async fn delete(&self, id: i64, renderer: &mut dyn Renderer) {
        if let Err(err) = self.controller.delete_session(id).await {
            self.report(renderer, &err);
            return;
        }
        renderer.print_info(&format!("Deleted session {id}."));
        if self.controller.session().is_some_and(|s| s.id == id) {
            match self.controller.initialize_session().await {
                Ok(session) => {
                    renderer.print_info(&format!("Started session {}.", session.id))
                }
                Err(err) => self.report(renderer, &err),
            }
        }
    }

    fn print_active(&self, renderer: &mut dyn Renderer) {
        let Some(session) = self.controller.session() else {
            return;
        };
        renderer.print_info(&format!("Session {} ({})", session.id, session.session_id));
        renderer.print_thread(&self.controller.messages());
    }

    fn print_status(&self, renderer: &mut dyn Renderer) {
        let state = self.controller.snapshot();
        renderer.print_info(&format!("    Server: {}", self.server));
        match &state.session {
            Some(session) => renderer.print_info(&format!(
                "    Session: {} ({})",
                session.id, session.session_id
            )),
            None => renderer.print_info("    Session: (none)"),
        }
        renderer.print_info(&format!("    Messages: {}", state.messages.len()));
        renderer.print_info(&format!("    Sessions: {}", state.sessions.len()));
        match &state.error {
            Some(error) => renderer.print_info(&format!("    Error: {error}")),
            None => renderer.print_info("    Error: (none)"),
        }
    }

    /// Prints the controller's surfaced error, which carries the failed
    /// action, falling back to `err` itself.
    fn report(&self, renderer: &mut dyn Renderer, err: &Error) {
        let message = self.controller.error().unwrap_or_else(|| err.to_string());
        renderer.print_error(&message);
    }
}
