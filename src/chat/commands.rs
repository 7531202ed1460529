//! Slash command parsing for the chat shell.
//!
//! Input starting with `/` controls the shell instead of being sent as a
//! message.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new session.
    New,

    /// List sessions.
    Sessions,

    /// Switch to the session with this numeric id.
    Load(i64),

    /// Delete the session with this numeric id.
    Delete(i64),

    /// Re-fetch the session list.
    Refresh,

    /// Dismiss the current error.
    Dismiss,

    /// Show the active session and connection details.
    Status,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use chatterbox::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/load 12"), Some(ChatCommand::Load(12)));
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "sessions" | "ls" => ChatCommand::Sessions,
        "load" | "open" => parse_id_command(argument, ChatCommand::Load, "/load"),
        "delete" | "rm" => parse_id_command(argument, ChatCommand::Delete, "/delete"),
        "refresh" => ChatCommand::Refresh,
        "dismiss" => ChatCommand::Dismiss,
        "status" => ChatCommand::Status,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_id_command<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: Fn(i64) -> ChatCommand,
{
    match argument {
        Some(arg) => match arg.parse::<i64>() {
            Ok(value) => constructor(value),
            Err(_) => ChatCommand::Invalid(format!("{name} expects a numeric session id")),
        },
        None => ChatCommand::Invalid(format!("{name} requires a session id")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat session
  /sessions              List sessions (most recent first)
  /load <id>             Switch to a session
  /delete <id>           Delete a session
  /refresh               Re-fetch the session list
  /dismiss               Dismiss the current error
  /status                Show the active session and server
  /help                  Show this help message
  /quit                  Exit the chat
Anything else is sent as a message."#
}
