//! Interactive chat client for the session service.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the service on localhost
//! chatterbox
//!
//! # Point at another deployment
//! chatterbox --api-url https://chat.example.com/api/
//!
//! # Disable colors (useful for piping output)
//! chatterbox --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/new` - Start a new session
//! - `/sessions` - List sessions
//! - `/load <id>` - Switch to a session
//! - `/delete <id>` - Delete a session
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use chatterbox::chat::{ChatArgs, ChatConfig, ChatShell, Flow, PlainTextRenderer, Renderer};
use chatterbox::{ChatController, FileSessionStore, SessionClient, TracingClientLogger};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chatterbox=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Main entry point for the chatterbox application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatterbox [OPTIONS]");
    let config = ChatConfig::from(args).with_process_env();
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let mut client = SessionClient::with_options(config.api_url.clone(), Some(config.timeout))?;
    match &config.csrf_token {
        Some(token) => client = client.with_csrf_token(token.clone()),
        None => match client.discover_csrf_token("/").await {
            Ok(Some(token)) => client = client.with_csrf_token(token),
            Ok(None) => {}
            Err(err) => tracing::debug!(error = %err, "no CSRF token discovered"),
        },
    }
    let client = client.with_logger(Arc::new(TracingClientLogger));
    let server = client.base_url().to_string();

    tracing::debug!(path = %config.store_path.display(), "using session store");
    let store = FileSessionStore::new(config.store_path.clone());

    let shell = ChatShell::new(ChatController::new(client, store), server.clone());
    let mut rl = DefaultEditor::new()?;

    println!("Chatterbox ({server})");
    println!("Type /help for commands, /quit to exit\n");
    shell.start(&mut renderer).await;

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if shell.handle_line(line, &mut renderer).await == Flow::Quit {
                    println!("Goodbye!");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}
