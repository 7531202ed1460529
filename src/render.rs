//! Terminal output for the chat shell.
//!
//! [`Renderer`] is the seam between the REPL and the terminal;
//! [`PlainTextRenderer`] writes text with optional ANSI styling to any
//! [`Write`] sink.

use std::io::{self, Stdout, Write};

use time::OffsetDateTime;

use crate::markup::{Block, ListKind, Span, blocks_or_plain};
use crate::sidebar::{clock, relative_label, session_preview};
use crate::types::{Message, MessageType, Session};

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for timestamps and markers).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Prefix for unordered list items.
const BULLET: &str = "•";

/// Longest preview shown in the session list, in characters.
const PREVIEW_WIDTH: usize = 48;

/// Output strategy for the chat shell.
pub trait Renderer: Send {
    /// Print one message of the thread.
    fn print_message(&mut self, message: &Message);

    /// Print the session list, marking `active`.
    fn print_sessions(&mut self, sessions: &[Session], active: Option<i64>, now: OffsetDateTime);

    /// Print an informational line.
    fn print_info(&mut self, info: &str);

    /// Print an error line.
    fn print_error(&mut self, error: &str);

    /// Print every message of a thread.
    fn print_thread(&mut self, messages: &[Message]) {
        for message in messages {
            self.print_message(message);
        }
    }
}

fn styled(text: &str, style: &str, use_color: bool) -> String {
    if use_color {
        format!("{style}{text}{ANSI_RESET}")
    } else {
        text.to_string()
    }
}

/// Renders spans on one line. Without color, bold text keeps its `**`
/// markers.
pub fn format_spans(spans: &[Span], use_color: bool) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.clone(),
            Span::Bold(text) if use_color => styled(text, ANSI_BOLD, true),
            Span::Bold(text) => format!("**{text}**"),
        })
        .collect()
}

/// Renders blocks as lines of text, each line ending in `\n`.
///
/// Ordered lists are renumbered from 1 and unordered items get a bullet.
pub fn format_blocks(blocks: &[Block], use_color: bool) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Paragraph(spans) => {
                out.push_str(&format_spans(spans, use_color));
                out.push('\n');
            }
            Block::List { kind, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = match kind {
                        ListKind::Ordered => format!("{}.", index + 1),
                        ListKind::Unordered => BULLET.to_string(),
                    };
                    out.push_str(&format!("  {marker} {}\n", format_spans(item, use_color)));
                }
            }
        }
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > width || line.len() < text.trim_end().len() {
        let cut: String = line.chars().take(width.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a renderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a renderer on stdout with the given color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer on an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Whether ANSI styling is emitted.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Consumes the renderer and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn label(&self, message: &Message) -> String {
        match message.message_type {
            MessageType::User => styled("You", ANSI_CYAN, self.use_color),
            MessageType::Assistant => styled("Assistant", ANSI_GREEN, self.use_color),
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &Message) {
        let mut header = format!(
            "{} {}",
            self.label(message),
            styled(&clock(message.timestamp), ANSI_DIM, self.use_color)
        );
        if message.is_pending() {
            header.push(' ');
            header.push_str(&styled("(sending)", ANSI_DIM, self.use_color));
        }
        let body = format_blocks(&blocks_or_plain(&message.content), self.use_color);
        self.write(&format!("{header}\n{body}\n"));
    }

    fn print_sessions(&mut self, sessions: &[Session], active: Option<i64>, now: OffsetDateTime) {
        if sessions.is_empty() {
            self.print_info("No sessions.");
            return;
        }
        let mut out = String::new();
        for session in sessions {
            let marker = if Some(session.id) == active { "*" } else { " " };
            let when = relative_label(session.updated_at, now);
            out.push_str(&format!(
                "{marker} {:>4}  {:<width$}  {}\n",
                session.id,
                truncate(session_preview(session), PREVIEW_WIDTH),
                styled(&when, ANSI_DIM, self.use_color),
                width = PREVIEW_WIDTH,
            ));
        }
        self.write(&out);
    }

    fn print_info(&mut self, info: &str) {
        self.write(&format!("{info}\n"));
    }

    fn print_error(&mut self, error: &str) {
        let line = styled(&format!("Error: {error}"), ANSI_RED, self.use_color);
        self.write(&format!("{line}\n"));
    }
}
