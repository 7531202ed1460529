//! Structured rendering of message text.
//!
//! Assistant replies use a tiny subset of markdown: `**bold**` spans, lines
//! starting with `1.` style numbers, and lines starting with `-`, `*` or `•`.
//! [`parse_blocks`] turns raw text into paragraphs and list blocks; it is a
//! pure function of its input.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.\s+(.*)").expect("numbered item pattern should compile"));

static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-•*]\s+(.*)").expect("bullet item pattern should compile"));

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern should compile"));

/// An inline run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Unstyled text.
    Plain(String),
    /// Text that was wrapped in `**`.
    Bold(String),
}

impl Span {
    /// The text of the span without markers.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Bold(text) => text,
        }
    }

    /// Returns true for bold spans.
    pub fn is_bold(&self) -> bool {
        matches!(self, Span::Bold(_))
    }
}

/// Which marker opened a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `1.`, `2.`, ...
    Ordered,
    /// `-`, `*` or `•`.
    Unordered,
}

/// A display block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// One non-blank line of text.
    Paragraph(Vec<Span>),
    /// A run of consecutive list lines.
    ///
    /// Numbered and bulleted lines are not distinguished within a run; the
    /// kind is taken from the first line.
    List {
        /// Kind of the first item.
        kind: ListKind,
        /// Item texts, one span list per item.
        items: Vec<Vec<Span>>,
    },
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = NUMBERED_ITEM.captures(line) {
        return caps.get(1).map(|m| (ListKind::Ordered, m.as_str()));
    }
    BULLET_ITEM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Unordered, m.as_str()))
}

/// Splits message text into display blocks.
///
/// Returns an empty vector when the text has no non-blank lines; see
/// [`blocks_or_plain`] for the usual fallback.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Option<(ListKind, Vec<Vec<Span>>)> = None;

    for line in content.split('\n') {
        if let Some((kind, text)) = list_item(line) {
            pending
                .get_or_insert_with(|| (kind, Vec::new()))
                .1
                .push(parse_spans(text));
            continue;
        }
        if let Some((kind, items)) = pending.take() {
            blocks.push(Block::List { kind, items });
        }
        if !line.trim().is_empty() {
            blocks.push(Block::Paragraph(parse_spans(line)));
        }
    }

    if let Some((kind, items)) = pending {
        blocks.push(Block::List { kind, items });
    }
    blocks
}

/// Like [`parse_blocks`], but never empty: text without any non-blank line
/// becomes a single paragraph holding the raw content.
pub fn blocks_or_plain(content: &str) -> Vec<Block> {
    let blocks = parse_blocks(content);
    if blocks.is_empty() {
        vec![Block::Paragraph(parse_spans(content))]
    } else {
        blocks
    }
}

/// Splits text into plain and bold spans.
///
/// `**` pairs are matched non-greedily from left to right; an unmatched
/// `**` stays in the plain text. Text without any pair comes back as a
/// single plain span.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::Plain(text[last..whole.start()].to_string()));
        }
        spans.push(Span::Bold(inner.as_str().to_string()));
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }
    if spans.is_empty() {
        spans.push(Span::Plain(text.to_string()));
    }
    spans
}
