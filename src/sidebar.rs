//! Text shown for each entry of the session list.

use time::OffsetDateTime;

use crate::types::Session;

/// Preview used for sessions without any user message.
pub const EMPTY_PREVIEW: &str = "New Chat";

/// The content of the first user message in `session`, or [`EMPTY_PREVIEW`].
pub fn session_preview(session: &Session) -> &str {
    session
        .messages
        .iter()
        .find(|m| m.is_user())
        .map(|m| m.content.as_str())
        .filter(|content| !content.is_empty())
        .unwrap_or(EMPTY_PREVIEW)
}

/// Formats `timestamp` relative to `now`.
///
/// The distance is counted in whole days in either direction: `Today 14:05`,
/// `Yesterday 09:30`, `3 days ago`, and a plain `2025-01-31` from a week on.
pub fn relative_label(timestamp: OffsetDateTime, now: OffsetDateTime) -> String {
    let days = (now - timestamp).whole_days().abs();
    match days {
        0 => format!("Today {}", clock(timestamp)),
        1 => format!("Yesterday {}", clock(timestamp)),
        2..=6 => format!("{days} days ago"),
        _ => format!(
            "{:04}-{:02}-{:02}",
            timestamp.year(),
            u8::from(timestamp.month()),
            timestamp.day()
        ),
    }
}

/// `HH:MM` in the timestamp's own offset.
pub fn clock(timestamp: OffsetDateTime) -> String {
    format!("{:02}:{:02}", timestamp.hour(), timestamp.minute())
}
