//! Configuration types for the chat shell.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the shell runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::store::{FileSessionStore, STORE_FILE_NAME};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding the service base URL.
const API_URL_ENV: &str = "CHATTERBOX_API_URL";

/// Environment variable supplying a fallback CSRF token.
const CSRF_TOKEN_ENV: &str = "CHATTERBOX_CSRF_TOKEN";

/// Command-line arguments for the chatterbox tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the session service.
    #[arrrg(optional, "Session service base URL (default: $CHATTERBOX_API_URL or http://localhost:8000/api/)", "URL")]
    pub api_url: Option<String>,

    /// File holding the active-session pointer.
    #[arrrg(optional, "Where to remember the active session", "PATH")]
    pub store: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds; 0 means the default (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// CSRF token to send when the service has not set a cookie.
    #[arrrg(optional, "CSRF token (default: $CHATTERBOX_CSRF_TOKEN)", "TOKEN")]
    pub csrf_token: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for the chat shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the session service; `None` lets the client pick its
    /// default.
    pub api_url: Option<String>,

    /// Location of the active-session pointer.
    ///
    /// Defaults to `chatterbox/current-session.json` under the user's data
    /// directory, or `current-session.json` in the working directory when
    /// the platform has no data directory.
    pub store_path: PathBuf,

    /// Request timeout.
    pub timeout: Duration,

    /// Fallback CSRF token.
    pub csrf_token: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - API URL: client default
    /// - Store: the user's data directory
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            store_path: FileSessionStore::default_path()
                .unwrap_or_else(|| PathBuf::from(STORE_FILE_NAME)),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            csrf_token: None,
            use_color: true,
        }
    }

    /// Sets the service base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the store location.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the fallback CSRF token.
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Fills unset values from the environment as read by `lookup`.
    pub fn with_env_fallbacks<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if self.api_url.is_none() {
            self.api_url = present(API_URL_ENV);
        }
        if self.csrf_token.is_none() {
            self.csrf_token = present(CSRF_TOKEN_ENV);
        }
        self
    }

    /// Fills unset values from the process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env_fallbacks(|name| std::env::var(name).ok())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            api_url: args.api_url,
            store_path: args.store.map(PathBuf::from).unwrap_or(defaults.store_path),
            timeout: args
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            csrf_token: args.csrf_token,
            use_color: !args.no_color,
        }
    }
}
