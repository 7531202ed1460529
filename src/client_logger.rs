//! Logging hook for session service traffic.
//!
//! This module provides the [`ClientLogger`] trait that lets callers observe
//! every request passing through the [`SessionClient`](crate::SessionClient).

use std::time::Duration;

use reqwest::{Method, StatusCode};
use url::Url;

use crate::Error;

/// A trait for observing session service requests.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use chatterbox::{SessionClient, TracingClientLogger};
///
/// let client = SessionClient::new(None)?.with_logger(Arc::new(TracingClientLogger));
/// ```
pub trait ClientLogger: Send + Sync {
    /// Called right before a request is sent.
    fn log_request(&self, method: &Method, url: &Url);

    /// Called when the service answered with a success status.
    fn log_response(&self, method: &Method, url: &Url, status: StatusCode, elapsed: Duration);

    /// Called when the request failed, either in transport or with an error status.
    fn log_failure(&self, method: &Method, url: &Url, error: &Error);
}

/// Forwards client traffic to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingClientLogger;

impl ClientLogger for TracingClientLogger {
    fn log_request(&self, method: &Method, url: &Url) {
        tracing::debug!(%method, %url, "request");
    }

    fn log_response(&self, method: &Method, url: &Url, status: StatusCode, elapsed: Duration) {
        tracing::debug!(
            %method,
            %url,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "response"
        );
    }

    fn log_failure(&self, method: &Method, url: &Url, error: &Error) {
        tracing::warn!(%method, %url, %error, "request failed");
    }
}
