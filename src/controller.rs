//! Chat state management.
//!
//! [`ChatController`] owns the state a chat front end renders (the active
//! session, its messages, the sidebar list, a loading flag and the last
//! error) and keeps it in sync with the session service.
//!
//! State is published through a [`tokio::sync::watch`] channel. Operations
//! take `&self`, so a front end may start one while another is still waiting
//! on the network; each individual state change is applied atomically, but
//! operations are not serialized against each other.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use uuid::Uuid;

use crate::api::SessionApi;
use crate::error::{Error, Result};
use crate::observability::{
    CONTROLLER_ERRORS, CONTROLLER_OPERATIONS, OPTIMISTIC_ROLLBACKS, STARTUP_FALLBACKS,
    STORE_ERRORS,
};
use crate::store::SessionStore;
use crate::types::{Message, PendingId, Session, sort_by_recent};

/// Everything a chat front end needs to draw itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Messages of the active session, in server order, plus at most a few
    /// optimistic entries at the tail.
    pub messages: Vec<Message>,
    /// The active session.
    pub session: Option<Session>,
    /// All sessions, most recently updated first.
    pub sessions: Vec<Session>,
    /// True while any controller operation is running.
    pub loading: bool,
    /// Human-readable description of the last failure.
    pub error: Option<String>,
}

/// Generates the candidate opaque id proposed when creating a session.
///
/// The format is `session_<unix millis>_<9 random characters>`. The server
/// is free to ignore it.
pub fn candidate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{millis}_{suffix}")
}

/// Keeps `loading` true until the last in-flight operation finishes.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<ChatState>,
    in_flight: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<ChatState>, in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        state.send_modify(|s| s.loading = true);
        Self { state, in_flight }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state.send_modify(|s| s.loading = false);
        }
    }
}

/// Client-side data flow for a chat front end.
pub struct ChatController<A: SessionApi, S: SessionStore> {
    api: A,
    store: S,
    state: watch::Sender<ChatState>,
    in_flight: AtomicUsize,
    started: AtomicBool,
}

impl<A: SessionApi, S: SessionStore> ChatController<A, S> {
    /// Creates a controller with empty state. Call [`start`](Self::start)
    /// to restore or create the active session.
    pub fn new(api: A, store: S) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            api,
            store,
            state,
            in_flight: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// The API the controller talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The store holding the active-session pointer.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Messages of the active session.
    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().messages.clone()
    }

    /// The active session.
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// All sessions, most recently updated first.
    pub fn sessions(&self) -> Vec<Session> {
        self.state.borrow().sessions.clone()
    }

    /// True while an operation is running.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// The last surfaced error.
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Dismiss the surfaced error.
    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    fn begin(&self) -> LoadingGuard<'_> {
        CONTROLLER_OPERATIONS.click();
        LoadingGuard::new(&self.state, &self.in_flight)
    }

    /// Records `err` as the visible error and hands it back.
    fn surface(&self, action: &str, err: Error) -> Error {
        CONTROLLER_ERRORS.click();
        tracing::warn!(action, error = %err, "operation failed");
        let message = format!("{action}: {err}");
        self.state.send_modify(|s| s.error = Some(message));
        err
    }

    /// Makes `session` active and persists its snapshot.
    fn activate(&self, session: Session) {
        if let Err(err) = self.store.save(&session) {
            STORE_ERRORS.click();
            tracing::warn!(session = session.id, error = %err, "could not persist active session");
        }
        self.state.send_modify(|s| s.session = Some(session));
    }

    async fn fetch_sessions(&self) -> Result<()> {
        let mut sessions = self.api.list_sessions().await?;
        sort_by_recent(&mut sessions);
        self.state.send_modify(|s| s.sessions = sessions);
        Ok(())
    }

    /// Re-fetch the session list.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn refresh_sessions(&self) {
        if let Err(err) = self.fetch_sessions().await {
            tracing::warn!(error = %err, "could not refresh sessions");
        }
    }

    /// Create a new session and make it active with an empty thread.
    pub async fn initialize_session(&self) -> Result<Session> {
        let _loading = self.begin();
        self.clear_error();
        self.create_and_activate()
            .await
            .map_err(|err| self.surface("Failed to create session", err))
    }

    async fn create_and_activate(&self) -> Result<Session> {
        let candidate = candidate_session_id();
        let session = self.api.create_session(&candidate).await?;
        tracing::debug!(session = session.id, %candidate, "created session");
        self.activate(session.clone());
        self.state.send_modify(|s| s.messages.clear());
        self.fetch_sessions().await?;
        Ok(session)
    }

    /// Send `text` in the active session.
    ///
    /// Does nothing when there is no active session or the text is blank.
    /// The user's message appears immediately as an optimistic entry and is
    /// replaced by the server's copy and the reply once they arrive; if the
    /// exchange fails it is removed again.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let content = text.trim();
        let Some(session_id) = self.state.borrow().session.as_ref().map(|s| s.id) else {
            return Ok(());
        };
        if content.is_empty() {
            return Ok(());
        }

        let _loading = self.begin();
        self.clear_error();

        let optimistic = Message::pending_user(content).with_session(session_id);
        let Some(pending) = optimistic.pending else {
            return Ok(());
        };
        self.state.send_modify(|s| s.messages.push(optimistic));

        match self.exchange(session_id, content, pending).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.send_modify(|s| {
                    let before = s.messages.len();
                    s.messages.retain(|m| m.pending != Some(pending));
                    if s.messages.len() != before {
                        OPTIMISTIC_ROLLBACKS.click();
                    }
                });
                Err(self.surface("Failed to send message", err))
            }
        }
    }

    async fn exchange(&self, session_id: i64, content: &str, pending: PendingId) -> Result<()> {
        let response = self.api.send_message(session_id, content).await?;
        self.state.send_modify(|s| {
            s.messages.retain(|m| m.pending != Some(pending));
            s.messages.push(response.user_message);
            s.messages.push(response.assistant_message);
        });

        let updated = self.api.get_session(session_id).await?;
        self.activate(updated);
        self.fetch_sessions().await
    }

    /// Make the session `id` active, replacing the message list with its
    /// history.
    pub async fn load_session(&self, id: i64) -> Result<()> {
        let _loading = self.begin();
        self.fetch_session_with_messages(id)
            .await
            .map_err(|err| self.surface("Failed to load session", err))
    }

    async fn fetch_session_with_messages(&self, id: i64) -> Result<()> {
        let session = self.api.get_session(id).await?;
        let messages = self.api.list_messages(session.id).await?;
        self.activate(session);
        self.state.send_modify(|s| s.messages = messages);
        Ok(())
    }

    /// Delete the session `id` and drop it from the session list.
    ///
    /// The active session is left alone even when it is the one deleted;
    /// callers decide whether to create a replacement.
    pub async fn delete_session(&self, id: i64) -> Result<()> {
        let _loading = self.begin();
        match self.api.delete_session(id).await {
            Ok(()) => {
                self.state.send_modify(|s| s.sessions.retain(|session| session.id != id));
                Ok(())
            }
            Err(err) => Err(self.surface("Failed to delete session", err)),
        }
    }

    /// Restore the persisted session or start a fresh one.
    ///
    /// Runs once per controller; later calls return immediately.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let _loading = self.begin();
        match self.restore().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => {
                STARTUP_FALLBACKS.click();
                tracing::warn!(error = %err, "startup failed, starting a fresh session");
            }
        }
        self.initialize_session().await.map(drop)
    }

    /// Returns `Ok(true)` when the persisted session was restored.
    async fn restore(&self) -> Result<bool> {
        self.fetch_sessions().await?;

        let persisted = match self.store.load_active_id() {
            Ok(id) => id,
            Err(err) => {
                STORE_ERRORS.click();
                tracing::warn!(error = %err, "ignoring unreadable session pointer");
                None
            }
        };
        let Some(id) = persisted else {
            return Ok(false);
        };

        match self.fetch_session_with_messages(id).await {
            Ok(()) => Ok(true),
            Err(err) => {
                STARTUP_FALLBACKS.click();
                tracing::warn!(session = id, error = %err, "persisted session not found");
                if let Err(err) = self.store.clear() {
                    STORE_ERRORS.click();
                    tracing::warn!(error = %err, "could not clear stale session pointer");
                }
                Ok(false)
            }
        }
    }
}
