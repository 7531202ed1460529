//! Scripted in-memory session service for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::watch;

use crate::api::SessionApi;
use crate::controller::ChatState;
use crate::error::{Error, Result};
use crate::types::{Message, MessageType, SendMessageResponse, Session, SessionUpdate};

/// What the fake observed when a call reached it.
#[derive(Debug, Clone)]
pub(crate) struct Sighting {
    pub(crate) call: &'static str,
    pub(crate) loading: bool,
    pub(crate) pending: usize,
}

/// Scripted in-memory session service.
#[derive(Default)]
pub(crate) struct FakeApi {
    sessions: Mutex<Vec<Session>>,
    messages: Mutex<Vec<(i64, Message)>>,
    next_id: Mutex<i64>,
    failures: Mutex<VecDeque<(&'static str, Error)>>,
    calls: Mutex<Vec<&'static str>>,
    watcher: Mutex<Option<watch::Receiver<ChatState>>>,
    sightings: Mutex<Vec<Sighting>>,
    clock: Mutex<i64>,
}

pub(crate) fn at(minutes: i64) -> OffsetDateTime {
    datetime!(2025-03-01 12:00 UTC) + time::Duration::minutes(minutes)
}

impl FakeApi {
    pub(crate) fn with_sessions(sessions: Vec<Session>) -> Self {
        let next = sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let fake = Self::default();
        *fake.sessions.lock().unwrap() = sessions;
        *fake.next_id.lock().unwrap() = next;
        *fake.clock.lock().unwrap() = 100;
        fake
    }

    pub(crate) fn watch(&self, rx: watch::Receiver<ChatState>) {
        *self.watcher.lock().unwrap() = Some(rx);
    }

    pub(crate) fn fail_next(&self, call: &'static str, err: Error) {
        self.failures.lock().unwrap().push_back((call, err));
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sightings(&self) -> Vec<Sighting> {
        self.sightings.lock().unwrap().clone()
    }

    fn tick(&self) -> OffsetDateTime {
        let mut clock = self.clock.lock().unwrap();
        *clock += 1;
        at(*clock)
    }

    fn enter(&self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if let Some(rx) = self.watcher.lock().unwrap().as_ref() {
            let state = rx.borrow();
            self.sightings.lock().unwrap().push(Sighting {
                call,
                loading: state.loading,
                pending: state.messages.iter().filter(|m| m.is_pending()).count(),
            });
        }
        let mut failures = self.failures.lock().unwrap();
        if failures.front().is_some_and(|(name, _)| *name == call) {
            if let Some((_, err)) = failures.pop_front() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn missing(id: i64) -> Error {
        Error::not_found(
            "No ChatSession matches the given query.",
            None,
            Some(format!("/api/sessions/{id}/")),
        )
    }
}

#[async_trait::async_trait]
impl SessionApi for FakeApi {
    async fn create_session(&self, candidate_id: &str) -> Result<Session> {
        self.enter("create_session")?;
        let now = self.tick();
        let mut next = self.next_id.lock().unwrap();
        let session = Session::new(*next, candidate_id, now, now);
        *next += 1;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn send_message(&self, id: i64, message: &str) -> Result<SendMessageResponse> {
        // Lets a concurrent send reach the controller before this one answers.
        tokio::task::yield_now().await;
        self.enter("send_message")?;
        let now = self.tick();
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Self::missing(id))?;
        session.updated_at = now;
        let mut messages = self.messages.lock().unwrap();
        let base = messages.len() as i64 * 10;
        let user = Message::new(base + 1, MessageType::User, message, now).with_session(id);
        let assistant =
            Message::new(base + 2, MessageType::Assistant, format!("echo: {message}"), now)
                .with_session(id);
        messages.push((id, user.clone()));
        messages.push((id, assistant.clone()));
        Ok(SendMessageResponse {
            user_message: user,
            assistant_message: assistant,
            session_id: session.session_id.clone(),
        })
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.enter("list_sessions")?;
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn get_session(&self, id: i64) -> Result<Session> {
        self.enter("get_session")?;
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| Self::missing(id))
    }

    async fn list_messages(&self, id: i64) -> Result<Vec<Message>> {
        self.enter("list_messages")?;
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == id)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn delete_session(&self, id: i64) -> Result<()> {
        self.enter("delete_session")?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Err(Self::missing(id));
        }
        Ok(())
    }

    async fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<Session> {
        self.enter("update_session")?;
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Self::missing(id))?;
        if let Some(session_id) = &update.session_id {
            session.session_id = session_id.clone();
        }
        Ok(session.clone())
    }
}

pub(crate) fn seeded() -> Vec<Session> {
    vec![
        Session::new(1, "oldest", at(0), at(1)),
        Session::new(2, "newest", at(0), at(30)),
        Session::new(3, "middle", at(0), at(10)),
    ]
}

