//! HTTP-level tests for the session client and controller against a mock
//! session service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatterbox::{
    ChatController, ClientLogger, Error, MemorySessionStore, MessageType, Session, SessionApi,
    SessionClient, SessionStore, SessionUpdate,
};

fn session_json(id: i64, session_id: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "session_id": session_id,
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": updated_at,
        "messages": []
    })
}

fn message_json(id: i64, message_type: &str, content: &str, session: i64) -> Value {
    json!({
        "id": id,
        "message_type": message_type,
        "content": content,
        "timestamp": "2025-03-01T12:05:00.123456Z",
        "session": session
    })
}

fn client(server: &MockServer) -> SessionClient {
    SessionClient::new(Some(format!("{}/api", server.uri()))).unwrap()
}

#[tokio::test]
async fn create_session_sends_fallback_csrf_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/"))
        .and(header("x-csrftoken", "configured"))
        .and(body_json(json!({ "session_id": "session_1_abcdefghi" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json(
            1,
            "session_1_abcdefghi",
            "2025-03-01T12:00:00Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_csrf_token("configured");
    let session = client.create_session("session_1_abcdefghi").await.unwrap();
    assert_eq!(session.id, 1);
    assert_eq!(session.session_id, "session_1_abcdefghi");
    assert!(session.messages.is_empty());
}

#[tokio::test]
async fn csrf_cookie_is_discovered_and_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=from-cookie; Path=/")
                .set_body_string("<html><body>chat</body></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/sessions/3/"))
        .and(header("x-csrftoken", "from-cookie"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_csrf_token("stale-fallback");
    let token = client.discover_csrf_token("/").await.unwrap();
    assert_eq!(token.as_deref(), Some("from-cookie"));
    assert_eq!(client.csrf_token().as_deref(), Some("from-cookie"));
    client.delete_session(3).await.unwrap();
}

#[tokio::test]
async fn csrf_meta_tag_is_discovered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><meta name="csrf-token" content="from-meta"></head></html>"#,
        ))
        .mount(&server)
        .await;

    let client = client(&server);
    let token = client.discover_csrf_token("/").await.unwrap();
    assert_eq!(token.as_deref(), Some("from-meta"));
}

#[tokio::test]
async fn send_message_returns_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/3/send_message/"))
        .and(body_json(json!({ "message": "What is Rust?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": message_json(10, "user", "What is Rust?", 3),
            "assistant_message": message_json(11, "assistant", "A **systems** language.", 3),
            "session_id": "session_3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .send_message(3, "What is Rust?")
        .await
        .unwrap();
    assert_eq!(response.user_message.message_type, MessageType::User);
    assert_eq!(response.user_message.id, Some(10));
    assert_eq!(response.assistant_message.content, "A **systems** language.");
    assert_eq!(response.session_id, "session_3");
}

#[tokio::test]
async fn read_endpoints_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json(1, "a", "2025-03-01T12:00:00Z"),
            session_json(2, "b", "2025-03-02T12:00:00Z"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/2/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json(2, "b", "2025-03-02T12:00:00Z")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/2/messages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json(1, "user", "hi", 2),
            message_json(2, "assistant", "hello", 2),
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let sessions = client.list_sessions().await.unwrap();
    assert_eq!(sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(client.get_session(2).await.unwrap().session_id, "b");
    let messages = client.list_messages(2).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].is_user());
    assert!(!messages[1].is_pending());

    let found = client.session_by_client_id("b").await.unwrap();
    assert_eq!(found.map(|s| s.id), Some(2));
    assert!(client.session_by_client_id("zzz").await.unwrap().is_none());
}

#[tokio::test]
async fn update_session_puts_changes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/sessions/2/"))
        .and(body_json(json!({ "session_id": "renamed" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json(2, "renamed", "2025-03-03T12:00:00Z")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let update = SessionUpdate::new().with_session_id("renamed");
    let session = client(&server).update_session(2, &update).await.unwrap();
    assert_eq!(session.session_id, "renamed");
}

#[tokio::test]
async fn error_statuses_map_to_variants() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/9/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "detail": "No ChatSession matches the given query." })),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/sessions/1/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "detail": "CSRF Failed: CSRF token missing." })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/1/send_message/"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "Failed to process message: boom" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get_session(9).await.unwrap_err();
    assert!(err.is_not_found());
    match &err {
        Error::NotFound {
            message,
            resource_id,
            ..
        } => {
            assert_eq!(message, "No ChatSession matches the given query.");
            assert_eq!(resource_id.as_deref(), Some("/api/sessions/9/"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = client.delete_session(1).await.unwrap_err();
    assert!(err.is_permission());
    assert_eq!(err.to_string(), "Permission error: CSRF Failed: CSRF token missing.");

    let err = client.send_message(1, "hi").await.unwrap_err();
    assert!(err.is_server_error());
    assert!(err.to_string().contains("Failed to process message: boom"));

    let err = client.list_sessions().await.unwrap_err();
    assert_eq!(err.status_code(), Some(418));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let server = MockServer::start().await;
    let base = format!("{}/api/", server.uri());
    drop(server);

    let client = SessionClient::new(Some(base)).unwrap();
    let err = client.list_sessions().await.unwrap_err();
    assert!(err.is_connection() || matches!(err, Error::HttpClient { .. }), "{err:?}");
}

#[tokio::test]
async fn startup_with_stale_pointer_creates_one_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/77/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(session_json(5, "session_new", "2025-03-05T12:00:00Z")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([session_json(
            5,
            "session_new",
            "2025-03-05T12:00:00Z"
        )])))
        .mount(&server)
        .await;

    let time = time::macros::datetime!(2025-02-01 00:00 UTC);
    let stale = Session::new(77, "gone", time, time);
    let store = MemorySessionStore::with_session(&stale).unwrap();
    let controller = ChatController::new(client(&server), store);

    controller.start().await.unwrap();

    let state = controller.snapshot();
    assert_eq!(state.session.as_ref().map(|s| s.id), Some(5));
    assert_eq!(state.error, None);
    assert!(!state.loading);
    assert!(state.messages.is_empty());
    assert_eq!(state.sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![5]);
    assert_eq!(controller.store().load_active_id().unwrap(), Some(5));
}

#[tokio::test]
async fn send_failure_rolls_back_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/4/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_json(4, "s4", "2025-03-04T12:00:00Z")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/4/messages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json(1, "user", "earlier", 4),
            message_json(2, "assistant", "reply", 4),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/4/send_message/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to process message: quota" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let controller = ChatController::new(client(&server), MemorySessionStore::new());
    controller.load_session(4).await.unwrap();
    assert!(controller.send_message("lost").await.is_err());

    let contents: Vec<String> = controller
        .messages()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["earlier", "reply"]);
    assert!(
        controller
            .error()
            .unwrap()
            .starts_with("Failed to send message: Internal server error")
    );
}

#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<String>>,
}

impl ClientLogger for RecordingLogger {
    fn log_request(&self, method: &Method, url: &Url) {
        self.events
            .lock()
            .unwrap()
            .push(format!("request {method} {}", url.path()));
    }

    fn log_response(&self, method: &Method, url: &Url, status: StatusCode, _: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("response {method} {} {}", url.path(), status.as_u16()));
    }

    fn log_failure(&self, method: &Method, url: &Url, error: &Error) {
        self.events.lock().unwrap().push(format!(
            "failure {method} {} {:?}",
            url.path(),
            error.status_code()
        ));
    }
}

#[tokio::test]
async fn logger_observes_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/8/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let logger = Arc::new(RecordingLogger::default());
    let client = client(&server).with_logger(logger.clone());
    client.list_sessions().await.unwrap();
    client.get_session(8).await.unwrap_err();

    let events = logger.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "request GET /api/sessions/",
            "response GET /api/sessions/ 200",
            "request GET /api/sessions/8/",
            "failure GET /api/sessions/8/ Some(404)",
        ]
    );
}
