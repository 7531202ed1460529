use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::SessionApi;
use crate::client_logger::ClientLogger;
use crate::csrf::{CSRF_HEADER, token_from_cookie_header, token_from_meta};
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    CreateSessionParams, Message, SendMessageParams, SendMessageResponse, Session, SessionUpdate,
};

const DEFAULT_API_URL: &str = "http://localhost:8000/api/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the session service.
///
/// Cookies set by the service are kept in a jar and sent back on every
/// request, and the `csrftoken` cookie is echoed in the `X-CSRFToken` header.
#[derive(Clone)]
pub struct SessionClient {
    client: ReqwestClient,
    cookies: Arc<Jar>,
    base_url: Url,
    timeout: Duration,
    fallback_csrf: Option<String>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("fallback_csrf", &self.fallback_csrf.is_some())
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl SessionClient {
    /// Create a new client.
    ///
    /// The base URL defaults to `http://localhost:8000/api/`. The client never
    /// reads the environment; [`ChatConfig`](crate::chat::ChatConfig) does.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// A zero timeout is treated as unset.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let timeout = timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);
        let cookies = Arc::new(Jar::default());
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            cookies,
            base_url,
            timeout,
            fallback_csrf: None,
            logger: None,
        })
    }

    /// Use `token` when the cookie jar holds no `csrftoken` cookie.
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.fallback_csrf = Some(token.into());
        self
    }

    /// Attach a logger that observes every request.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store a `Set-Cookie` style string in the jar as if the service had sent it.
    pub fn add_cookie(&self, cookie: &str) {
        self.cookies.add_cookie_str(cookie, &self.base_url);
    }

    /// The token that will be sent in the CSRF header, if any.
    ///
    /// The `csrftoken` cookie wins over the configured fallback.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookies
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().and_then(token_from_cookie_header))
            .or_else(|| self.fallback_csrf.clone())
    }

    /// Fetch an HTML page to pick up a CSRF token.
    ///
    /// `page` is resolved against the base URL, so `"/"` names the site root.
    /// Any cookies the page sets land in the jar; a `csrftoken` cookie is
    /// preferred over a `csrf-token` meta tag in the body.
    pub async fn discover_csrf_token(&self, page: &str) -> Result<Option<String>> {
        let url = self.base_url.join(page)?;
        let request = self.client.get(url.clone());
        let response = self.execute(Method::GET, url, request).await?;
        let body = response.text().await.map_err(|e| {
            Error::http_client(format!("Failed to read page: {}", e), Some(Box::new(e)))
        })?;

        let from_cookie = self
            .cookies
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().and_then(token_from_cookie_header));
        Ok(from_cookie.or_else(|| token_from_meta(&body)))
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = self.csrf_token() {
            let value = HeaderValue::from_str(&token).map_err(|_| {
                Error::validation(
                    "CSRF token is not a valid header value",
                    Some("csrf_token".to_string()),
                )
            })?;
            headers.insert(CSRF_HEADER, value);
        }
        Ok(headers)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response, url: &Url) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // The service reports failures as {"error": ...}; framework-level
        // rejections (404, CSRF) use {"detail": ...}.
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error.or(e.detail))
            .unwrap_or_else(|| {
                if error_body.trim().is_empty() {
                    format!("request failed with status {status_code}")
                } else {
                    error_body.clone()
                }
            });

        match status_code {
            400 => Error::bad_request(error_message),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message, None, Some(url.path().to_string())),
            408 => Error::timeout(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_message),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Send a prepared request, recording metrics and notifying the logger.
    async fn execute(&self, method: Method, url: Url, request: RequestBuilder) -> Result<Response> {
        let request = request.headers(self.default_headers()?);
        if let Some(logger) = &self.logger {
            logger.log_request(&method, &url);
        }
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response, &url).await),
            Err(e) => Err(self.transport_error(e)),
        };

        let elapsed = start.elapsed();
        CLIENT_REQUEST_DURATION.add(elapsed.as_secs_f64());
        match &outcome {
            Ok(response) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(&method, &url, response.status(), elapsed);
                }
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                if let Some(logger) = &self.logger {
                    logger.log_failure(&method, &url, err);
                }
            }
        }
        outcome
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.get(url.clone());
        let response = self.execute(Method::GET, url, request).await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url.clone()).json(body);
        let response = self.execute(Method::POST, url, request).await?;
        Self::decode(response).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let request = self.client.put(url.clone()).json(body);
        let response = self.execute(Method::PUT, url, request).await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let request = self.client.delete(url.clone());
        self.execute(Method::DELETE, url, request).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionApi for SessionClient {
    async fn create_session(&self, candidate_id: &str) -> Result<Session> {
        let params = CreateSessionParams {
            session_id: candidate_id.to_string(),
        };
        self.post("sessions/", &params).await
    }

    async fn send_message(&self, id: i64, message: &str) -> Result<SendMessageResponse> {
        let params = SendMessageParams {
            message: message.to_string(),
        };
        self.post(&format!("sessions/{id}/send_message/"), &params)
            .await
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.get("sessions/").await
    }

    async fn get_session(&self, id: i64) -> Result<Session> {
        self.get(&format!("sessions/{id}/")).await
    }

    async fn list_messages(&self, id: i64) -> Result<Vec<Message>> {
        self.get(&format!("sessions/{id}/messages/")).await
    }

    async fn delete_session(&self, id: i64) -> Result<()> {
        self.delete(&format!("sessions/{id}/")).await
    }

    async fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<Session> {
        self.put(&format!("sessions/{id}/"), update).await
    }
}

/// Parses a base URL, making sure relative joins stay below its path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::validation(
            format!("{raw} cannot be used as a base URL"),
            Some("base_url".to_string()),
        ));
    }
    Ok(url)
}
