// Helpdesk provider client
// Decision: Relay provider bodies as raw bytes; the gateway never reshapes ticket data
// Decision: Bodies are checked to be JSON before relaying so the browser never gets HTML error pages
// Decision: No retries; timeouts and connect failures are reported as "unavailable"

use std::fmt;

use axum::body::Bytes;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::HelpdeskConfig;

/// Maximum number of chats returned by a search
const SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("helpdesk request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("helpdesk returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("helpdesk returned a non-JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

impl ProviderError {
    /// Timeouts and connection failures, as opposed to provider-side errors
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

/// Raw JSON body from the provider, relayed verbatim
#[derive(Debug, Clone)]
pub struct ProviderResponse(pub Bytes);

impl IntoResponse for ProviderResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/json")], self.0).into_response()
    }
}

/// Provider-side message visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Visible to the customer
    Message,
    /// Internal note, agents only
    Private,
}

impl MessageKind {
    pub fn from_private_flag(is_private: bool) -> Self {
        if is_private {
            Self::Private
        } else {
            Self::Message
        }
    }
}

/// Message posted to a chat on behalf of the configured agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    pub chat: u64,
    pub agent: u64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// Append the agent's signature to an outgoing message
pub fn signed_text(text: &str, display_name: &str) -> String {
    format!("{}\n\n~ {}", text, display_name)
}

#[derive(Clone)]
pub struct HelpdeskClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for HelpdeskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelpdeskClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HelpdeskClient {
    pub fn new(config: &HelpdeskConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Newest chats assigned to a department
    pub async fn search_chats(&self, department_id: &str) -> Result<ProviderResponse, ProviderError> {
        let body = json!({
            "filter": [
                {
                    "field": "chats.department",
                    "operator": "=",
                    "value": department_id,
                }
            ],
            "sort": "chats.createdAt",
            "order": "desc",
            "offset": 0,
            "limit": SEARCH_LIMIT,
        });

        let request = self.http.post(self.url("/chats/search")).json(&body);
        self.send(request).await
    }

    pub async fn get_chat(&self, chat_id: u64) -> Result<ProviderResponse, ProviderError> {
        let request = self.http.get(self.url(&format!("/chats/{}", chat_id)));
        self.send(request).await
    }

    pub async fn list_messages(&self, chat_id: u64) -> Result<ProviderResponse, ProviderError> {
        let request = self.http.get(self.url(&format!("/chats/{}/messages", chat_id)));
        self.send(request).await
    }

    pub async fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = self.http.post(self.url("/messages")).json(message);
        self.send(request).await
    }

    pub async fn list_departments(&self) -> Result<ProviderResponse, ProviderError> {
        let request = self.http.get(self.url("/departments"));
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ProviderResponse, ProviderError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice::<serde::de::IgnoredAny>(&body).map_err(ProviderError::InvalidBody)?;

        Ok(ProviderResponse(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn mock_provider() -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));

        let search_seen = seen.clone();
        let send_seen = seen.clone();
        let app = Router::new()
            .route(
                "/chats/search",
                post(move |headers: HeaderMap, Json(body): Json<Value>| {
                    let seen = search_seen.clone();
                    async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        seen.lock().await.push(("search".into(), auth, body));
                        Json(json!({"data": [{"id": 1}]}))
                    }
                }),
            )
            .route(
                "/messages",
                post(move |Json(body): Json<Value>| {
                    let seen = send_seen.clone();
                    async move {
                        seen.lock().await.push(("send".into(), None, body));
                        Json(json!({"id": 99}))
                    }
                }),
            )
            .route(
                "/chats/:id",
                get(|Path(id): Path<u64>| async move {
                    if id == 404 {
                        (StatusCode::NOT_FOUND, "<html>missing</html>").into_response()
                    } else {
                        Json(json!({"id": id})).into_response()
                    }
                }),
            )
            .route("/departments", get(|| async { "not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    fn client(base_url: &str) -> HelpdeskClient {
        HelpdeskClient::new(&HelpdeskConfig {
            api_url: base_url.to_string(),
            api_key: "hc-key".to_string(),
            agent_id: 7,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_signed_text() {
        assert_eq!(signed_text("hello", "Alice"), "hello\n\n~ Alice");
    }

    #[test]
    fn test_outgoing_message_wire_format() {
        let message = OutgoingMessage {
            text: "hi".to_string(),
            chat: 12,
            agent: 7,
            kind: MessageKind::from_private_flag(true),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"text": "hi", "chat": 12, "agent": 7, "type": "private"})
        );
        assert_eq!(MessageKind::from_private_flag(false), MessageKind::Message);
    }

    #[tokio::test]
    async fn test_search_chats_sends_filter_and_bearer() {
        let (base, seen) = mock_provider().await;
        let response = client(&base).search_chats("142160").await.unwrap();
        assert_eq!(&response.0[..], br#"{"data":[{"id":1}]}"#);

        let seen = seen.lock().await;
        let (_, auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer hc-key"));
        assert_eq!(body["filter"][0]["field"], "chats.department");
        assert_eq!(body["filter"][0]["operator"], "=");
        assert_eq!(body["filter"][0]["value"], "142160");
        assert_eq!(body["sort"], "chats.createdAt");
        assert_eq!(body["order"], "desc");
        assert_eq!(body["offset"], 0);
        assert_eq!(body["limit"], 100);
    }

    #[tokio::test]
    async fn test_send_message_posts_to_messages() {
        let (base, seen) = mock_provider().await;
        let message = OutgoingMessage {
            text: signed_text("hello", "Alice"),
            chat: 5,
            agent: 7,
            kind: MessageKind::Message,
        };
        client(&base).send_message(&message).await.unwrap();

        let seen = seen.lock().await;
        let (kind, _, body) = &seen[0];
        assert_eq!(kind, "send");
        assert_eq!(body["text"], "hello\n\n~ Alice");
        assert_eq!(body["type"], "message");
        assert_eq!(body["chat"], 5);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (base, _) = mock_provider().await;
        let err = client(&base).get_chat(404).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 404, .. }));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_non_json_body_is_error() {
        let (base, _) = mock_provider().await;
        let err = client(&base).list_departments().await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .list_departments()
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
