// 🌐 API Gateway - Thin JSON client over the remote expense API
// The bearer token is injected at construction time: an ApiClient either
// carries a token for every request or carries none.

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, User};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
}

/// Body returned by both /login and /register
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

impl From<TokenResponse> for Session {
    fn from(resp: TokenResponse) -> Self {
        Session::new(resp.access_token, resp.user)
    }
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Same endpoint, authenticated with `token`
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        ApiClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue one request and decode the JSON body.
    /// Empty 2xx bodies (e.g. 204) decode to `Value::Null`. No retries.
    pub fn request(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<Value> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            warn!("{} {} failed to complete: {}", method, url, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().map_err(ApiError::from)?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()));
        }

        // Callers choose their own fallback when the body carries no message
        let message = error_message(&text);
        warn!(
            "{} {} -> {}: {}",
            method,
            url,
            status.as_u16(),
            message.as_deref().unwrap_or(status.canonical_reason().unwrap_or("request failed"))
        );

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Request and deserialize into `T`
    pub fn request_as<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<T> {
        let value = self.request(method, path, body)?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // ========================================================================
    // AUTH ENDPOINTS
    // ========================================================================

    pub fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        let body = to_value(&LoginRequest { username, password })?;
        let resp: TokenResponse = self.request_as(Method::POST, "/login", Some(&body))?;
        Ok(resp.into())
    }

    pub fn register(&self, req: &RegisterRequest<'_>) -> ApiResult<Session> {
        let body = to_value(req)?;
        let resp: TokenResponse = self.request_as(Method::POST, "/register", Some(&body))?;
        Ok(resp.into())
    }

    /// Profile of the token's owner
    pub fn me(&self) -> ApiResult<User> {
        self.request_as(Method::GET, "/me", None)
    }
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body ({"detail": ..} or {"message": ..})
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "message"] {
        match value.get(key) {
            Some(Value::String(s)) => return Some(s.clone()),
            // Validation errors arrive as a list of {msg: ..} objects
            Some(Value::Array(items)) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !msgs.is_empty() {
                    return Some(msgs.join("; "));
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const TOKEN_BODY: &str = r#"{
        "access_token": "tok-abc",
        "token_type": "bearer",
        "user": {"username": "alice", "email": "alice@example.com", "full_name": "Alice Liddell"}
    }"#;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://host/api/");
        assert_eq!(client.url("/expenses"), "http://host/api/expenses");
        assert_eq!(client.url("expenses/3"), "http://host/api/expenses/3");
    }

    #[test]
    fn test_with_token_leaves_source_client_anonymous() {
        let anon = ApiClient::new("http://host/api");
        let authed = anon.with_token("tok");
        assert!(!anon.is_authenticated());
        assert!(authed.is_authenticated());
        assert_eq!(authed.base_url(), "http://host/api");
    }

    #[test]
    fn test_login_success() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/login")
            .match_body(Matcher::Json(json!({"username": "alice", "password": "secret1"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(TOKEN_BODY)
            .create();

        let client = ApiClient::new(format!("{}/api", server.url()));
        let session = client.login("alice", "secret1").unwrap();

        assert_eq!(session.token, "tok-abc");
        assert_eq!(session.user.full_name, "Alice Liddell");
        mock.assert();
    }

    #[test]
    fn test_bearer_header_attached() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/me")
            .match_header("authorization", "Bearer tok-abc")
            .with_status(200)
            .with_body(r#"{"username": "alice", "email": "a@x", "full_name": "Alice"}"#)
            .create();

        let client = ApiClient::new(format!("{}/api", server.url())).with_token("tok-abc");
        let user = client.me().unwrap();

        assert_eq!(user.username, "alice");
        mock.assert();
    }

    #[test]
    fn test_no_header_without_token() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/api/expenses")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .with_body(r#"{"detail": "Authorization required"}"#)
            .create();

        let client = ApiClient::new(format!("{}/api", server.url()));
        let err = client.request(Method::GET, "/expenses", None).unwrap_err();

        assert!(err.is_auth());
        assert_eq!(err.user_message(), "Authorization required");
        mock.assert();
    }

    #[test]
    fn test_server_error_carries_detail() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/register")
            .with_status(400)
            .with_body(r#"{"detail": "Username already exists"}"#)
            .create();

        let client = ApiClient::new(format!("{}/api", server.url()));
        let err = client
            .register(&RegisterRequest {
                username: "alice",
                password: "secret1",
                email: "alice@example.com",
                full_name: "Alice",
            })
            .unwrap_err();

        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Username already exists"));
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_error_body_has_no_message() {
        let mut server = Server::new();
        server
            .mock("POST", "/api/login")
            .with_status(502)
            .with_body("Bad Gateway")
            .create();

        let client = ApiClient::new(format!("{}/api", server.url()));
        let err = client.login("alice", "secret1").unwrap_err();

        assert!(matches!(err, ApiError::Server { status: 502, message: None }));
    }

    #[test]
    fn test_empty_success_body_is_null() {
        let mut server = Server::new();
        server.mock("DELETE", "/api/expenses/7").with_status(204).create();

        let client = ApiClient::new(format!("{}/api", server.url())).with_token("t");
        let value = client.request(Method::DELETE, "/expenses/7", None).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not expected to be listening
        let client = ApiClient::new("http://127.0.0.1:9/api");
        let err = client.request(Method::GET, "/expenses", None).unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"detail": "Token expired"}"#).as_deref(), Some("Token expired"));
        assert_eq!(error_message(r#"{"message": "nope"}"#).as_deref(), Some("nope"));
        assert_eq!(
            error_message(r#"{"detail": [{"msg": "field required"}]}"#).as_deref(),
            Some("field required")
        );
        assert!(error_message("<html>").is_none());
    }
}
