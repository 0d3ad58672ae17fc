//! Mock OAuth2 token endpoint for unit testing.
//!
//! A thin layer over [`wiremock::MockServer`] that answers token requests
//! with pre-configured JSON, so token acquisition can be tested without
//! reaching a real identity provider.
//!
//! ## Example
//!
//! ```rust,ignore
//! use azsql_testing::mock_token_server::{MockTokenServer, MockTokenResponse};
//!
//! #[tokio::test]
//! async fn test_token() {
//!     let server = MockTokenServer::builder()
//!         .with_tenant_response("tenant", MockTokenResponse::token("abc"))
//!         .build()
//!         .await;
//!
//!     // Use server.authority() as the authority base URL...
//!     let requests = server.requests().await;
//! }
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Priority of the catch-all response; path-specific mocks use the default.
const FALLBACK_PRIORITY: u8 = u8::MAX;

/// Mock response configuration.
#[derive(Clone)]
pub enum MockTokenResponse {
    /// A JSON body with the given status.
    Json {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: serde_json::Value,
    },

    /// A raw body with the given status.
    Raw {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Compute the response from the recorded request.
    Custom(Arc<dyn Fn(&RecordedRequest) -> MockTokenResponse + Send + Sync>),
}

impl fmt::Debug for MockTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { status, body } => f
                .debug_struct("Json")
                .field("status", status)
                .field("body", body)
                .finish(),
            Self::Raw { status, body } => f
                .debug_struct("Raw")
                .field("status", status)
                .field("body", &body.len())
                .finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
        }
    }
}

impl MockTokenResponse {
    /// A successful Azure AD v2.0 token response.
    pub fn token(access_token: impl Into<String>) -> Self {
        Self::Json {
            status: 200,
            body: serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "ext_expires_in": 3599,
                "access_token": access_token.into(),
            }),
        }
    }

    /// An OAuth2 error response (HTTP 400).
    pub fn error(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Json {
            status: 400,
            body: serde_json::json!({
                "error": code.into(),
                "error_description": description.into(),
            }),
        }
    }

    /// An arbitrary JSON response.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::Json { status, body }
    }

    /// An arbitrary raw response.
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self::Raw {
            status,
            body: body.into(),
        }
    }

    /// A response computed per request.
    pub fn custom(
        f: impl Fn(&RecordedRequest) -> MockTokenResponse + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(Arc::new(f))
    }

    fn template(&self, request: &RecordedRequest) -> ResponseTemplate {
        match self {
            Self::Json { status, body } => ResponseTemplate::new(*status).set_body_json(body),
            Self::Raw { status, body } => {
                ResponseTemplate::new(*status).set_body_string(body.clone())
            }
            Self::Custom(f) => f(request).template(request),
        }
    }

    async fn mount(self, mock: wiremock::MockBuilder, priority: Option<u8>, server: &MockServer) {
        let mock =
            mock.respond_with(move |req: &Request| self.template(&RecordedRequest::from(req)));
        match priority {
            Some(priority) => mock.with_priority(priority).mount(server).await,
            None => mock.mount(server).await,
        }
    }
}

/// A request received by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Headers with lower-cased names.
    pub headers: Vec<(String, String)>,
    /// Decoded `application/x-www-form-urlencoded` body fields.
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    /// First value of a form field.
    #[must_use]
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a header (name matched case-insensitively).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The first path segment, which is the tenant for token requests.
    #[must_use]
    pub fn tenant(&self) -> Option<&str> {
        self.path.trim_start_matches('/').split('/').next()
    }
}

impl From<&Request> for RecordedRequest {
    fn from(request: &Request) -> Self {
        Self {
            method: request.method.to_string(),
            path: request.url.path().to_string(),
            headers: request
                .headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            form: url::form_urlencoded::parse(&request.body)
                .into_owned()
                .collect(),
        }
    }
}

/// Builder for `MockTokenServer`.
pub struct MockServerBuilder {
    responses: Vec<(String, MockTokenResponse)>,
    default_response: MockTokenResponse,
}

impl MockServerBuilder {
    /// Create a new builder. Unmatched requests get an `invalid_request` error.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            default_response: MockTokenResponse::error(
                "invalid_request",
                "unknown token endpoint",
            ),
        }
    }

    /// Answer POST requests to an exact path.
    pub fn with_response(mut self, path: impl Into<String>, response: MockTokenResponse) -> Self {
        self.responses.push((path.into(), response));
        self
    }

    /// Answer POST requests to a tenant's v2.0 token endpoint.
    pub fn with_tenant_response(self, tenant: &str, response: MockTokenResponse) -> Self {
        self.with_response(format!("/{tenant}/oauth2/v2.0/token"), response)
    }

    /// Set the response for unmatched requests.
    pub fn with_default_response(mut self, response: MockTokenResponse) -> Self {
        self.default_response = response;
        self
    }

    /// Start the server and mount the configured responses.
    pub async fn build(self) -> MockTokenServer {
        let server = MockServer::start().await;

        for (endpoint, response) in self.responses {
            let mock = Mock::given(method("POST")).and(path(endpoint.as_str()));
            response.mount(mock, None, &server).await;
        }
        self.default_response
            .mount(Mock::given(any()), Some(FALLBACK_PRIORITY), &server)
            .await;

        MockTokenServer { server }
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A mock OAuth2 token endpoint. Shuts down when dropped.
pub struct MockTokenServer {
    server: MockServer,
}

impl MockTokenServer {
    /// Create a new builder for the mock server.
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Get the server's listening address.
    pub fn addr(&self) -> SocketAddr {
        *self.server.address()
    }

    /// Base URL to use as the token authority, or as an HTTP proxy.
    pub fn authority(&self) -> String {
        self.server.uri()
    }

    /// All requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(RecordedRequest::from)
            .collect()
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
