//! OAuth2 client-credentials token acquisition.
//!
//! The request is a form POST to the tenant's v2.0 token endpoint:
//!
//! ```text
//! POST {authority}/{tenant_id}/oauth2/v2.0/token
//! grant_type=client_credentials&client_id=..&client_secret=..&scope={resource}//.default
//! ```
//!
//! The scope keeps a double slash before `.default`. Azure AD accepts it for
//! resource URLs without a trailing slash, and it is sent exactly as built.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::credentials::CredentialSection;
use crate::error::AuthError;
use crate::provider::TokenSource;
use crate::token::AccessToken;

/// Path of the token endpoint below the tenant authority URL.
pub const TOKEN_ENDPOINT_PATH: &str = "oauth2/v2.0/token";

/// Suffix appended to the resource to form the requested scope.
pub const DEFAULT_SCOPE_SUFFIX: &str = "//.default";

/// Proxy URLs keyed by scheme (`http`, `https` or `all`).
///
/// Entries are handed to the HTTP client unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Proxies {
    entries: Vec<(String, String)>,
}

impl Proxies {
    /// Create an empty proxy map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proxy for a scheme, replacing any previous one.
    pub fn insert(&mut self, scheme: impl Into<String>, url: impl Into<String>) {
        let scheme = scheme.into();
        let url = url.into();
        match self.entries.iter_mut().find(|(s, _)| *s == scheme) {
            Some((_, existing)) => *existing = url,
            None => self.entries.push((scheme, url)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.insert(scheme, url);
        self
    }

    /// Look up the proxy for a scheme.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == scheme)
            .map(|(_, u)| u.as_str())
    }

    /// Iterate over `(scheme, url)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, u)| (s.as_str(), u.as_str()))
    }

    /// Whether no proxy is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, U: Into<String>> FromIterator<(S, U)> for Proxies {
    fn from_iter<I: IntoIterator<Item = (S, U)>>(iter: I) -> Self {
        let mut proxies = Self::new();
        for (scheme, url) in iter {
            proxies.insert(scheme, url);
        }
        proxies
    }
}

impl fmt::Debug for Proxies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Proxy URLs may embed credentials.
        f.debug_struct("Proxies")
            .field("schemes", &self.entries.iter().map(|(s, _)| s).collect::<Vec<_>>())
            .finish()
    }
}

/// Everything needed for one client-credentials exchange.
#[derive(Clone)]
pub struct TokenRequest {
    authority: String,
    tenant_id: String,
    resource: String,
    client_id: String,
    client_secret: String,
    proxies: Proxies,
}

impl TokenRequest {
    /// Build a request from an authority base URL, a resource URL and a
    /// credentials section.
    pub fn new(
        authority: impl Into<String>,
        resource: impl Into<String>,
        credentials: &CredentialSection,
    ) -> Self {
        Self {
            authority: authority.into(),
            tenant_id: credentials.tenant_id().to_string(),
            resource: resource.into(),
            client_id: credentials.client_id().to_string(),
            client_secret: credentials.client_secret().to_string(),
            proxies: Proxies::new(),
        }
    }

    /// Route the request through proxies.
    #[must_use]
    pub fn with_proxies(mut self, proxies: Proxies) -> Self {
        self.proxies = proxies;
        self
    }

    /// `authority` without trailing slashes, then `/`, then the tenant ID.
    #[must_use]
    pub fn authority_url(&self) -> String {
        format!("{}/{}", self.authority.trim_end_matches('/'), self.tenant_id)
    }

    /// `resource` without trailing slashes, then `//.default`.
    #[must_use]
    pub fn scope(&self) -> String {
        format!(
            "{}{DEFAULT_SCOPE_SUFFIX}",
            self.resource.trim_end_matches('/')
        )
    }

    /// The token endpoint the request is posted to.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/{TOKEN_ENDPOINT_PATH}", self.authority_url())
    }

    /// Authority base URL as given.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Resource URL as given.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Tenant ID.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Configured proxies.
    #[must_use]
    pub fn proxies(&self) -> &Proxies {
        &self.proxies
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("resource", &self.resource)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("proxies", &self.proxies)
            .finish()
    }
}

/// Token endpoint response. Both success and error bodies share this shape.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<serde_json::Value>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken, AuthError> {
        let Some(secret) = self.access_token else {
            return Err(AuthError::from_provider(self.error, self.error_description));
        };

        // v2.0 endpoints send a number, older ones a numeric string.
        let expires_in = match self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        };

        let token = AccessToken::new(secret);
        Ok(match expires_in {
            Some(secs) => token.with_expires_in(Duration::from_secs(secs)),
            None => token,
        })
    }
}

/// Client-credentials grant over HTTPS.
///
/// A new HTTP client is built per call so each request honours its own
/// proxy settings. Nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct ClientCredentialsFlow {
    timeout: Option<Duration>,
}

impl ClientCredentialsFlow {
    /// Create a flow with the HTTP client's default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole token request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn http_client(&self, proxies: &Proxies) -> Result<reqwest::Client, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        for (scheme, url) in proxies.iter() {
            let proxy = match scheme {
                "http" => reqwest::Proxy::http(url),
                "https" => reqwest::Proxy::https(url),
                "all" => reqwest::Proxy::all(url),
                other => {
                    return Err(AuthError::Configuration(format!(
                        "unsupported proxy scheme '{other}'"
                    )));
                }
            }
            .map_err(|e| AuthError::Configuration(format!("invalid {scheme} proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| AuthError::Configuration(e.to_string()))
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsFlow {
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError> {
        let endpoint = request.token_endpoint();
        let scope = request.scope();

        tracing::debug!(
            authority = %request.authority_url(),
            scope = %scope,
            client_id = request.client_id(),
            "requesting client credentials token"
        );

        let client = self.http_client(request.proxies())?;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", request.client_id()),
            ("client_secret", request.client_secret()),
            ("scope", scope.as_str()),
        ];

        let response = client
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("HTTP {status}: {e}")))?;

        let result = parsed.into_access_token();
        match &result {
            Ok(_) => tracing::debug!(status = %status, "token acquired"),
            Err(e) => tracing::debug!(status = %status, error = %e, "token request rejected"),
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn request(authority: &str, resource: &str) -> TokenRequest {
        TokenRequest::new(authority, resource, &CredentialSection::new("tenant", "c", "s"))
    }

    #[test]
    fn test_scope_keeps_double_slash() {
        let req = request(
            "https://login.microsoftonline.com",
            "https://database.windows.net/",
        );
        assert_eq!(req.scope(), "https://database.windows.net//.default");

        let req = request(
            "https://login.microsoftonline.com",
            "https://database.windows.net",
        );
        assert_eq!(req.scope(), "https://database.windows.net//.default");
    }

    #[test]
    fn test_authority_url_strips_trailing_slashes() {
        let req = request("https://login.microsoftonline.com//", "https://db");
        assert_eq!(req.authority_url(), "https://login.microsoftonline.com/tenant");
        assert_eq!(
            req.token_endpoint(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_response_with_token() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"token_type":"Bearer","expires_in":3599,"access_token":"abc"}"#,
        )
        .unwrap();
        let token = parsed.into_access_token().unwrap();
        assert_eq!(token.secret(), "abc");
        assert_eq!(token.expires_in(), Some(Duration::from_secs(3599)));
    }

    #[test]
    fn test_response_with_string_expiry() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"expires_in":"3600","access_token":"abc"}"#).unwrap();
        assert_eq!(
            parsed.into_access_token().unwrap().expires_in(),
            Some(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_response_error_fields() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"error":"invalid_client","error_description":"bad secret"}"#,
        )
        .unwrap();
        match parsed.into_access_token().unwrap_err() {
            AuthError::TokenAcquisition { error, description } => {
                assert_eq!(error, "invalid_client");
                assert_eq!(description, "bad secret");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_error_defaults() {
        let parsed: TokenResponse = serde_json::from_str("{}").unwrap();
        let err = parsed.into_access_token().unwrap_err();
        assert_eq!(err.to_string(), "error: couldn't obtain token");
    }

    #[test]
    fn test_proxies_replace_and_iterate() {
        let proxies: Proxies = [("http", "http://a:1"), ("https", "http://b:2")]
            .into_iter()
            .collect();
        let proxies = proxies.with("http", "http://c:3");
        assert_eq!(proxies.get("http"), Some("http://c:3"));
        assert_eq!(
            proxies.iter().collect::<Vec<_>>(),
            [("http", "http://c:3"), ("https", "http://b:2")]
        );
    }

    #[test]
    fn test_unsupported_proxy_scheme() {
        let proxies = Proxies::new().with("socks9", "socks9://x");
        let err = ClientCredentialsFlow::new().http_client(&proxies).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_secret_and_proxy_urls() {
        let req = TokenRequest::new(
            "https://login",
            "https://db",
            &CredentialSection::new("t", "c", "hunter2"),
        )
        .with_proxies(Proxies::new().with("https", "http://user:pw@proxy:8080"));
        let debug = format!("{req:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("user:pw"));
    }
}
