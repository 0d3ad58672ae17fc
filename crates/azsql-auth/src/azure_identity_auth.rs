//! Token acquisition through the Azure SDK.
//!
//! [`ServicePrincipalAuth`] implements [`TokenSource`] with
//! `azure_identity::ClientSecretCredential`. It requests the same
//! `{resource}//.default` scope as [`ClientCredentialsFlow`], but the SDK
//! owns the authority and HTTP stack, so only the public-cloud authority is
//! accepted and proxies are not supported.
//!
//! ```rust,ignore
//! use azsql_auth::{CredentialSection, ServicePrincipalAuth, TokenRequest, TokenSource};
//!
//! let creds = CredentialSection::new("tenant", "client", "secret");
//! let request = TokenRequest::new(
//!     "https://login.microsoftonline.com",
//!     "https://database.windows.net",
//!     &creds,
//! );
//! let token = ServicePrincipalAuth::new().acquire_token(&request).await?;
//! ```
//!
//! [`ClientCredentialsFlow`]: crate::ClientCredentialsFlow

use std::time::Duration;

use async_trait::async_trait;
use azure_core::credentials::{Secret, TokenCredential};
use azure_identity::ClientSecretCredential;

use crate::client_credentials::TokenRequest;
use crate::error::AuthError;
use crate::provider::TokenSource;
use crate::token::AccessToken;

/// The only authority the SDK-backed source talks to.
pub const PUBLIC_CLOUD_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Service principal token source backed by `azure_identity`.
#[derive(Debug, Clone, Default)]
pub struct ServicePrincipalAuth;

impl ServicePrincipalAuth {
    /// Create the token source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check_request(request: &TokenRequest) -> Result<(), AuthError> {
        if request.authority().trim_end_matches('/') != PUBLIC_CLOUD_AUTHORITY {
            return Err(AuthError::Configuration(format!(
                "azure_identity backend only supports the {PUBLIC_CLOUD_AUTHORITY} authority"
            )));
        }
        if !request.proxies().is_empty() {
            return Err(AuthError::Configuration(
                "azure_identity backend does not support proxies".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenSource for ServicePrincipalAuth {
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError> {
        Self::check_request(request)?;

        let secret = Secret::new(request.client_secret().to_string());
        let credential = ClientSecretCredential::new(
            request.tenant_id(),
            request.client_id().to_string(),
            secret,
            None,
        )
        .map_err(|e| AuthError::AzureIdentity(e.to_string()))?;

        let scope = request.scope();
        tracing::debug!(scope = %scope, "requesting token via azure_identity");

        let token = credential
            .get_token(&[scope.as_str()], None)
            .await
            .map_err(|e| AuthError::AzureIdentity(e.to_string()))?;

        let now = time::OffsetDateTime::now_utc();
        let access = AccessToken::new(token.token.secret().to_string());
        Ok(if token.expires_on > now {
            let diff = token.expires_on - now;
            access.with_expires_in(Duration::from_secs(diff.whole_seconds().max(0) as u64))
        } else {
            access
        })
    }
}
