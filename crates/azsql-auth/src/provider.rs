//! Token source trait.
//!
//! A [`TokenSource`] exchanges a [`TokenRequest`] for an [`AccessToken`].
//! The connection builder depends only on this trait, so tests and
//! alternative identity backends can be substituted freely.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client_credentials::TokenRequest;
use crate::error::AuthError;
use crate::token::{AccessToken, EncodedToken};

/// Something that can obtain access tokens.
///
/// Implementations must not cache: every call performs a fresh exchange.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Acquire a token for the request's scope.
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError>;

    /// Acquire a token and encode it for the driver.
    async fn acquire_encoded(&self, request: &TokenRequest) -> Result<EncodedToken, AuthError> {
        Ok(self.acquire_token(request).await?.encode())
    }
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for &T {
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError> {
        (**self).acquire_token(request).await
    }
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Box<T> {
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError> {
        (**self).acquire_token(request).await
    }
}

#[async_trait]
impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    async fn acquire_token(&self, request: &TokenRequest) -> Result<AccessToken, AuthError> {
        (**self).acquire_token(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::CredentialSection;

    struct Fixed(&'static str);

    #[async_trait]
    impl TokenSource for Fixed {
        async fn acquire_token(&self, _request: &TokenRequest) -> Result<AccessToken, AuthError> {
            Ok(AccessToken::new(self.0))
        }
    }

    fn request() -> TokenRequest {
        TokenRequest::new(
            "https://login.example",
            "https://db.example",
            &CredentialSection::new("t", "c", "s"),
        )
    }

    #[test]
    fn test_acquire_encoded_default_method() {
        let encoded = tokio_test::block_on(Fixed("AB").acquire_encoded(&request())).unwrap();
        assert_eq!(encoded.as_bytes(), &[4, 0, 0, 0, 0x41, 0, 0x42, 0]);
    }

    #[tokio::test]
    async fn test_trait_object_forwarding() {
        let boxed: Box<dyn TokenSource> = Box::new(Fixed("x"));
        let shared: Arc<dyn TokenSource> = Arc::new(Fixed("y"));

        assert_eq!(boxed.acquire_token(&request()).await.unwrap().secret(), "x");
        assert_eq!(shared.acquire_token(&request()).await.unwrap().secret(), "y");
    }
}
