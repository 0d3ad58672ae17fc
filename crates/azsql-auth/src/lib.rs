//! # azsql-auth
//!
//! Azure AD client-credentials tokens for SQL Server ODBC connections.
//!
//! This crate covers the authentication half of opening a token-authenticated
//! connection, isolated from connection-string handling for better
//! modularity and testing:
//!
//! 1. [`read_credentials`] resolves a `tenant_id`/`client_id`/`client_secret`
//!    section from an INI credentials file.
//! 2. A [`TokenSource`] exchanges it for an access token. The default is
//!    [`ClientCredentialsFlow`], an OAuth2 client-credentials POST.
//! 3. [`encode_token`] packs the token into the length-prefixed UTF-16LE
//!    buffer expected by the driver's `SQL_COPT_SS_ACCESS_TOKEN` attribute.
//!
//! ## Token Sources
//!
//! | Source | Feature Flag | Description |
//! |--------|--------------|-------------|
//! | `ClientCredentialsFlow` | default | Form POST to `{authority}/{tenant}/oauth2/v2.0/token` |
//! | `ServicePrincipalAuth` | `azure-identity` | `azure_identity::ClientSecretCredential` |
//!
//! Tokens are never cached; every call performs a fresh exchange.

#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "azure-identity")]
pub mod azure_identity_auth;
pub mod client_credentials;
pub mod credentials;
pub mod error;
pub mod ini;
pub mod provider;
pub mod token;

#[cfg(feature = "azure-identity")]
pub use azure_identity_auth::ServicePrincipalAuth;
pub use client_credentials::{ClientCredentialsFlow, Proxies, TokenRequest};
pub use credentials::{CredentialSection, CredentialStore, REQUIRED_KEYS, read_credentials};
pub use error::{AuthError, ConfigError};
pub use provider::TokenSource;
pub use token::{AccessToken, EncodedToken, encode_token};
