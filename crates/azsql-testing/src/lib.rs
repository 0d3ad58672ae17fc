//! # azsql-testing
//!
//! Test infrastructure for azsql development.
//!
//! This crate provides a mock OAuth2 token endpoint and temporary INI file
//! fixtures, so the whole credential-to-token pipeline can be exercised
//! without network access to a real identity provider.
//!
//! ## Features
//!
//! - Mock token endpoint on `wiremock` (no Azure tenant required)
//! - Request recording with decoded form fields
//! - Temporary credentials and `odbcinst.ini` files
//!
//! ## Mock Server Example
//!
//! ```rust,ignore
//! use azsql_testing::{MockTokenServer, MockTokenResponse};
//!
//! #[tokio::test]
//! async fn test_with_mock_server() {
//!     let server = MockTokenServer::builder()
//!         .with_tenant_response("tenant", MockTokenResponse::token("eyJ0eXAi..."))
//!         .build()
//!         .await;
//!
//!     // Point the token request's authority at server.authority()
//!     let authority = server.authority();
//!     // ...
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_token_server;

pub use fixtures::{TempIniFile, service_principal_section};
pub use mock_token_server::{MockServerBuilder, MockTokenResponse, MockTokenServer, RecordedRequest};
