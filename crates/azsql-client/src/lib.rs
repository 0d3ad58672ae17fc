//! # azsql-client
//!
//! Token-authenticated connection parameters for SQL Server ODBC drivers.
//!
//! The client turns a service principal stored in an INI credentials file
//! into everything an ODBC driver needs to open an Azure SQL connection:
//! a `;`-delimited connection string and the access token encoded for the
//! `SQL_COPT_SS_ACCESS_TOKEN` (1256) pre-connect attribute.
//!
//! ## Pipeline
//!
//! ```text
//! driver check -> credentials file -> token endpoint -> encoded token
//!              -> (connection string, token) -> driver or engine
//! ```
//!
//! Each call runs the whole pipeline once. Tokens are never cached.
//!
//! ## Connectors
//!
//! | Function | Hands off to |
//! |----------|--------------|
//! | [`connect`] | a [`DriverConnect`] implementation |
//! | [`create_engine`] | an [`EngineFactory`] implementation via `mssql+<dialect>:///?odbc_connect=...` |
//! | [`make_conn_params`] | the caller |
//!
//! ## Example
//!
//! ```rust,ignore
//! use azsql_auth::ClientCredentialsFlow;
//! use azsql_client::{ConnectOptions, OdbcInstRegistry, make_conn_params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ConnectOptions::new(
//!         "myserver.database.windows.net",
//!         "sales",
//!         "/etc/azsql/credentials.ini",
//!     )
//!     .app("reporting")
//!     .attribute("Encrypt", "yes");
//!
//!     let params = make_conn_params(
//!         &options,
//!         &OdbcInstRegistry::system(),
//!         &ClientCredentialsFlow::new(),
//!     )
//!     .await?;
//!
//!     println!("{}", params.connection_string());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod conn_str;
pub mod driver;
pub mod engine;
pub mod error;
pub mod params;

pub use config::{
    AZURE_AUTHORITY, AZURE_RESOURCE_SQL_DATABASE, ConnectOptions, DEFAULT_DIALECT, MSSQL_DRIVER,
};
pub use conn_str::ConnectionString;
pub use driver::{
    DriverConnect, DriverRegistry, OdbcInstRegistry, PreConnectAttrs, SQL_COPT_SS_ACCESS_TOKEN,
    StaticDrivers, connect,
};
pub use engine::{EngineFactory, EngineUrl, create_engine};
pub use error::{BoxError, Error, Result};
pub use params::{ConnectionParams, build_connection_string, make_conn_params};

// Re-export the auth types callers need to build a pipeline.
pub use azsql_auth::{ClientCredentialsFlow, EncodedToken, TokenSource, encode_token};
