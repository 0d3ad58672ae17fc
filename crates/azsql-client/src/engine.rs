//! Engine construction from an `mssql+<dialect>` URL.

use std::fmt;

use azsql_auth::TokenSource;

use crate::config::ConnectOptions;
use crate::driver::{DriverRegistry, PreConnectAttrs};
use crate::error::{Error, Result};
use crate::params::make_conn_params;

/// A `mssql+<dialect>:///?odbc_connect=<conn str>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineUrl {
    dialect: String,
    odbc_connect: String,
}

impl EngineUrl {
    /// Wrap a raw ODBC connection string.
    pub fn new(dialect: impl Into<String>, odbc_connect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            odbc_connect: odbc_connect.into(),
        }
    }

    /// The dialect suffix after `mssql+`.
    #[must_use]
    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// The unencoded connection string.
    #[must_use]
    pub fn odbc_connect(&self) -> &str {
        &self.odbc_connect
    }
}

impl fmt::Display for EngineUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mssql+{}:///?odbc_connect=", self.dialect)?;
        for chunk in url::form_urlencoded::byte_serialize(self.odbc_connect.as_bytes()) {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

/// Constructs a database engine from a URL and pre-connect attributes.
pub trait EngineFactory {
    /// Engine returned on success.
    type Engine;
    /// Factory error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the engine.
    fn create_engine(
        &self,
        url: &EngineUrl,
        attrs: &PreConnectAttrs,
    ) -> std::result::Result<Self::Engine, Self::Error>;
}

/// Build connection parameters and hand them to an engine factory.
///
/// # Errors
///
/// Propagates every [`make_conn_params`] error unchanged, and wraps a
/// factory failure in [`Error::Engine`].
pub async fn create_engine<R, T, F>(
    options: &ConnectOptions,
    registry: &R,
    tokens: &T,
    factory: &F,
) -> Result<F::Engine>
where
    R: DriverRegistry + ?Sized,
    T: TokenSource + ?Sized,
    F: EngineFactory,
{
    let (conn_str, token) = make_conn_params(options, registry, tokens)
        .await?
        .into_parts();
    let url = EngineUrl::new(&options.dialect, conn_str);
    let attrs = PreConnectAttrs::access_token(token);

    tracing::debug!(dialect = %url.dialect(), "creating engine");
    factory
        .create_engine(&url, &attrs)
        .map_err(|e| Error::Engine(Box::new(e)))
}
