//! Connection parameter builder.

use std::fmt;

use azsql_auth::{EncodedToken, TokenSource, read_credentials};

use crate::config::ConnectOptions;
use crate::conn_str::ConnectionString;
use crate::driver::DriverRegistry;
use crate::error::{Error, Result};

/// Keys the builder always sets; caller attributes with these keys are ignored.
const RESERVED_KEYS: [&str; 3] = ["Driver", "Server", "Database"];

/// A connection string paired with the encoded access token.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    connection_string: String,
    token: EncodedToken,
}

impl ConnectionParams {
    /// Pair a connection string with a token.
    #[must_use]
    pub fn new(connection_string: impl Into<String>, token: EncodedToken) -> Self {
        Self {
            connection_string: connection_string.into(),
            token,
        }
    }

    /// The ODBC connection string.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// The encoded access token.
    #[must_use]
    pub fn token(&self) -> &EncodedToken {
        &self.token
    }

    /// Split into connection string and token.
    #[must_use]
    pub fn into_parts(self) -> (String, EncodedToken) {
        (self.connection_string, self.token)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("connection_string", &self.connection_string)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Render the connection string for a set of options.
///
/// `Driver`, `Server` and `Database` come first, followed by the extra
/// attributes in the order supplied.
#[must_use]
pub fn build_connection_string(options: &ConnectOptions) -> ConnectionString {
    let mut conn = ConnectionString::new()
        .with("Driver", format!("{{{}}}", options.driver))
        .with("Server", &options.server)
        .with("Database", &options.database);

    for (key, value) in &options.attributes {
        if RESERVED_KEYS.contains(&key.as_str()) {
            tracing::debug!(key = %key, "ignoring attribute set by the builder");
            continue;
        }
        conn.set(key, value);
    }

    conn
}

/// Build the connection string and fetch a fresh encoded token.
///
/// The driver is checked before the credentials file is read, so a missing
/// driver never costs a network round trip.
///
/// # Errors
///
/// - [`Error::Driver`] if `options.driver` is not in the registry
/// - [`Error::Config`] if the credentials cannot be read
/// - [`Error::Auth`] if no token could be obtained
pub async fn make_conn_params<R, T>(
    options: &ConnectOptions,
    registry: &R,
    tokens: &T,
) -> Result<ConnectionParams>
where
    R: DriverRegistry + ?Sized,
    T: TokenSource + ?Sized,
{
    tracing::debug!(driver = %options.driver, "checking driver");
    if !registry.contains(&options.driver)? {
        return Err(Error::Driver(options.driver.clone()));
    }

    let connection_string = build_connection_string(options).to_string();

    let credentials = read_credentials(&options.credentials_file, options.app.as_deref())?;
    let request = options.token_request(&credentials);
    tracing::debug!(
        authority = %request.authority_url(),
        scope = %request.scope(),
        "requesting access token"
    );
    let token = tokens.acquire_encoded(&request).await?;

    Ok(ConnectionParams::new(connection_string, token))
}
