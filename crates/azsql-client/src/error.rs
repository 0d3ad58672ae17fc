//! Client error types.

use thiserror::Error;

/// Boxed error returned by driver and engine implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building connection parameters or connecting.
///
/// Every error is terminal for the call that produced it. The variants keep
/// configuration mistakes, missing drivers and identity-provider failures
/// apart so callers can tell them from one another.
#[derive(Debug, Error)]
pub enum Error {
    /// The credentials file or section is missing, ambiguous or malformed.
    #[error("configuration error: {0}")]
    Config(#[from] azsql_auth::ConfigError),

    /// The requested ODBC driver is not installed.
    #[error("couldn't find driver '{0}'")]
    Driver(String),

    /// The installed-driver registry could not be read.
    #[error("driver registry error: {0}")]
    Registry(String),

    /// The identity provider rejected or failed the token request.
    #[error("authentication failed: {0}")]
    Auth(#[from] azsql_auth::AuthError),

    /// Invalid connection options.
    #[error("invalid options: {0}")]
    Options(String),

    /// The driver connect call failed.
    ///
    /// Displays as the driver's own message; the driver error is the source.
    #[error("{0}")]
    Connect(#[source] BoxError),

    /// The engine constructor failed.
    ///
    /// Displays as the factory's own message; the factory error is the source.
    #[error("{0}")]
    Engine(#[source] BoxError),
}

impl Error {
    /// Check if this error came from the credentials file or section.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Options(_))
    }

    /// Check if this error means the driver is unavailable.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver(_) | Self::Registry(_))
    }

    /// Check if this error came from the identity provider.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use azsql_auth::{AuthError, ConfigError};

    #[test]
    fn test_classification() {
        let config: Error = ConfigError::NoSections.into();
        assert!(config.is_config_error());
        assert!(!config.is_auth_error());

        let driver = Error::Driver("ODBC Driver 17 for SQL Server".into());
        assert!(driver.is_driver_error());
        assert_eq!(
            driver.to_string(),
            "couldn't find driver 'ODBC Driver 17 for SQL Server'"
        );

        let auth: Error = AuthError::from_provider(None, None).into();
        assert!(auth.is_auth_error());
        assert!(!auth.is_driver_error());
    }

    #[test]
    fn test_connect_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::Connect(Box::new(io));
        assert_eq!(err.to_string(), "refused");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("refused"));
    }
}
