//! Authentication and credential error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::REQUIRED_KEYS;

/// Default error code reported when the identity provider omits one.
pub const DEFAULT_ERROR_CODE: &str = "error";

/// Default error description reported when the identity provider omits one.
pub const DEFAULT_ERROR_DESCRIPTION: &str = "couldn't obtain token";

/// Errors raised while locating or validating a credentials section.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested section does not exist.
    #[error("couldn't find '{0}' app credentials section")]
    SectionNotFound(String),

    /// No section was requested and the store holds more than one.
    #[error("app must be specified if multiple credentials exist")]
    AmbiguousSection {
        /// Names of the sections that were found.
        sections: Vec<String>,
    },

    /// The store holds no sections at all.
    #[error("no credentials section found")]
    NoSections,

    /// The section contains keys other than the required ones.
    #[error(
        "unknown key{} used: {} (use {})",
        plural(.0),
        quoted(.0),
        quoted(&REQUIRED_KEYS)
    )]
    UnknownKeys(Vec<String>),

    /// The section lacks one or more required keys.
    #[error("missing required key{}: {}", plural(.0), quoted(.0))]
    MissingKeys(Vec<String>),

    /// The credentials file is not valid INI.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The credentials file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

fn plural<S>(keys: &[S]) -> &'static str {
    if keys.len() > 1 { "s" } else { "" }
}

fn quoted<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter()
        .map(|k| format!("'{}'", k.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur while acquiring an access token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider answered without an access token.
    #[error("{error}: {description}")]
    TokenAcquisition {
        /// Provider error code (`error` field).
        error: String,
        /// Provider error description (`error_description` field).
        description: String,
    },

    /// Network error while talking to the identity provider.
    #[error("network error: {0}")]
    Network(String),

    /// The provider's response could not be understood.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token request could not be configured (bad proxy, unsupported authority).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Azure identity error.
    #[error("Azure identity error: {0}")]
    AzureIdentity(String),
}

impl AuthError {
    /// Build a [`AuthError::TokenAcquisition`] from optional provider fields,
    /// substituting the documented defaults for missing values.
    #[must_use]
    pub fn from_provider(error: Option<String>, description: Option<String>) -> Self {
        Self::TokenAcquisition {
            error: error.unwrap_or_else(|| DEFAULT_ERROR_CODE.to_string()),
            description: description.unwrap_or_else(|| DEFAULT_ERROR_DESCRIPTION.to_string()),
        }
    }
}
