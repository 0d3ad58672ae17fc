//! Access tokens and their driver wire encoding.
//!
//! SQL Server ODBC drivers accept an Azure AD token through the
//! `SQL_COPT_SS_ACCESS_TOKEN` pre-connect attribute. The attribute value is
//! a length-prefixed UTF-16LE buffer:
//!
//! ```text
//! +----------------+--------------------------------+
//! | u32 LE: N      | N bytes: token as UTF-16LE     |
//! +----------------+--------------------------------+
//! ```
//!
//! `N` counts bytes, not characters. Tokens issued by Azure AD are ASCII, so
//! every character is followed by a single zero byte.

use std::fmt;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// An access token returned by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_in: Option<Duration>,
}

impl AccessToken {
    /// Wrap a raw token string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_in: None,
        }
    }

    /// Record the lifetime reported by the provider.
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// The raw token string.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Lifetime reported by the provider, if any. Informational only.
    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }

    /// Encode for the driver's access-token attribute.
    #[must_use]
    pub fn encode(&self) -> EncodedToken {
        encode_token(&self.secret)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A token in the driver's length-prefixed UTF-16LE format.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedToken(Bytes);

impl EncodedToken {
    /// The full buffer, prefix included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The encoded characters, without the prefix.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.0[LENGTH_PREFIX_SIZE..]
    }

    /// The value of the length prefix.
    #[must_use]
    pub fn declared_len(&self) -> u32 {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&self.0[..LENGTH_PREFIX_SIZE]);
        u32::from_le_bytes(prefix)
    }

    /// Total buffer length, prefix included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the encoded token carries no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.len() == LENGTH_PREFIX_SIZE
    }

    /// Consume into the underlying buffer.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for EncodedToken {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedToken")
            .field("len", &self.0.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// Encode a raw access token for `SQL_COPT_SS_ACCESS_TOKEN`.
#[must_use]
pub fn encode_token(token: &str) -> EncodedToken {
    let payload_len = token.encode_utf16().count() * 2;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload_len);
    buf.put_u32_le(payload_len as u32);
    for unit in token.encode_utf16() {
        buf.put_u16_le(unit);
    }

    EncodedToken(buf.freeze())
}
