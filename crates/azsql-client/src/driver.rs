//! ODBC driver registry and the driver-connect path.
//!
//! The driver never sees the raw access token. It receives the connection
//! string plus a pre-connect attribute map holding the encoded token under
//! [`SQL_COPT_SS_ACCESS_TOKEN`].

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use azsql_auth::ini::Ini;
use azsql_auth::{EncodedToken, TokenSource};
use bytes::Bytes;

use crate::config::ConnectOptions;
use crate::error::{Error, Result};
use crate::params::make_conn_params;

/// Pre-connect attribute that carries an access token to the SQL Server ODBC driver.
pub const SQL_COPT_SS_ACCESS_TOKEN: i32 = 1256;

/// Sections of `odbcinst.ini` that are not drivers.
const ODBCINST_RESERVED_SECTIONS: [&str; 2] = ["ODBC Drivers", "ODBC"];

/// A source of installed ODBC driver names.
pub trait DriverRegistry {
    /// Names of all installed drivers.
    fn drivers(&self) -> Result<Vec<String>>;

    /// Whether a driver with exactly this name is installed.
    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.drivers()?.iter().any(|d| d == name))
    }
}

impl<T: DriverRegistry + ?Sized> DriverRegistry for &T {
    fn drivers(&self) -> Result<Vec<String>> {
        (**self).drivers()
    }

    fn contains(&self, name: &str) -> Result<bool> {
        (**self).contains(name)
    }
}

/// A fixed list of driver names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDrivers {
    drivers: Vec<String>,
}

impl StaticDrivers {
    /// Create a registry from driver names.
    pub fn new<I, S>(drivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drivers: drivers.into_iter().map(Into::into).collect(),
        }
    }
}

impl DriverRegistry for StaticDrivers {
    fn drivers(&self) -> Result<Vec<String>> {
        Ok(self.drivers.clone())
    }

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.drivers.iter().any(|d| d == name))
    }
}

/// Drivers declared in a unixODBC `odbcinst.ini`.
///
/// The file is read on every lookup. A missing file means no drivers are
/// installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdbcInstRegistry {
    path: PathBuf,
}

impl OdbcInstRegistry {
    /// Read drivers from an explicit file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the system file the way unixODBC does.
    ///
    /// `ODBCSYSINI` names the directory (default `/etc`) and `ODBCINSTINI`
    /// the file name (default `odbcinst.ini`).
    #[must_use]
    pub fn system() -> Self {
        let dir = env::var_os("ODBCSYSINI").map_or_else(|| PathBuf::from("/etc"), PathBuf::from);
        let file = env::var_os("ODBCINSTINI")
            .map_or_else(|| PathBuf::from("odbcinst.ini"), PathBuf::from);
        Self::new(dir.join(file))
    }

    /// Path of the file read by this registry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DriverRegistry for OdbcInstRegistry {
    fn drivers(&self) -> Result<Vec<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "odbcinst.ini not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::Registry(format!("{}: {e}", self.path.display())));
            }
        };

        let ini = Ini::parse_relaxed(&contents)
            .map_err(|e| Error::Registry(format!("{}: {e}", self.path.display())))?;

        Ok(ini
            .section_names()
            .filter(|name| !ODBCINST_RESERVED_SECTIONS.contains(name))
            .map(str::to_string)
            .collect())
    }
}

/// Pre-connect attributes handed to a driver or engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreConnectAttrs {
    attrs: BTreeMap<i32, EncodedToken>,
}

impl PreConnectAttrs {
    /// Attributes carrying only the access token.
    #[must_use]
    pub fn access_token(token: EncodedToken) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(SQL_COPT_SS_ACCESS_TOKEN, token);
        Self { attrs }
    }

    /// Look up an attribute.
    #[must_use]
    pub fn get(&self, attr: i32) -> Option<&EncodedToken> {
        self.attrs.get(&attr)
    }

    /// Owned buffer for an attribute, for drivers that keep it past the call.
    #[must_use]
    pub fn value(&self, attr: i32) -> Option<Bytes> {
        self.attrs.get(&attr).map(|v| v.clone().into_bytes())
    }

    /// Attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &EncodedToken)> {
        self.attrs.iter().map(|(k, v)| (*k, v))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

/// A low-level ODBC connect call.
pub trait DriverConnect {
    /// Connection handle returned on success.
    type Connection;
    /// Driver error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a connection.
    fn connect(
        &self,
        conn_str: &str,
        attrs: &PreConnectAttrs,
    ) -> std::result::Result<Self::Connection, Self::Error>;
}

/// Build connection parameters and open a driver connection with them.
///
/// # Errors
///
/// Propagates every [`make_conn_params`] error unchanged, and wraps a
/// driver failure in [`Error::Connect`].
pub async fn connect<R, T, D>(
    options: &ConnectOptions,
    registry: &R,
    tokens: &T,
    driver: &D,
) -> Result<D::Connection>
where
    R: DriverRegistry + ?Sized,
    T: TokenSource + ?Sized,
    D: DriverConnect,
{
    let (conn_str, token) = make_conn_params(options, registry, tokens)
        .await?
        .into_parts();
    let attrs = PreConnectAttrs::access_token(token);

    tracing::debug!(server = %options.server, database = %options.database, "connecting through driver");
    driver
        .connect(&conn_str, &attrs)
        .map_err(|e| Error::Connect(Box::new(e)))
}
