//! Connection options.

use std::path::{Path, PathBuf};

use azsql_auth::{CredentialSection, Proxies, TokenRequest};

use crate::conn_str::ConnectionString;
use crate::error::Error;

/// Public-cloud Azure AD authority.
pub const AZURE_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Resource identifier for Azure SQL Database.
pub const AZURE_RESOURCE_SQL_DATABASE: &str = "https://database.windows.net";

/// ODBC driver used when none is configured.
pub const MSSQL_DRIVER: &str = "ODBC Driver 17 for SQL Server";

/// Engine URL dialect used when none is configured.
pub const DEFAULT_DIALECT: &str = "pyodbc";

/// Everything needed to build connection parameters for one server.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Server host name, e.g. `myserver.database.windows.net`.
    pub server: String,
    /// Database name.
    pub database: String,
    /// Path of the INI file holding the service principal credentials.
    pub credentials_file: PathBuf,
    /// Credentials section to use. Required when the file has several.
    pub app: Option<String>,
    /// Identity provider base URL.
    pub authority: String,
    /// Resource the token is requested for.
    pub resource: String,
    /// Proxies for the token request.
    pub proxies: Proxies,
    /// ODBC driver name, without braces.
    pub driver: String,
    /// Extra connection string attributes, in the order supplied.
    pub attributes: Vec<(String, String)>,
    /// Engine URL dialect (`mssql+<dialect>`).
    pub dialect: String,
}

impl ConnectOptions {
    /// Create options with the default authority, resource and driver.
    pub fn new(
        server: impl Into<String>,
        database: impl Into<String>,
        credentials_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
            credentials_file: credentials_file.into(),
            app: None,
            authority: AZURE_AUTHORITY.to_string(),
            resource: AZURE_RESOURCE_SQL_DATABASE.to_string(),
            proxies: Proxies::new(),
            driver: MSSQL_DRIVER.to_string(),
            attributes: Vec::new(),
            dialect: DEFAULT_DIALECT.to_string(),
        }
    }

    /// Select the credentials section.
    #[must_use]
    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the identity provider base URL.
    #[must_use]
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Set the resource the token is requested for.
    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Route token requests for `scheme` (`http`, `https` or `all`) through a proxy.
    #[must_use]
    pub fn proxy(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.proxies.insert(scheme, url);
        self
    }

    /// Set the ODBC driver name.
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    /// Append an extra connection string attribute.
    ///
    /// Setting a key that was already added replaces its value in place.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    /// Set the engine URL dialect.
    #[must_use]
    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// Append attributes from `Key=Value;Key=Value` text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if a part has no `=`.
    pub fn attributes_from_str(self, attributes: &str) -> Result<Self, Error> {
        let parsed = ConnectionString::parse(attributes)?;
        Ok(parsed
            .pairs()
            .iter()
            .fold(self, |options, (key, value)| options.attribute(key, value)))
    }

    /// Path of the credentials file.
    #[must_use]
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_file
    }

    /// Build the token request for a credentials section.
    #[must_use]
    pub fn token_request(&self, credentials: &CredentialSection) -> TokenRequest {
        TokenRequest::new(&self.authority, &self.resource, credentials)
            .with_proxies(self.proxies.clone())
    }
}
