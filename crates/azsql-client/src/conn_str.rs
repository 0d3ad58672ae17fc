//! ODBC connection strings.
//!
//! A connection string is an ordered list of `Key=Value` pairs joined with
//! `;`. Values are written verbatim: no quoting or escaping is applied, so
//! callers must not pass values containing `;` or `=` unless the driver
//! accepts them.

use std::fmt;

use crate::error::Error;

/// An ordered set of connection attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    /// Create an empty connection string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `Key=Value;Key=Value` text.
    ///
    /// Empty segments are skipped; the first `=` separates key and value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] for a segment without `=` or with an empty key.
    pub fn parse(conn_str: &str) -> Result<Self, Error> {
        let mut parsed = Self::new();

        for part in conn_str.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::Options(format!("invalid key-value: {part}")))?;

            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Options(format!("missing key: {part}")));
            }
            parsed.set(key, value.trim());
        }

        Ok(parsed)
    }

    /// Set an attribute. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up an attribute by exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All pairs in order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Whether no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
