//! Service principal credentials read from INI-style files.
//!
//! A credentials file holds one section per application, each with exactly
//! the keys `tenant_id`, `client_id` and `client_secret`:
//!
//! ```ini
//! [reporting]
//! tenant_id = 00000000-0000-0000-0000-000000000000
//! client_id = 11111111-1111-1111-1111-111111111111
//! client_secret = s3cr3t
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;
use crate::ini::Ini;

/// The keys every credentials section must contain, and no others.
pub const REQUIRED_KEYS: [&str; 3] = ["tenant_id", "client_id", "client_secret"];

/// A validated service principal credentials section.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize, zeroize::ZeroizeOnDrop))]
pub struct CredentialSection {
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl CredentialSection {
    /// Create a section from its three fields.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Validate a raw key/value mapping.
    ///
    /// Unknown keys are reported before missing ones; both lists are sorted.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKeys`] or [`ConfigError::MissingKeys`].
    pub fn from_entries(entries: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let unknown: Vec<String> = entries
            .keys()
            .filter(|k| !REQUIRED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::UnknownKeys(unknown));
        }

        let mut missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| !entries.contains_key(**k))
            .map(|k| (*k).to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(ConfigError::MissingKeys(missing));
        }

        let field = |key: &str| entries.get(key).cloned().unwrap_or_default();
        Ok(Self::new(
            field("tenant_id"),
            field("client_id"),
            field("client_secret"),
        ))
    }

    /// Azure AD tenant (directory) ID.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Application (client) ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for CredentialSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSection")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Named credential sections, in the order they were added.
///
/// This is the mapping-of-mappings the reader resolves against. It can be
/// filled from an INI document or assembled in code.
#[derive(Clone, Default)]
pub struct CredentialStore {
    sections: Vec<(String, BTreeMap<String, String>)>,
}

impl CredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from INI text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid INI.
    pub fn from_ini(input: &str) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        for section in Ini::parse(input)?.into_sections() {
            let (name, entries) = section.into_parts();
            store.insert(name, entries);
        }
        Ok(store)
    }

    /// Add a section, replacing any existing section of the same name.
    pub fn insert(&mut self, name: impl Into<String>, entries: BTreeMap<String, String>) {
        let name = name.into();
        match self.sections.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entries,
            None => self.sections.push((name, entries)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_section<K, V>(
        mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.insert(name, entries);
        self
    }

    /// Section names in insertion order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the store has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Resolve and validate a credentials section.
    ///
    /// With `app`, that section must exist. Without it, the store must hold
    /// exactly one section. An empty `app` counts as no app.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing which precondition failed.
    pub fn resolve(&self, app: Option<&str>) -> Result<CredentialSection, ConfigError> {
        let entries = match app.filter(|app| !app.is_empty()) {
            Some(app) => self
                .sections
                .iter()
                .find(|(n, _)| n == app)
                .map(|(_, e)| e)
                .ok_or_else(|| ConfigError::SectionNotFound(app.to_string()))?,
            None => match self.sections.as_slice() {
                [] => return Err(ConfigError::NoSections),
                [(_, entries)] => entries,
                _ => {
                    return Err(ConfigError::AmbiguousSection {
                        sections: self.section_names().map(str::to_string).collect(),
                    });
                }
            },
        };

        CredentialSection::from_entries(entries)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("sections", &self.section_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Read a credentials file and resolve one section from it.
///
/// The file is read in full and closed before parsing.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, or any error from
/// [`CredentialStore::from_ini`] and [`CredentialStore::resolve`].
pub fn read_credentials(
    path: impl AsRef<Path>,
    app: Option<&str>,
) -> Result<CredentialSection, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), app = app, "reading credentials file");

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    CredentialStore::from_ini(&text)?.resolve(app)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn full(tenant: &str) -> [(&'static str, String); 3] {
        [
            ("tenant_id", tenant.to_string()),
            ("client_id", "client".to_string()),
            ("client_secret", "secret".to_string()),
        ]
    }

    #[test]
    fn test_single_section_without_app() {
        let store = CredentialStore::new().with_section("only", full("t1"));
        let creds = store.resolve(None).unwrap();
        assert_eq!(creds.tenant_id(), "t1");
        assert_eq!(creds.client_id(), "client");
        assert_eq!(creds.client_secret(), "secret");
    }

    #[test]
    fn test_named_section() {
        let store = CredentialStore::new()
            .with_section("a", full("ta"))
            .with_section("b", full("tb"));
        assert_eq!(store.resolve(Some("b")).unwrap().tenant_id(), "tb");
    }

    #[test]
    fn test_missing_named_section() {
        let store = CredentialStore::new().with_section("a", full("ta"));
        let err = store.resolve(Some("nope")).unwrap_err();
        assert!(matches!(err, ConfigError::SectionNotFound(ref s) if s == "nope"));
        assert_eq!(
            err.to_string(),
            "couldn't find 'nope' app credentials section"
        );
    }

    #[test]
    fn test_empty_app_means_unset() {
        let store = CredentialStore::new().with_section("only", full("t1"));
        assert_eq!(store.resolve(Some("")).unwrap().tenant_id(), "t1");

        let store = store.with_section("other", full("t2"));
        assert!(matches!(
            store.resolve(Some("")),
            Err(ConfigError::AmbiguousSection { .. })
        ));
    }

    #[test]
    fn test_indented_file_resolves() {
        let store = CredentialStore::from_ini(
            "[app]\n  tenant_id = t\n  client_id = c\n  client_secret = s\n",
        )
        .unwrap();
        let creds = store.resolve(None).unwrap();
        assert_eq!(creds.tenant_id(), "t");
        assert_eq!(creds.client_id(), "c");
        assert_eq!(creds.client_secret(), "s");
    }

    #[test]
    fn test_ambiguous_without_app() {
        let store = CredentialStore::new()
            .with_section("a", full("ta"))
            .with_section("b", full("tb"));
        match store.resolve(None).unwrap_err() {
            ConfigError::AmbiguousSection { sections } => assert_eq!(sections, ["a", "b"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_store() {
        let err = CredentialStore::new().resolve(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoSections));
    }

    #[test]
    fn test_missing_keys_sorted() {
        let store =
            CredentialStore::new().with_section("a", [("tenant_id", "t")]);
        match store.resolve(None).unwrap_err() {
            ConfigError::MissingKeys(keys) => assert_eq!(keys, ["client_id", "client_secret"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_key_reported_before_missing() {
        // `foo` is unknown and two keys are missing; the unknown check wins.
        let store = CredentialStore::new().with_section("a", [("tenant_id", "t"), ("foo", "x")]);
        match store.resolve(None).unwrap_err() {
            ConfigError::UnknownKeys(keys) => assert_eq!(keys, ["foo"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_keys_sorted() {
        let mut entries: BTreeMap<String, String> = full("t")
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        entries.insert("zeta".into(), "1".into());
        entries.insert("alpha".into(), "2".into());
        match CredentialSection::from_entries(&entries).unwrap_err() {
            ConfigError::UnknownKeys(keys) => assert_eq!(keys, ["alpha", "zeta"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_ini() {
        let store = CredentialStore::from_ini(
            "[app]\ntenant_id = t\nclient_id = c\nclient_secret = s\n",
        )
        .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(Some("app")).unwrap().client_id(), "c");
    }

    #[test]
    fn test_insert_replaces_section() {
        let mut store = CredentialStore::new().with_section("a", full("old"));
        store.insert(
            "a",
            full("new")
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(None).unwrap().tenant_id(), "new");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_credentials("/nonexistent/azsql/credentials.ini", None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = CredentialSection::new("t", "c", "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));

        let store = CredentialStore::new().with_section("a", [("client_secret", "hunter2")]);
        assert!(!format!("{store:?}").contains("hunter2"));
    }
}
