//! INI front end for credential and driver files.
//!
//! The accepted syntax is the common INI dialect shared by unixODBC and
//! most credential files:
//!
//! ```ini
//! # comment
//! [DEFAULT]
//! tenant_id = 00000000-0000-0000-0000-000000000000
//!
//! [reporting]
//! client_id: 11111111-1111-1111-1111-111111111111
//! client_secret = s3cr3t
//! ```
//!
//! - keys are trimmed and lower-cased, values are trimmed
//! - `=` and `:` both delimit a key from its value (first one wins)
//! - lines starting with `#` or `;` are comments
//! - lines indented deeper than their key continue its value, joined with `\n`;
//!   blank lines inside the value are kept
//! - `[DEFAULT]` is not a section; its keys are inherited by every section

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Name of the pseudo-section whose keys every section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// A named group of key/value pairs.
#[derive(Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    entries: BTreeMap<String, String>,
}

impl IniSection {
    /// Section name as written between the brackets.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a value by (lower-case) key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Borrow all entries.
    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Split into name and entries.
    #[must_use]
    pub fn into_parts(self) -> (String, BTreeMap<String, String>) {
        (self.name, self.entries)
    }
}

impl fmt::Debug for IniSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets; only keys are shown.
        f.debug_struct("IniSection")
            .field("name", &self.name)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A parsed INI document, sections in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ini {
    sections: Vec<IniSection>,
}

impl Ini {
    /// Parse a document, rejecting duplicate sections and duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] with the offending line number.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        Parser::new(true).run(input)
    }

    /// Parse a document, letting later duplicates override earlier ones.
    ///
    /// System files such as `odbcinst.ini` are frequently edited by
    /// installers and are read this way.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for lines that are not valid INI.
    pub fn parse_relaxed(input: &str) -> Result<Self, ConfigError> {
        Parser::new(false).run(input)
    }

    /// Sections in file order.
    #[must_use]
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// Find a section by exact name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Section names in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    /// Consume the document.
    #[must_use]
    pub fn into_sections(self) -> Vec<IniSection> {
        self.sections
    }
}

#[derive(Clone, Copy)]
enum Target {
    None,
    Defaults,
    Section(usize),
}

struct Parser {
    strict: bool,
    defaults: BTreeMap<String, String>,
    sections: Vec<IniSection>,
    target: Target,
    last_key: Option<String>,
    /// Indentation of the last line that started a key or section.
    indent_level: usize,
    /// Blank lines seen since the last value line.
    blank_lines: usize,
}

impl Parser {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            defaults: BTreeMap::new(),
            sections: Vec::new(),
            target: Target::None,
            last_key: None,
            indent_level: 0,
            blank_lines: 0,
        }
    }

    fn run(mut self, input: &str) -> Result<Ini, ConfigError> {
        for (idx, raw) in input.lines().enumerate() {
            self.line(idx + 1, raw)?;
        }

        let Self {
            defaults,
            mut sections,
            ..
        } = self;
        for section in &mut sections {
            for (key, value) in &defaults {
                section
                    .entries
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        Ok(Ini { sections })
    }

    fn line(&mut self, line: usize, raw: &str) -> Result<(), ConfigError> {
        let trimmed = raw.trim();
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            return Ok(());
        }
        if trimmed.is_empty() {
            if self.last_key.is_some() {
                self.blank_lines += 1;
            }
            return Ok(());
        }

        // A line indented deeper than the key that opened the value continues it.
        let indent = raw.len() - raw.trim_start().len();
        if indent > self.indent_level {
            if let Some(key) = self.last_key.clone() {
                let separator = "\n".repeat(self.blank_lines + 1);
                if let Some(value) = self.entries_mut().and_then(|e| e.get_mut(&key)) {
                    value.push_str(&separator);
                    value.push_str(trimmed);
                }
                self.blank_lines = 0;
                return Ok(());
            }
        }
        self.indent_level = indent;
        self.blank_lines = 0;

        if let Some(header) = trimmed.strip_prefix('[') {
            return self.header(line, header);
        }

        let pos = trimmed
            .find(['=', ':'])
            .ok_or_else(|| ConfigError::parse(line, "expected 'key = value'"))?;
        let key = trimmed[..pos].trim().to_lowercase();
        let value = trimmed[pos + 1..].trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::parse(line, "empty key"));
        }

        let strict = self.strict;
        let entries = self
            .entries_mut()
            .ok_or_else(|| ConfigError::parse(line, "key outside of any section"))?;
        if strict && entries.contains_key(&key) {
            return Err(ConfigError::parse(line, format!("duplicate key '{key}'")));
        }
        entries.insert(key.clone(), value);
        self.last_key = Some(key);
        Ok(())
    }

    fn header(&mut self, line: usize, header: &str) -> Result<(), ConfigError> {
        let name = header
            .strip_suffix(']')
            .ok_or_else(|| ConfigError::parse(line, "unterminated section header"))?;
        if name.is_empty() {
            return Err(ConfigError::parse(line, "empty section name"));
        }

        self.last_key = None;
        self.blank_lines = 0;
        if name == DEFAULT_SECTION {
            self.target = Target::Defaults;
            return Ok(());
        }

        match self.sections.iter().position(|s| s.name == name) {
            Some(_) if self.strict => Err(ConfigError::parse(
                line,
                format!("duplicate section '{name}'"),
            )),
            Some(idx) => {
                self.target = Target::Section(idx);
                Ok(())
            }
            None => {
                self.sections.push(IniSection {
                    name: name.to_string(),
                    entries: BTreeMap::new(),
                });
                self.target = Target::Section(self.sections.len() - 1);
                Ok(())
            }
        }
    }

    fn entries_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        match self.target {
            Target::None => None,
            Target::Defaults => Some(&mut self.defaults),
            Target::Section(idx) => self.sections.get_mut(idx).map(|s| &mut s.entries),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_in_file_order() {
        let ini = Ini::parse("[b]\nx = 1\n\n[a]\ny = 2\n").unwrap();
        let names: Vec<_> = ini.section_names().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(ini.section("a").unwrap().get("y"), Some("2"));
    }

    #[test]
    fn test_keys_lowercased_values_trimmed() {
        let ini = Ini::parse("[app]\n  Tenant_ID   =   abc  \n").unwrap();
        assert_eq!(ini.section("app").unwrap().get("tenant_id"), Some("abc"));
    }

    #[test]
    fn test_colon_delimiter_and_first_delimiter_wins() {
        let ini = Ini::parse("[app]\nclient_id: a=b\nclient_secret = x:y\n").unwrap();
        let app = ini.section("app").unwrap();
        assert_eq!(app.get("client_id"), Some("a=b"));
        assert_eq!(app.get("client_secret"), Some("x:y"));
    }

    #[test]
    fn test_comments_ignored() {
        let ini = Ini::parse("# top\n[app]\n; note\nkey = v\n").unwrap();
        let keys: Vec<_> = ini.section("app").unwrap().keys().collect();
        assert_eq!(keys, ["key"]);
    }

    #[test]
    fn test_continuation_lines() {
        let ini = Ini::parse("[app]\nkey = first\n  second\n\tthird\n").unwrap();
        assert_eq!(
            ini.section("app").unwrap().get("key"),
            Some("first\nsecond\nthird")
        );
    }

    #[test]
    fn test_uniformly_indented_keys() {
        let ini = Ini::parse("[app]\n  tenant_id = t\n  client_id = c\n  client_secret = s\n").unwrap();
        let app = ini.section("app").unwrap();
        assert_eq!(app.get("tenant_id"), Some("t"));
        assert_eq!(app.get("client_id"), Some("c"));
        assert_eq!(app.get("client_secret"), Some("s"));
    }

    #[test]
    fn test_continuation_relative_to_key_indent() {
        let ini = Ini::parse("[app]\n  key = a\n    b\n  other = c\n").unwrap();
        let app = ini.section("app").unwrap();
        assert_eq!(app.get("key"), Some("a\nb"));
        assert_eq!(app.get("other"), Some("c"));
    }

    #[test]
    fn test_blank_lines_kept_inside_value() {
        let ini = Ini::parse("[app]\nkey = a\n\n  b\n\n\nnext = c\n").unwrap();
        let app = ini.section("app").unwrap();
        assert_eq!(app.get("key"), Some("a\n\nb"));
        assert_eq!(app.get("next"), Some("c"));
    }

    #[test]
    fn test_comment_inside_value_skipped() {
        let ini = Ini::parse("[app]\nkey = a\n# note\n  b\n").unwrap();
        assert_eq!(ini.section("app").unwrap().get("key"), Some("a\nb"));
    }

    #[test]
    fn test_default_section_inherited() {
        let ini = Ini::parse("[DEFAULT]\ntenant_id = t\n\n[a]\nclient_id = c\n[b]\ntenant_id = own\n")
            .unwrap();
        assert_eq!(ini.sections().len(), 2);
        assert_eq!(ini.section("a").unwrap().get("tenant_id"), Some("t"));
        assert_eq!(ini.section("b").unwrap().get("tenant_id"), Some("own"));
        assert!(ini.section(DEFAULT_SECTION).is_none());
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let err = Ini::parse("[a]\nx = 1\n[a]\ny = 2\n").unwrap_err();
        match err {
            ConfigError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("duplicate section"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Ini::parse("[a]\nx = 1\nX = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_relaxed_merges_duplicates() {
        let ini = Ini::parse_relaxed("[a]\nx = 1\n[a]\nx = 2\ny = 3\n").unwrap();
        assert_eq!(ini.sections().len(), 1);
        let a = ini.section("a").unwrap();
        assert_eq!(a.get("x"), Some("2"));
        assert_eq!(a.get("y"), Some("3"));
    }

    #[test]
    fn test_key_before_header_rejected() {
        let err = Ini::parse("x = 1\n[a]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_line_without_delimiter_rejected() {
        let err = Ini::parse("[a]\njust text\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_header_rejected() {
        assert!(Ini::parse("[a\n").is_err());
        assert!(Ini::parse("[]\n").is_err());
    }

    #[test]
    fn test_empty_document() {
        let ini = Ini::parse("").unwrap();
        assert!(ini.sections().is_empty());
    }

    #[test]
    fn test_debug_hides_values() {
        let ini = Ini::parse("[a]\nclient_secret = hunter2\n").unwrap();
        let debug = format!("{ini:?}");
        assert!(debug.contains("client_secret"));
        assert!(!debug.contains("hunter2"));
    }
}
