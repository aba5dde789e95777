//! Placeholder name to value mappings.

use std::collections::BTreeMap;

use crate::error::MappingError;

/// Maximum placeholder name length, in characters.
pub const MAX_KEY_LEN: usize = 200;

/// Case-insensitive map from placeholder name to replacement value.
///
/// Keys are trimmed and must be non-empty and unique ignoring case. Values
/// are sanitized on insertion (see [`sanitize_value`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    entries: BTreeMap<String, (String, String)>,
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(key, value)` pairs, failing on the first bad key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.insert(key.as_ref(), value.as_ref())?;
        }
        Ok(map)
    }

    pub fn insert(&mut self, key: &str, value: &str) -> Result<(), MappingError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(MappingError::EmptyKey);
        }
        if key.chars().count() > MAX_KEY_LEN {
            return Err(MappingError::KeyTooLong {
                key: key.to_owned(),
                max: MAX_KEY_LEN,
            });
        }
        let folded = key.to_lowercase();
        if self.entries.contains_key(&folded) {
            return Err(MappingError::DuplicateKey(key.to_owned()));
        }
        self.entries
            .insert(folded, (key.to_owned(), sanitize_value(value)));
        Ok(())
    }

    /// Value for placeholder `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.trim().to_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Keys as supplied, ordered case-insensitively.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(key, _)| key.as_str())
    }

    /// Case-folded form used for lookups.
    pub(crate) fn fold(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Original keys whose folded form is not in `used`.
    pub(crate) fn unused<'a>(
        &'a self,
        used: &'a std::collections::BTreeSet<String>,
    ) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(|(folded, _)| !used.contains(*folded))
            .map(|(_, (key, _))| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clean a replacement value for insertion into document text.
///
/// Tab becomes a space. Other control characters are dropped, except line
/// feed and carriage return which are kept as-is.
pub fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            '\n' | '\r' => Some(c),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let map = ReplacementMap::from_pairs([("Client_Name", "Acme")]).unwrap();
        assert_eq!(map.get("client_name"), Some("Acme"));
        assert_eq!(map.get(" CLIENT_NAME "), Some("Acme"));
        assert_eq!(map.get("other"), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = ReplacementMap::from_pairs([("name", "a"), ("NAME", "b")]);
        assert_eq!(result, Err(MappingError::DuplicateKey("NAME".to_owned())));
    }

    #[test]
    fn test_key_validation() {
        let mut map = ReplacementMap::new();
        assert_eq!(map.insert("   ", "x"), Err(MappingError::EmptyKey));

        let long = "k".repeat(MAX_KEY_LEN + 1);
        assert!(matches!(
            map.insert(&long, "x"),
            Err(MappingError::KeyTooLong { max: MAX_KEY_LEN, .. })
        ));
        assert!(map.insert(&"k".repeat(MAX_KEY_LEN), "x").is_ok());
    }

    #[test]
    fn test_sanitize_value() {
        assert_eq!(sanitize_value("a\tb\u{0}c\u{1f}d\u{7f}"), "a bcd");
        assert_eq!(sanitize_value("line1\nline2\r\n"), "line1\nline2\r\n");
        assert_eq!(sanitize_value("Zoë"), "Zoë");
    }

    #[test]
    fn test_values_sanitized_on_insert() {
        let map = ReplacementMap::from_pairs([("x", "a\tb")]).unwrap();
        assert_eq!(map.get("x"), Some("a b"));
    }

    #[test]
    fn test_unused_keys() {
        let map = ReplacementMap::from_pairs([("Alpha", "1"), ("beta", "2")]).unwrap();
        let used: BTreeSet<String> = [ReplacementMap::fold("BETA")].into();
        let unused: Vec<&str> = map.unused(&used).collect();
        assert_eq!(unused, vec!["Alpha"]);
    }
}
