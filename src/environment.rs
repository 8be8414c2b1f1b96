use crate::error::LoadError;
use std::collections::HashMap;
use std::env;

/// Key/value pairs that configuration fields are mapped from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvMap {
    entries: HashMap<String, String>,
    fold_case: bool,
}

impl EnvMap {
    /// Create an empty map with case-sensitive keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map whose lookups ignore ASCII case, as config file keys do
    pub fn case_insensitive() -> Self {
        Self {
            entries: HashMap::new(),
            fold_case: true,
        }
    }

    /// Build a map from `KEY=VALUE` entries, splitting each at its first `=`
    ///
    /// The value keeps any further `=` characters. An entry without any `=` is rejected.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) => map.insert(key, value),
                None => {
                    return Err(LoadError::MalformedEntry {
                        entry: entry.to_string(),
                    });
                }
            }
        }
        Ok(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let key = if self.fold_case {
            key.to_ascii_lowercase()
        } else {
            key
        };
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if self.fold_case {
            self.entries
                .get(&key.to_ascii_lowercase())
                .map(String::as_str)
        } else {
            self.entries.get(key).map(String::as_str)
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.fold_case
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Snapshot the live process environment
///
/// Variables whose name or value is not valid UTF-8 cannot match any field key and
/// are skipped. The OS snapshot already arrives split into pairs, and entries without
/// a `=` never reach this map, so [`EnvMap::from_entries`] is the only place a
/// `MalformedEntry` error can come from.
pub fn environ() -> EnvMap {
    let mut map = EnvMap::new();
    for (key, value) in env::vars_os() {
        match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => map.insert(key, value),
            (Ok(key), Err(_)) => {
                tracing::warn!(key = %key, "skipping environment variable with non UTF-8 value");
            }
            (Err(key), _) => {
                tracing::warn!(key = ?key, "skipping environment variable with non UTF-8 name");
            }
        }
    }
    tracing::debug!(count = map.len(), "read process environment");
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_from_entries_splits_at_first_equals() {
        let map = EnvMap::from_entries(["PORT=8080", "DSN=postgres://u:p@h/db?sslmode=require"])
            .unwrap();

        assert_eq!(map.get("PORT"), Some("8080"));
        assert_eq!(map.get("DSN"), Some("postgres://u:p@h/db?sslmode=require"));
    }

    #[test]
    fn test_from_entries_keeps_extra_equals_in_value() {
        let map = EnvMap::from_entries(["TOKEN=abc==", "EMPTY="]).unwrap();

        assert_eq!(map.get("TOKEN"), Some("abc=="));
        assert_eq!(map.get("EMPTY"), Some(""));
    }

    #[test]
    fn test_from_entries_rejects_entry_without_separator() {
        let result = EnvMap::from_entries(["PORT=8080", "BROKEN"]);

        match result {
            Err(LoadError::MalformedEntry { entry }) => assert_eq!(entry, "BROKEN"),
            other => panic!("Expected MalformedEntry error, got {:?}", other),
        }
    }

    #[test]
    fn test_case_sensitive_by_default() {
        let map: EnvMap = [("PORT", "8080")].into_iter().collect();

        assert_eq!(map.get("PORT"), Some("8080"));
        assert_eq!(map.get("port"), None);
        assert!(!map.is_case_insensitive());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut map = EnvMap::case_insensitive();
        map.insert("port", "8080");

        assert_eq!(map.get("PORT"), Some("8080"));
        assert_eq!(map.get("Port"), Some("8080"));
    }

    #[test]
    fn test_later_entries_win() {
        let mut map = EnvMap::new();
        map.extend([("HOST", "a"), ("HOST", "b")]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("HOST"), Some("b"));
    }

    #[test]
    #[serial]
    fn test_environ_reads_process_environment() {
        env::set_var("ENV_LOADR_ENVIRON_CHECK", "present=yes");

        let map = environ();
        assert_eq!(map.get("ENV_LOADR_ENVIRON_CHECK"), Some("present=yes"));

        env::remove_var("ENV_LOADR_ENVIRON_CHECK");
    }
}
