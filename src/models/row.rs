//! Raw input rows.
//!
//! The import layer hands the core one [`Row`] per task or shift: a map
//! of named text fields. Rows deserialize transparently from JSON objects
//! or CSV records with headers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One input record with named text fields.
///
/// Field names are matched case-insensitively and with surrounding
/// whitespace removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<String, String>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the row.
    pub fn with(mut self, field: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field.
    pub fn insert(&mut self, field: impl AsRef<str>, value: impl Into<String>) {
        self.fields.insert(normalize(field.as_ref()), value.into());
    }

    /// Looks up a field. Blank values count as missing.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(&normalize(field))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Looks up the first present field among `aliases`.
    ///
    /// Returns the matched alias with its value.
    pub fn get_any<'a>(&'a self, aliases: &[&'a str]) -> Option<(&'a str, &'a str)> {
        aliases
            .iter()
            .find_map(|&alias| self.get(alias).map(|value| (alias, value)))
    }

    /// Whether the row carries `field` (even if blank).
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(&normalize(field))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

fn normalize(field: &str) -> String {
    field.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = Row::new().with("Name", "Rounds").with(" start ", "09:00").with("end", "  ");
        assert_eq!(row.get("name"), Some("Rounds"));
        assert_eq!(row.get("START"), Some("09:00"));
        assert_eq!(row.get("end"), None);
        assert!(row.has("end"));
        assert!(!row.has("duration"));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_row_aliases() {
        let row = Row::new().with("task", "Meds");
        assert_eq!(row.get_any(&["name", "task"]), Some(("task", "Meds")));
        assert_eq!(row.get_any(&["duration", "duration_min"]), None);
    }

    #[test]
    fn test_row_from_json() {
        let row: Row = serde_json::from_str(r#"{"name": "Day", "max_nurses": "3"}"#).unwrap();
        assert_eq!(row.get("max_nurses"), Some("3"));

        let collected: Row = vec![("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(collected.get("b"), Some("2"));
    }
}
