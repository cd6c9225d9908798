//! Canonical row representation.

use std::collections::HashMap;

/// One parsed data row: canonical field name to trimmed value.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-indexed data row number in the source file (header excluded).
    pub number: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    /// Creates a row from already-trimmed field values.
    #[must_use]
    pub fn new(number: usize, fields: HashMap<String, String>) -> Self {
        Self { number, fields }
    }

    /// Returns the non-empty value of a field, or `None` when absent/blank.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Returns the value of a field, empty string when absent.
    ///
    /// Used by the error report writer, which reproduces blanks as blanks.
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.fields.get(field).map_or("", String::as_str)
    }

    /// True when every field of the row is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(String::is_empty)
    }
}
