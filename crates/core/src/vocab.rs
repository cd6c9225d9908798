//! Closed vocabularies for imported categorical fields.
//!
//! Source spreadsheets carry free-text category columns. Each vocabulary is
//! validated once at the ingest boundary and carried as a tagged variant from
//! then on; internal logic never re-parses free text.

use serde::{Deserialize, Serialize};

/// Category of a billable work item, priced per subproject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// A brand new work request.
    #[serde(rename = "New Request")]
    NewRequest,
    /// A key entry item.
    #[serde(rename = "Key")]
    Key,
    /// A duplicate of an existing request.
    #[serde(rename = "Duplicate")]
    Duplicate,
    /// A returned item requiring rework.
    #[serde(rename = "Rework")]
    Rework,
    /// A clarification round-trip with the client.
    #[serde(rename = "Clarification")]
    Clarification,
}

impl RequestType {
    /// All members, in canonical order.
    pub const ALL: [Self; 5] = [
        Self::NewRequest,
        Self::Key,
        Self::Duplicate,
        Self::Rework,
        Self::Clarification,
    ];

    /// Canonical display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewRequest => "New Request",
            Self::Key => "Key",
            Self::Duplicate => "Duplicate",
            Self::Rework => "Rework",
            Self::Clarification => "Clarification",
        }
    }

    /// Parses a source value, case-insensitively, normalizing to canonical casing.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let key = crate::hierarchy::normalize_key(value);
        Self::ALL
            .into_iter()
            .find(|rt| crate::hierarchy::normalize_key(rt.label()) == key)
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of work under a client; projects are named after these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessType {
    /// Document intake and triage.
    #[serde(rename = "Intake")]
    Intake,
    /// Data indexing and keying.
    #[serde(rename = "Indexing")]
    Indexing,
    /// Quality control review.
    #[serde(rename = "Quality Control")]
    QualityControl,
    /// Final delivery to the client.
    #[serde(rename = "Delivery")]
    Delivery,
}

impl ProcessType {
    /// All members, in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Intake,
        Self::Indexing,
        Self::QualityControl,
        Self::Delivery,
    ];

    /// Canonical display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::Indexing => "Indexing",
            Self::QualityControl => "Quality Control",
            Self::Delivery => "Delivery",
        }
    }

    /// Parses a source value, case-insensitively, normalizing to canonical casing.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let key = crate::hierarchy::normalize_key(value);
        Self::ALL
            .into_iter()
            .find(|pt| crate::hierarchy::normalize_key(pt.label()) == key)
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Alternate pricing axis, independent of request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductivityLevel {
    /// Entry productivity tier.
    Low,
    /// Standard productivity tier.
    Medium,
    /// Advanced productivity tier.
    High,
    /// Top productivity tier.
    Best,
}

impl ProductivityLevel {
    /// All members, in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Best];

    /// Canonical display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Best => "best",
        }
    }

    /// Parses a source value, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let key = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|lvl| lvl.label() == key)
    }
}

impl std::fmt::Display for ProductivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_parse_case_insensitive() {
        assert_eq!(RequestType::parse("new request"), Some(RequestType::NewRequest));
        assert_eq!(RequestType::parse("NEW_REQUEST"), Some(RequestType::NewRequest));
        assert_eq!(RequestType::parse(" Key "), Some(RequestType::Key));
        assert_eq!(RequestType::parse("duplicate"), Some(RequestType::Duplicate));
        assert_eq!(RequestType::parse("unknown"), None);
    }

    #[test]
    fn test_request_type_canonical_label() {
        let rt = RequestType::parse("new   request").unwrap();
        assert_eq!(rt.label(), "New Request");
    }

    #[test]
    fn test_process_type_parse() {
        assert_eq!(ProcessType::parse("quality-control"), Some(ProcessType::QualityControl));
        assert_eq!(ProcessType::parse("Intake"), Some(ProcessType::Intake));
        assert_eq!(ProcessType::parse("shipping"), None);
    }

    #[test]
    fn test_productivity_level_parse() {
        assert_eq!(ProductivityLevel::parse("BEST"), Some(ProductivityLevel::Best));
        assert_eq!(ProductivityLevel::parse(" medium "), Some(ProductivityLevel::Medium));
        assert_eq!(ProductivityLevel::parse("ultra"), None);
    }
}
