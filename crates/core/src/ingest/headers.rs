//! Header mapping from source columns to canonical field names.

use crate::hierarchy::normalize_key;

/// Canonical field names used by the rest of the pipeline.
pub mod field {
    /// Geography / region column.
    pub const GEOGRAPHY: &str = "geography";
    /// Client name column.
    pub const CLIENT: &str = "client";
    /// Project (process type) column; on allocation feeds this is the
    /// combined process string carrying the embedded client token.
    pub const PROJECT: &str = "project";
    /// Subproject (location) column.
    pub const SUBPROJECT: &str = "subproject";
    /// Request type column.
    pub const REQUEST_TYPE: &str = "request_type";
    /// Per-unit rate column.
    pub const RATE: &str = "rate";
    /// Flat rate column.
    pub const FLATRATE: &str = "flatrate";
    /// Productivity level column.
    pub const PRODUCTIVITY_LEVEL: &str = "productivity_level";
    /// Productivity tier base rate column.
    pub const BASE_RATE: &str = "base_rate";
    /// Allocation date column.
    pub const ALLOCATION_DATE: &str = "allocation_date";
    /// Resource display name column.
    pub const RESOURCE_NAME: &str = "resource_name";
    /// Resource email column.
    pub const RESOURCE_EMAIL: &str = "resource_email";
}

/// Substring rules, first match wins. Order matters: `"flat rate"` must be
/// checked before the bare `"rate"`, `"email"` before `"resource"`, and
/// `"date"` before `"location"` (the word "allocation" contains "location").
const RULES: &[(&str, &str)] = &[
    ("flat rate", field::FLATRATE),
    ("flatrate", field::FLATRATE),
    ("base rate", field::BASE_RATE),
    ("request type", field::REQUEST_TYPE),
    ("geography", field::GEOGRAPHY),
    ("region", field::GEOGRAPHY),
    ("date", field::ALLOCATION_DATE),
    ("location", field::SUBPROJECT),
    ("client", field::CLIENT),
    ("process", field::PROJECT),
    ("project", field::PROJECT),
    ("email", field::RESOURCE_EMAIL),
    ("resource", field::RESOURCE_NAME),
    ("productivity", field::PRODUCTIVITY_LEVEL),
    ("level", field::PRODUCTIVITY_LEVEL),
    ("rate", field::RATE),
];

/// Maps a source column header to a canonical field name.
///
/// Matching is case-insensitive substring matching on the normalized header,
/// so `"Request_Type"`, `"request type"`, and `"Client Request Type"` all map
/// to [`field::REQUEST_TYPE`]. Returns `None` for unrecognized headers, which
/// are passed through unchanged and ignored downstream.
#[must_use]
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let key = normalize_key(header);
    RULES
        .iter()
        .find(|(needle, _)| key.contains(needle))
        .map(|&(_, canonical)| canonical)
}
