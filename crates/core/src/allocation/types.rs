//! Allocation data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocab::RequestType;

/// One logged unit of work: a resolved allocation row from an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEvent {
    /// Geography ID.
    pub geography_id: Uuid,
    /// Client ID.
    pub client_id: Uuid,
    /// Project ID.
    pub project_id: Uuid,
    /// Subproject ID.
    pub subproject_id: Uuid,
    /// Geography name at resolution time.
    pub geography_name: String,
    /// Client name at resolution time.
    pub client_name: String,
    /// Project name at resolution time.
    pub project_name: String,
    /// Subproject name at resolution time.
    pub subproject_name: String,
    /// Request category of the work item.
    pub request_type: RequestType,
    /// Calendar date the work was logged against.
    pub date: NaiveDate,
    /// Resource who logged the work.
    pub resource_name: String,
}

/// One summary group: unique (subproject, request type, date) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationGroup {
    /// Geography ID.
    pub geography_id: Uuid,
    /// Client ID.
    pub client_id: Uuid,
    /// Project ID.
    pub project_id: Uuid,
    /// Subproject ID.
    pub subproject_id: Uuid,
    /// Geography name (first row seen wins).
    pub geography_name: String,
    /// Client name (first row seen wins).
    pub client_name: String,
    /// Project name (first row seen wins).
    pub project_name: String,
    /// Subproject name (first row seen wins).
    pub subproject_name: String,
    /// Request category.
    pub request_type: RequestType,
    /// Calendar date.
    pub date: NaiveDate,
    /// Number of raw allocation rows in this group.
    pub count: u64,
    /// Deduplicated resource names, in first-seen order.
    pub resource_names: Vec<String>,
    /// Rate resolved for (subproject, request type).
    pub rate: Decimal,
    /// `count x rate`.
    pub total_billing: Decimal,
}

/// Roll-up of counts and billing across a set of groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTotals {
    /// Sum of group counts.
    pub count: u64,
    /// Sum of group billing figures.
    pub billing: Decimal,
}
