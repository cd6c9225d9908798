//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod allocation;
pub mod billing;
pub mod hierarchy;
pub mod invoice;
pub mod rate;
pub mod resource;

pub use allocation::{AllocationError, AllocationRepository, GroupCount, SummaryFilter};
pub use billing::{BillingError, BillingRepository, BillingWriteCounts, UpsertBillingInput};
pub use hierarchy::{
    FailedRecord, HierarchyError, HierarchyLevel, HierarchyRepository, ImportCounts, ImportOutcome,
    RenameCascade,
};
pub use invoice::{InvoiceError, InvoiceRepository};
pub use rate::{RateError, RateRepository};
pub use resource::{ResourceError, ResourceRepository};
