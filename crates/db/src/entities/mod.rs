//! `SeaORM` entity definitions.

pub mod active_generations;
pub mod allocation_summaries;
pub mod billings;
pub mod clients;
pub mod geographies;
pub mod invoices;
pub mod productivity_tiers;
pub mod projects;
pub mod request_type_rates;
pub mod resource_assignments;
pub mod resources;
pub mod subprojects;
