//! Per-upload entity cache and resolver.
//!
//! This module implements the hierarchy side of the import pipeline:
//! - Normalized-name keys for fuzzy but deterministic matching
//! - A request-scoped lookup cache built once per upload
//! - The Geography -> Client -> Project -> Subproject resolver
//! - Client token extraction from combined process strings

pub mod cache;
pub mod normalize;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::HierarchyCache;
pub use normalize::normalize_key;
pub use resolver::{
    ClientSource, HierarchyResolver, ResolutionMiss, ResolvedChain, extract_client_token,
};
pub use types::{
    ClientRecord, GeographyRecord, HierarchySnapshot, ProjectRecord, SubprojectRecord,
};
