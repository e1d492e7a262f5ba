//! Service template catalog
//!
//! Loads the JSON catalog of third-party service fingerprints, selects the
//! services to scan, compiles their patterns and keeps the local copy fresh.

pub mod loader;
pub mod matcher;
pub mod update;

pub use loader::{load_catalog, select_services, ServiceTemplate, StatusCodeSpec};
pub use matcher::{Classification, CompiledMatchers};
