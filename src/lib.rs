//! Misconfig Mapper - SaaS exposure discovery
//!
//! Generates candidate hostnames for an organization, probes them against a
//! catalog of third-party service fingerprints, and reports which instances
//! exist or are misconfigured (open sign-ups, public dashboards, and so on).

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod report;
pub mod scanner;
pub mod templates;
