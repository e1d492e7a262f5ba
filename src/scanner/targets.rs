//! Candidate generation from organization seeds

use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Suffixes appended to every seed, in emission order
pub const SUFFIXES: &[&str] = &[
    "com", "net", "org", "io", "fr", "ltd", "app", "prod", "internal", "dev", "development",
    "devops", "logs", "logging", "admin", "log", "stage", "staging", "stg", "production",
    "dev-only", "cicd", "employee-only", "testing", "secret", "kibana", "employees", "partners",
    "sso", "saml", "tickets", "issues", "oauth2",
];

/// Connectors placed between seed and suffix, in emission order
pub const CONNECTORS: &[&str] = &[".", "-", ""];

/// Resolves the target argument into seeds.
///
/// A path with an extension that exists on disk is read as a newline-delimited
/// list (trimmed, blank lines dropped); anything else is a single seed.
pub fn resolve_seeds(target: &str) -> Result<Vec<String>> {
    let path = Path::new(target);
    if path.extension().is_none() || !path.exists() {
        return Ok(vec![target.to_string()]);
    }

    let content = std::fs::read_to_string(path)?;
    let seeds: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    debug!("Read {} seeds from {}", seeds.len(), path.display());
    Ok(seeds)
}

/// Expands seeds into the ordered candidate list.
///
/// Without permutations the seeds are returned untouched. With them, each seed
/// yields itself verbatim followed by `normalized + connector + suffix` for every
/// suffix (outer) and connector (inner). Duplicates are kept.
pub fn generate<S: AsRef<str>>(seeds: &[S], permutations: bool) -> Vec<String> {
    if !permutations {
        return seeds.iter().map(|s| s.as_ref().to_string()).collect();
    }

    let mut candidates = Vec::with_capacity(seeds.len() * (1 + SUFFIXES.len() * CONNECTORS.len()));
    for seed in seeds {
        candidates.extend(permutations_of(seed.as_ref()));
    }
    candidates
}

fn permutations_of(seed: &str) -> impl Iterator<Item = String> + '_ {
    let normalized = seed.trim().to_lowercase();
    let expanded = SUFFIXES.iter().flat_map(move |suffix| {
        let normalized = normalized.clone();
        CONNECTORS
            .iter()
            .map(move |connector| format!("{normalized}{connector}{suffix}"))
    });
    std::iter::once(seed.to_string()).chain(expanded)
}
