//! JSON service catalog loader

use crate::error::{MapperError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the catalog inside the templates directory
pub const CATALOG_FILE: &str = "services.json";

/// A third-party service fingerprint: how to request it and how to recognize it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTemplate {
    pub id: i64,
    pub request: ServiceRequest,
    pub response: ServiceResponse,
    pub metadata: ServiceMetadata,
}

/// Request half of a service template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub method: String,
    /// May contain a `{TARGET}` placeholder
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(rename = "path")]
    pub paths: Vec<String>,
    /// Ordered single-key maps, applied in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Response half of a service template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    #[serde(rename = "statusCode")]
    pub expected_status: StatusCodeSpec,
    #[serde(rename = "detectionFingerprints", default, deserialize_with = "null_as_default")]
    pub detection_patterns: Vec<String>,
    #[serde(rename = "fingerprints", default, deserialize_with = "null_as_default")]
    pub vulnerability_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_patterns: Option<Vec<String>>,
}

/// Descriptive data shown alongside a hit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    /// Short slug used for lookup
    #[serde(rename = "service")]
    pub slug: String,
    #[serde(rename = "serviceName")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reproduction_steps: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<String>,
}

/// Expected status code: catalogs use either a bare number or a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCodeSpec {
    Single(u16),
    Multiple(Vec<u16>),
}

impl StatusCodeSpec {
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusCodeSpec::Single(code) => *code == status,
            StatusCodeSpec::Multiple(codes) => codes.contains(&status),
        }
    }
}

impl ServiceTemplate {
    /// Template headers flattened to (name, value) pairs in declaration order.
    /// Non-string values are rendered as JSON.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.request
            .headers
            .iter()
            .flat_map(|entry| entry.iter())
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect()
    }

    /// Request body as raw text. JSON strings are sent verbatim, other payloads serialized.
    pub fn body_text(&self) -> Option<String> {
        match self.request.body.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Validates a template for correctness
pub fn validate_template(template: &ServiceTemplate) -> std::result::Result<(), String> {
    if template.request.paths.is_empty() {
        return Err("Template has no request paths".to_string());
    }
    if template.response.detection_patterns.is_empty()
        && template.response.vulnerability_patterns.is_empty()
    {
        return Err("Template has neither detection nor vulnerability fingerprints".to_string());
    }
    if reqwest::Method::from_bytes(template.request.method.to_uppercase().as_bytes()).is_err() {
        return Err(format!("Invalid method: {}", template.request.method));
    }
    Ok(())
}

/// Returns the catalog file path for a templates directory
pub fn catalog_path(templates_dir: &Path) -> PathBuf {
    templates_dir.join(CATALOG_FILE)
}

/// Loads the service catalog from a JSON file.
/// Entries that fail validation are skipped; a missing or malformed file is an error.
pub fn load_catalog(path: &Path) -> Result<Vec<ServiceTemplate>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MapperError::Catalog(format!("failed opening file '{}': {e}", path.display()))
    })?;
    let services: Vec<ServiceTemplate> = serde_json::from_str(&content)
        .map_err(|e| MapperError::Catalog(format!("failed decoding '{}': {e}", path.display())))?;

    let total = services.len();
    let services: Vec<ServiceTemplate> = services
        .into_iter()
        .filter(|service| match validate_template(service) {
            Ok(()) => true,
            Err(msg) => {
                warn!(
                    "Skipping service {} ({}): {}",
                    service.id, service.metadata.display_name, msg
                );
                false
            }
        })
        .collect();

    info!("Loaded {} of {} services from {}", services.len(), total, path.display());
    Ok(services)
}

/// Selects services by `*`, or a comma-separated list of numeric ids and/or slugs.
/// Results keep catalog order and contain each service once; an empty result means no match.
pub fn select_services(selector: &str, services: &[ServiceTemplate]) -> Vec<ServiceTemplate> {
    let selector = selector.trim();
    if selector == "*" {
        return services.to_vec();
    }

    let wanted: Vec<&str> = selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let selected: Vec<ServiceTemplate> = services
        .iter()
        .filter(|service| {
            wanted.iter().any(|id| {
                service.id.to_string() == *id || service.metadata.slug.eq_ignore_ascii_case(id)
            })
        })
        .cloned()
        .collect();

    debug!("Selector '{}' matched {} services", selector, selected.len());
    selected
}
