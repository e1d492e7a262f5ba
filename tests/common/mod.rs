//! Common test utilities

#![allow(dead_code)]

use misconfig_mapper::models::{ProbeOutcome, ScanConfig};
use misconfig_mapper::report::Reporter;
use misconfig_mapper::templates::ServiceTemplate;
use serde_json::json;
use std::sync::Mutex;

/// Reporter that keeps every outcome in delivery order
#[derive(Default)]
pub struct CollectingReporter {
    outcomes: Mutex<Vec<ProbeOutcome>>,
}

impl CollectingReporter {
    pub fn outcomes(&self) -> Vec<ProbeOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn hits(&self) -> Vec<ProbeOutcome> {
        self.outcomes().into_iter().filter(|o| o.is_hit()).collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, outcome: &ProbeOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

/// Creates a test ScanConfig with short timeouts and no rate limit
pub fn test_config() -> ScanConfig {
    ScanConfig {
        target: "acme".to_string(),
        services: "*".to_string(),
        permutations: false,
        timeout_ms: 2000,
        user_agent: "Mapper-Test/0.1.0".to_string(),
        ..ScanConfig::default()
    }
}

/// Host and port of a mock server, without scheme
pub fn authority(uri: &str) -> String {
    uri.trim_start_matches("http://").to_string()
}

/// Builds a service template from the catalog's JSON shape
pub fn service(
    id: i64,
    base_url: &str,
    paths: &[&str],
    status: serde_json::Value,
    detection: &[&str],
    vulnerability: &[&str],
) -> ServiceTemplate {
    serde_json::from_value(json!({
        "id": id,
        "request": {
            "method": "GET",
            "baseURL": base_url,
            "path": paths,
            "headers": [],
            "body": null
        },
        "response": {
            "statusCode": status,
            "detectionFingerprints": detection,
            "fingerprints": vulnerability
        },
        "metadata": {
            "service": format!("svc{id}"),
            "serviceName": format!("Service {id}"),
            "description": "test service",
            "reproductionSteps": ["Open the URL"],
            "references": []
        }
    }))
    .expect("valid service template")
}
