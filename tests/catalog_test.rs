//! Integration tests for the service catalog: shipped templates, loading and refresh

use misconfig_mapper::error::MapperError;
use misconfig_mapper::models::ScanMode;
use misconfig_mapper::templates::loader::{catalog_path, validate_template};
use misconfig_mapper::templates::update::fetch_catalog;
use misconfig_mapper::templates::{load_catalog, select_services, CompiledMatchers};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn shipped_catalog() -> PathBuf {
    catalog_path(&Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"))
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mapper-{}-{}", name, std::process::id()))
}

const MINIMAL_CATALOG: &str = r#"[
  {
    "id": 12,
    "request": {"method": "GET", "baseURL": "https://{TARGET}.example.com", "path": ["/"], "headers": [], "body": null},
    "response": {"statusCode": 200, "detectionFingerprints": ["Example"], "fingerprints": ["open"]},
    "metadata": {"service": "example", "serviceName": "Example", "description": "", "reproductionSteps": [], "references": []}
  }
]"#;

// ---------------------------------------------------------------------------
// Shipped catalog
// ---------------------------------------------------------------------------

#[test]
fn test_shipped_catalog_loads_and_validates() {
    let services = load_catalog(&shipped_catalog()).expect("shipped catalog loads");
    assert!(!services.is_empty());

    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(shipped_catalog()).unwrap()).unwrap();
    assert_eq!(services.len(), raw.len(), "every shipped template must be valid");

    for service in &services {
        assert!(validate_template(service).is_ok(), "service {}", service.id);
        assert!(
            service.request.base_url.contains("{TARGET}"),
            "service {} has no placeholder",
            service.id
        );
    }
}

#[test]
fn test_shipped_catalog_ids_and_slugs_are_unique() {
    let services = load_catalog(&shipped_catalog()).unwrap();

    let ids: HashSet<i64> = services.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), services.len());

    let slugs: HashSet<String> = services
        .iter()
        .map(|s| s.metadata.slug.to_lowercase())
        .collect();
    assert_eq!(slugs.len(), services.len());
}

#[test]
fn test_shipped_catalog_patterns_compile() {
    for service in load_catalog(&shipped_catalog()).unwrap() {
        for mode in [ScanMode::Detection, ScanMode::Misconfiguration] {
            if let Err(e) = CompiledMatchers::compile(&service, mode) {
                panic!("service {} has invalid patterns: {e}", service.id);
            }
        }
    }
}

#[test]
fn test_default_selector_picks_first_service() {
    let services = load_catalog(&shipped_catalog()).unwrap();
    let selected = select_services("0", &services);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].metadata.slug, "jira");
}

// ---------------------------------------------------------------------------
// Loading failures
// ---------------------------------------------------------------------------

#[test]
fn test_missing_catalog_is_catalog_error() {
    let result = load_catalog(Path::new("/nonexistent/templates/services.json"));
    assert!(matches!(result, Err(MapperError::Catalog(_))));
}

#[test]
fn test_malformed_catalog_is_catalog_error() {
    let dir = scratch_dir("malformed");
    std::fs::create_dir_all(&dir).unwrap();
    let file = catalog_path(&dir);
    std::fs::write(&file, "{\"id\": 0").unwrap();

    let result = load_catalog(&file);
    std::fs::remove_dir_all(&dir).ok();

    assert!(matches!(result, Err(MapperError::Catalog(_))));
}

#[test]
fn test_invalid_entries_are_skipped() {
    let dir = scratch_dir("skip");
    std::fs::create_dir_all(&dir).unwrap();
    let file = catalog_path(&dir);
    let broken = MINIMAL_CATALOG.replace(r#""path": ["/"]"#, r#""path": []"#);
    let combined = format!(
        "[{}, {}]",
        MINIMAL_CATALOG.trim().trim_start_matches('[').trim_end_matches(']'),
        broken.trim().trim_start_matches('[').trim_end_matches(']')
    );
    std::fs::write(&file, combined).unwrap();

    let services = load_catalog(&file);
    std::fs::remove_dir_all(&dir).ok();

    let services = services.unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].request.paths, vec!["/"]);
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_catalog_writes_loadable_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates/services.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MINIMAL_CATALOG))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = scratch_dir("fetch").join("nested");
    let url = format!("{}/templates/services.json", mock_server.uri());

    let written = fetch_catalog(&url, &dir).await;
    let loaded = written.as_ref().ok().map(|p| load_catalog(p));
    std::fs::remove_dir_all(dir.parent().unwrap()).ok();

    assert_eq!(written.unwrap(), catalog_path(&dir));
    let services = loaded.unwrap().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].id, 12);
}

#[tokio::test]
async fn test_fetch_catalog_rejects_non_array() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&mock_server)
        .await;

    let dir = scratch_dir("reject");
    let result = fetch_catalog(&mock_server.uri(), &dir).await;

    assert!(matches!(result, Err(MapperError::Catalog(_))));
    assert!(!catalog_path(&dir).exists());
}

#[tokio::test]
async fn test_fetch_catalog_keeps_existing_copy_on_http_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = scratch_dir("keep");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(catalog_path(&dir), MINIMAL_CATALOG).unwrap();

    let result = fetch_catalog(&mock_server.uri(), &dir).await;
    let kept = std::fs::read_to_string(catalog_path(&dir));
    std::fs::remove_dir_all(&dir).ok();

    assert!(matches!(result, Err(MapperError::HttpError(_))));
    assert_eq!(kept.unwrap(), MINIMAL_CATALOG);
}
