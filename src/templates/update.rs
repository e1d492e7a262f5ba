//! Catalog refresh from the upstream repository

use crate::error::{MapperError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::loader::catalog_path;

/// Upstream location of the maintained service catalog
pub const CATALOG_URL: &str =
    "https://raw.githubusercontent.com/intigriti/misconfig-mapper/main/templates/services.json";

const FETCH_TIMEOUT: Duration = Duration::from_secs(7);

/// Pulls the latest catalog into `templates_dir`, replacing any existing copy
pub async fn update_catalog(templates_dir: &Path) -> Result<PathBuf> {
    fetch_catalog(CATALOG_URL, templates_dir).await
}

/// Downloads a catalog from `url` and writes it as the catalog file of `templates_dir`
pub async fn fetch_catalog(url: &str, templates_dir: &Path) -> Result<PathBuf> {
    let destination = catalog_path(templates_dir);
    info!("Pulling latest services into {}", destination.display());

    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;

    // Never replace the local catalog with something that is not one
    serde_json::from_slice::<Vec<serde_json::Value>>(&body)
        .map_err(|e| MapperError::Catalog(format!("downloaded catalog is not a JSON array: {e}")))?;

    if !templates_dir.exists() {
        info!("Creating templates directory {}", templates_dir.display());
        std::fs::create_dir_all(templates_dir)?;
    }
    std::fs::write(&destination, &body)?;

    info!("Saved {} bytes of templates", body.len());
    Ok(destination)
}
