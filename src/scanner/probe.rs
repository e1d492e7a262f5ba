//! Single-attempt probing and classification

use std::sync::Arc;

use tracing::debug;

use crate::http::HttpClient;
use crate::models::{ProbeFailure, ProbeOutcome};
use crate::templates::{CompiledMatchers, ServiceTemplate};

/// Requests `url` as described by `service` and classifies the response.
///
/// Never fails: request and transport errors become a non-hit outcome
/// carrying a [`ProbeFailure`].
pub async fn probe(
    client: &HttpClient,
    url: &str,
    candidate: &str,
    service: &Arc<ServiceTemplate>,
    matchers: &CompiledMatchers,
) -> ProbeOutcome {
    let outcome = ProbeOutcome::new(url, candidate, service);

    let response = match client
        .send(
            &service.request.method,
            url,
            &service.header_pairs(),
            service.body_text(),
        )
        .await
    {
        Ok(response) => response,
        Err(e) => {
            debug!("Request to {} failed: {}", url, e);
            return outcome.with_failure(ProbeFailure::from(&e));
        }
    };

    let status_matched = service.response.expected_status.matches(response.status);
    let verdict = matchers.classify(status_matched, &response.searchable_text());

    if verdict.excluded {
        debug!("Excluded {} due to matching exclusion pattern", url);
    }

    ProbeOutcome {
        exists: verdict.exists,
        vulnerable: verdict.vulnerable,
        excluded: verdict.excluded,
        ..outcome
    }
}
