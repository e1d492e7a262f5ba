//! Scan orchestration
//!
//! Drives services × candidates × paths: crafts each URL, waits on the shared
//! rate limiter, probes, and hands every outcome to the reporter. Paths of one
//! candidate are tried in order and stop at the first hit.

pub mod crafter;
pub mod probe;
pub mod targets;

use crate::error::Result;
use crate::http::{HttpClient, RateLimiter};
use crate::models::{Addressing, ProbeFailure, ProbeOutcome, ScanConfig, ScanMode, ScanSummary};
use crate::report::Reporter;
use crate::templates::{CompiledMatchers, ServiceTemplate};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Path probed for every candidate in detection mode
pub const ROOT_PATH: &str = "/";

/// Everything one candidate's attempts need, cheap to clone into a worker
#[derive(Clone)]
struct CandidateProber {
    client: HttpClient,
    limiter: RateLimiter,
    mode: ScanMode,
    addressing: Addressing,
}

impl CandidateProber {
    /// Tries the service's paths for one candidate, stopping at the first hit
    async fn run(
        &self,
        service: &Arc<ServiceTemplate>,
        matchers: &CompiledMatchers,
        candidate: &str,
    ) -> Vec<ProbeOutcome> {
        let paths: Vec<&str> = match self.mode {
            ScanMode::Detection => vec![ROOT_PATH],
            ScanMode::Misconfiguration => service.request.paths.iter().map(String::as_str).collect(),
        };

        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            let url = match crafter::craft(&service.request.base_url, path, candidate, self.addressing) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Skipping {} for {}: {}", candidate, service.metadata.display_name, e);
                    let raw = format!("{}{}", service.request.base_url, path);
                    outcomes.push(
                        ProbeOutcome::new(raw, candidate, service).with_failure(ProbeFailure::from(&e)),
                    );
                    continue;
                }
            };

            self.limiter.wait().await;
            let outcome = probe::probe(&self.client, &url, candidate, service, matchers).await;
            let hit = outcome.is_hit();
            outcomes.push(outcome);
            if hit {
                break;
            }
        }

        outcomes
    }
}

/// Orchestrates a scan of selected services against generated candidates
pub struct ScanEngine {
    prober: CandidateProber,
    threads: usize,
}

impl ScanEngine {
    /// Creates an engine from its parts
    pub fn new(
        client: HttpClient,
        limiter: RateLimiter,
        mode: ScanMode,
        addressing: Addressing,
        threads: usize,
    ) -> Self {
        Self {
            prober: CandidateProber {
                client,
                limiter,
                mode,
                addressing,
            },
            threads: threads.max(1),
        }
    }

    /// Creates an engine from scan configuration, rejecting invalid mode combinations
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            HttpClient::from_config(config)?,
            RateLimiter::from_delay_ms(config.delay_ms),
            config.scan_mode(),
            config.addressing(),
            config.threads,
        ))
    }

    pub fn mode(&self) -> ScanMode {
        self.prober.mode
    }

    /// Runs the scan. Services are visited in the given order; a service whose
    /// patterns do not compile is skipped and the others still run, so the
    /// scan itself cannot fail.
    pub async fn run(
        &self,
        services: &[ServiceTemplate],
        candidates: &[String],
        reporter: &dyn Reporter,
    ) -> ScanSummary {
        let mut summary = ScanSummary::new(candidates.len());
        info!(
            "Checking {} services against {} candidates",
            services.len(),
            candidates.len()
        );

        for service in services {
            let matchers = match CompiledMatchers::compile(service, self.prober.mode) {
                Ok(matchers) => Arc::new(matchers),
                Err(e) => {
                    error!("{e}");
                    summary.services_aborted += 1;
                    continue;
                }
            };
            let service = Arc::new(service.clone());

            if self.threads == 1 {
                for candidate in candidates {
                    let outcomes = self.prober.run(&service, &matchers, candidate).await;
                    deliver(&outcomes, reporter, &mut summary);
                }
            } else {
                self.run_pooled(&service, &matchers, candidates, reporter, &mut summary)
                    .await;
            }

            summary.services_scanned += 1;
        }

        summary.requests = self.prober.client.request_count();
        summary.finish();
        summary
    }

    /// Probes candidates concurrently, at most `threads` at a time
    async fn run_pooled(
        &self,
        service: &Arc<ServiceTemplate>,
        matchers: &Arc<CompiledMatchers>,
        candidates: &[String],
        reporter: &dyn Reporter,
        summary: &mut ScanSummary,
    ) {
        let semaphore = Arc::new(Semaphore::new(self.threads));
        let mut set = JoinSet::new();

        for candidate in candidates {
            let sem = Arc::clone(&semaphore);
            let prober = self.prober.clone();
            let service = Arc::clone(service);
            let matchers = Arc::clone(matchers);
            let candidate = candidate.clone();

            set.spawn(async move {
                let _permit = sem.acquire().await;
                prober.run(&service, &matchers, &candidate).await
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(outcomes) => deliver(&outcomes, reporter, summary),
                Err(e) => error!("Candidate task panicked: {}", e),
            }
        }
    }
}

fn deliver(outcomes: &[ProbeOutcome], reporter: &dyn Reporter, summary: &mut ScanSummary) {
    for outcome in outcomes {
        summary.attempts += 1;
        if outcome.is_hit() {
            summary.hits += 1;
        }
        reporter.report(outcome);
    }
}
