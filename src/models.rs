//! Core data models for misconfig-mapper

use crate::error::{MapperError, Result};
use crate::templates::ServiceTemplate;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Output detail level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verbosity {
    /// Only hits
    Silent,
    /// Hits plus terse failure notices
    Normal,
    /// Everything, including misses and failure causes
    Verbose,
}

impl Verbosity {
    /// Maps a numeric level (0, 1, 2). Out-of-range levels yield `None`.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Verbosity::Silent),
            1 => Some(Verbosity::Normal),
            2 => Some(Verbosity::Verbose),
            _ => None,
        }
    }

    /// Default tracing filter directive for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Silent => "misconfig_mapper=error",
            Verbosity::Normal => "misconfig_mapper=warn",
            Verbosity::Verbose => "misconfig_mapper=debug",
        }
    }
}

/// What a scan looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// Existence only, using detection fingerprints against `/`
    Detection,
    /// Misconfiguration checks using vulnerability fingerprints and status codes
    Misconfiguration,
}

/// How a candidate becomes a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Addressing {
    /// Substitute the candidate into the service's `{TARGET}` base URL
    Template,
    /// Use the candidate itself as the host and only swap in the path
    LiteralDomain,
}

/// Configuration for a scan session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Organization name, domain, or path to a file of seeds
    pub target: String,
    /// Service selector: `*`, ids and/or slugs, comma-separated
    pub services: String,
    /// Expand each seed with suffix permutations
    pub permutations: bool,
    /// Treat the target as a complete domain
    pub as_domain: bool,
    /// Only check whether instances exist
    pub detection_only: bool,
    /// Caller-supplied request headers, applied after template headers
    pub headers: Vec<(String, String)>,
    /// Minimum spacing between requests in milliseconds (0 = unlimited)
    pub delay_ms: u64,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
    /// Skip TLS certificate verification
    pub skip_ssl: bool,
    /// Number of candidates probed concurrently per service
    pub threads: usize,
    /// User-Agent header value
    pub user_agent: String,
    /// Directory holding `services.json`
    pub templates_dir: String,
    /// Emit one JSON object per line instead of human-readable blocks
    pub json: bool,
    pub verbosity: Verbosity,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            services: "0".to_string(),
            permutations: true,
            as_domain: false,
            detection_only: false,
            headers: Vec::new(),
            delay_ms: 0,
            timeout_ms: 7000,
            max_redirects: 5,
            skip_ssl: false,
            threads: 1,
            user_agent: concat!("misconfig-mapper/", env!("CARGO_PKG_VERSION")).to_string(),
            templates_dir: "./templates".to_string(),
            json: false,
            verbosity: Verbosity::Normal,
        }
    }
}

impl ScanConfig {
    /// Rejects mode combinations that cannot run
    pub fn validate(&self) -> Result<()> {
        if self.permutations && self.as_domain {
            return Err(MapperError::Config(
                "cannot enable both --as-domain and --permutations".to_string(),
            ));
        }
        Ok(())
    }

    pub fn scan_mode(&self) -> ScanMode {
        if self.detection_only {
            ScanMode::Detection
        } else {
            ScanMode::Misconfiguration
        }
    }

    pub fn addressing(&self) -> Addressing {
        if self.permutations || !self.as_domain {
            Addressing::Template
        } else {
            Addressing::LiteralDomain
        }
    }
}

/// Why an attempt produced no verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ProbeFailure {
    /// Candidate and path did not form a valid URL
    InvalidUrl(String),
    /// The request could not be built
    Request(String),
    /// DNS, connect, TLS, timeout, redirect limit or body read failure
    Transport(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::InvalidUrl(reason) => write!(f, "invalid URL: {reason}"),
            ProbeFailure::Request(reason) => write!(f, "request error: {reason}"),
            ProbeFailure::Transport(reason) => write!(f, "transport error: {reason}"),
        }
    }
}

impl From<&MapperError> for ProbeFailure {
    fn from(err: &MapperError) -> Self {
        match err {
            MapperError::InvalidUrl(_) | MapperError::UrlError(_) => {
                ProbeFailure::InvalidUrl(err.to_string())
            }
            MapperError::Request(reason) => ProbeFailure::Request(reason.clone()),
            MapperError::Transport(reason) => ProbeFailure::Transport(reason.clone()),
            other => ProbeFailure::Transport(other.to_string()),
        }
    }
}

/// Result of one (service, candidate, path) attempt
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub url: String,
    /// Detection fingerprint matched (detection mode only)
    pub exists: bool,
    /// Vulnerability fingerprint and status code matched (misconfiguration mode only)
    pub vulnerable: bool,
    #[serde(rename = "serviceid")]
    pub service_id: String,
    pub service: Arc<ServiceTemplate>,
    #[serde(skip)]
    pub candidate: String,
    /// Set when an exclusion pattern suppressed the response
    #[serde(skip)]
    pub excluded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    /// Creates a non-hit outcome for `url`
    pub fn new(url: impl Into<String>, candidate: impl Into<String>, service: &Arc<ServiceTemplate>) -> Self {
        Self {
            url: url.into(),
            exists: false,
            vulnerable: false,
            service_id: service.id.to_string(),
            service: Arc::clone(service),
            candidate: candidate.into(),
            excluded: false,
            failure: None,
        }
    }

    /// Marks the attempt as failed
    pub fn with_failure(mut self, failure: ProbeFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn is_hit(&self) -> bool {
        self.exists || self.vulnerable
    }
}

/// Bookkeeping for a complete scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    /// Services whose patterns compiled and were probed
    pub services_scanned: usize,
    /// Services skipped because of invalid patterns
    pub services_aborted: usize,
    pub candidates: usize,
    /// Attempts handed to the reporter
    pub attempts: u64,
    pub hits: u64,
    /// HTTP requests actually sent
    pub requests: u64,
}

impl ScanSummary {
    pub fn new(candidates: usize) -> Self {
        Self {
            scan_id: uuid::Uuid::new_v4().to_string(),
            started_at: Local::now(),
            finished_at: None,
            services_scanned: 0,
            services_aborted: 0,
            candidates,
            attempts: 0,
            hits: 0,
            requests: 0,
        }
    }

    /// Marks the scan as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }
}
