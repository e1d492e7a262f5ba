//! Configuration management for misconfig-mapper

use crate::error::{MapperError, Result};
use crate::models::{ScanConfig, Verbosity};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// File-based configuration structure matching default.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    scan: Option<ScanSection>,
    templates: Option<TemplatesSection>,
    output: Option<OutputSection>,
}

#[derive(Debug, Deserialize)]
struct ScanSection {
    timeout_ms: Option<u64>,
    delay_ms: Option<u64>,
    max_redirects: Option<usize>,
    threads: Option<usize>,
    skip_ssl: Option<bool>,
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemplatesSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OutputSection {
    json: Option<bool>,
    verbosity: Option<u8>,
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub target: String,
    pub services: Option<String>,
    pub permutations: Option<String>,
    pub as_domain: Option<String>,
    pub skip_checks: Option<String>,
    pub headers: Option<String>,
    pub delay_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub max_redirects: Option<usize>,
    pub threads: Option<usize>,
    pub skip_ssl: bool,
    pub templates_dir: Option<String>,
    pub json: bool,
    pub verbosity: Option<u8>,
}

/// Loads configuration from a TOML file and merges with defaults
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MapperError::Config(format!("cannot read config file '{}': {e}", path.display()))
    })?;
    parse_config(&content)
}

/// Parses TOML configuration text on top of the defaults
pub fn parse_config(content: &str) -> Result<ScanConfig> {
    let file_config: FileConfig = toml::from_str(content)?;
    let mut config = ScanConfig::default();

    if let Some(scan) = file_config.scan {
        if let Some(timeout) = scan.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(delay) = scan.delay_ms {
            config.delay_ms = delay;
        }
        if let Some(redirects) = scan.max_redirects {
            config.max_redirects = redirects;
        }
        if let Some(threads) = scan.threads {
            config.threads = threads;
        }
        if let Some(skip) = scan.skip_ssl {
            config.skip_ssl = skip;
        }
        if let Some(ua) = scan.user_agent {
            config.user_agent = ua;
        }
    }

    if let Some(path) = file_config.templates.and_then(|t| t.path) {
        config.templates_dir = path;
    }

    if let Some(output) = file_config.output {
        if let Some(json) = output.json {
            config.json = json;
        }
        if let Some(level) = output.verbosity {
            config.verbosity = verbosity_or_default(level);
        }
    }

    Ok(config)
}

/// Merges CLI arguments into an existing ScanConfig
pub fn merge_cli_args(config: &mut ScanConfig, args: ScanOverrides) {
    config.target = args.target;

    if let Some(services) = args.services {
        config.services = services;
    }
    if let Some(raw) = args.permutations {
        config.permutations = parse_switch("permutations", &raw);
    }
    if let Some(raw) = args.as_domain {
        config.as_domain = parse_switch("as-domain", &raw);
    }
    if let Some(raw) = args.skip_checks {
        config.detection_only = parse_switch("skip-misconfiguration-checks", &raw);
    }
    if let Some(raw) = args.headers {
        config.headers.extend(parse_headers(&raw));
    }
    if let Some(delay) = args.delay_ms {
        config.delay_ms = delay;
    }
    if let Some(timeout) = args.timeout_ms {
        config.timeout_ms = timeout;
    }
    if let Some(redirects) = args.max_redirects {
        config.max_redirects = redirects;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.skip_ssl {
        config.skip_ssl = true;
    }
    if let Some(dir) = args.templates_dir {
        config.templates_dir = dir;
    }
    if args.json {
        config.json = true;
    }
    if let Some(level) = args.verbosity {
        config.verbosity = verbosity_or_default(level);
    }
}

/// Interprets a yes/no style switch value. Unknown values count as off.
pub fn parse_switch(flag: &str, raw: &str) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "on" | "1" | "enable" => true,
        "" | "n" | "no" | "false" | "off" | "0" | "disable" => false,
        other => {
            warn!("Invalid {} value supplied: {:?}, treating as off", flag, other);
            false
        }
    }
}

/// Parses `"Key: Value;; Key2: Value2"` into ordered header pairs.
/// Entries without a colon are skipped.
pub fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split(";;")
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            entry
                .split_once(": ")
                .or_else(|| entry.split_once(':'))
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn verbosity_or_default(level: u8) -> Verbosity {
    Verbosity::from_level(level).unwrap_or_else(|| {
        warn!("Invalid verbosity level {} (must be 0, 1 or 2), falling back to verbose", level);
        Verbosity::Verbose
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_values() {
        for on in ["y", "YES", "true", "On", "1", "enable"] {
            assert!(parse_switch("x", on), "{on}");
        }
        for off in ["", "n", "no", "FALSE", "off", "0", "disable", "maybe"] {
            assert!(!parse_switch("x", off), "{off}");
        }
    }

    #[test]
    fn headers_split_on_double_semicolon() {
        let headers = parse_headers("User-Agent: xyz;; Cookie: a=b; c=d;;X-Plain:1;;garbage;; ");
        assert_eq!(
            headers,
            vec![
                ("User-Agent".to_string(), "xyz".to_string()),
                ("Cookie".to_string(), "a=b; c=d".to_string()),
                ("X-Plain".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn header_value_may_contain_colons() {
        let headers = parse_headers("Referer: https://example.com:8443/x");
        assert_eq!(headers[0].1, "https://example.com:8443/x");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = parse_config(
            r#"
            [scan]
            timeout_ms = 3000
            delay_ms = 250
            threads = 4

            [templates]
            path = "/opt/templates"

            [output]
            json = true
            verbosity = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.threads, 4);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.templates_dir, "/opt/templates");
        assert!(config.json);
        assert_eq!(config.verbosity, Verbosity::Silent);
    }

    #[test]
    fn cli_wins_over_file() {
        let mut config = parse_config("[scan]\ntimeout_ms = 3000\n").unwrap();
        merge_cli_args(
            &mut config,
            ScanOverrides {
                target: "acme".to_string(),
                permutations: Some("off".to_string()),
                as_domain: Some("yes".to_string()),
                timeout_ms: Some(1000),
                verbosity: Some(9),
                ..ScanOverrides::default()
            },
        );

        assert_eq!(config.target, "acme");
        assert_eq!(config.timeout_ms, 1000);
        assert!(!config.permutations);
        assert!(config.as_domain);
        assert_eq!(config.verbosity, Verbosity::Verbose);
        assert!(config.validate().is_ok());
    }
}
