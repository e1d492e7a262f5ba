//! Human-readable terminal output

use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use super::Reporter;
use crate::models::{ProbeOutcome, ScanMode, ScanSummary, Verbosity};
use crate::templates::ServiceTemplate;

/// Prints hits as blocks and, depending on verbosity, misses and failures
pub struct TextReporter {
    mode: ScanMode,
    verbosity: Verbosity,
    width: usize,
}

impl TextReporter {
    pub fn new(mode: ScanMode, verbosity: Verbosity) -> Self {
        Self {
            mode,
            verbosity,
            width: terminal_width(),
        }
    }

    /// Renders the block printed for a hit
    pub fn render_hit(&self, outcome: &ProbeOutcome) -> String {
        let meta = &outcome.service.metadata;
        let rule = "-".repeat(self.width);
        let mut out = String::new();

        out.push_str(&rule);
        out.push('\n');
        let headline = match self.mode {
            ScanMode::Detection => format!("[+] 1 {} detected!", meta.display_name),
            ScanMode::Misconfiguration => "[+] 1 Vulnerable result found!".to_string(),
        };
        out.push_str(&format!("{}\n", headline.green().bold()));
        out.push_str(&format!("URL: {}\n", outcome.url));
        out.push_str(&format!("Service: {}\n", meta.display_name));
        out.push_str(&format!("Description: {}\n", meta.description));

        if self.mode == ScanMode::Misconfiguration && !meta.reproduction_steps.is_empty() {
            out.push_str("\nReproduction Steps:\n");
            for step in &meta.reproduction_steps {
                out.push_str(&format!("\t- {step}\n"));
            }
        }

        if !meta.references.is_empty() {
            out.push_str("\nReferences:\n");
            for reference in &meta.references {
                out.push_str(&format!("\t- {reference}\n"));
            }
        }

        out.push_str(&rule);
        out
    }

    fn render_miss(&self, outcome: &ProbeOutcome) -> String {
        let name = &outcome.service.metadata.display_name;
        match self.mode {
            ScanMode::Detection => format!("[-] No {} instance found ({})", name, outcome.url),
            ScanMode::Misconfiguration => {
                format!("[-] No vulnerable {} instance found ({})", name, outcome.url)
            }
        }
    }
}

impl Reporter for TextReporter {
    fn report(&self, outcome: &ProbeOutcome) {
        if outcome.is_hit() {
            println!("{}", self.render_hit(outcome));
            return;
        }

        match (&outcome.failure, self.verbosity) {
            (_, Verbosity::Silent) => {}
            (Some(failure), Verbosity::Verbose) => {
                eprintln!("{} Failed to request {} ({})", "[-] Error:".red(), outcome.url, failure);
            }
            (Some(_), Verbosity::Normal) => {
                eprintln!("{} Failed to request {}", "[-] Error:".red(), outcome.url);
            }
            (None, Verbosity::Verbose) => println!("{}", self.render_miss(outcome)),
            (None, Verbosity::Normal) => {}
        }
    }
}

/// Table of available services
pub fn services_table(services: &[ServiceTemplate]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["ID", "Slug", "Service"]);
    for service in services {
        builder.push_record([
            service.id.to_string(),
            service.metadata.slug.clone(),
            service.metadata.display_name.clone(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Table summarizing a finished scan
pub fn summary_table(summary: &ScanSummary) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    builder.push_record(["Services scanned".to_string(), summary.services_scanned.to_string()]);
    if summary.services_aborted > 0 {
        builder.push_record(["Services aborted".to_string(), summary.services_aborted.to_string()]);
    }
    builder.push_record(["Candidates".to_string(), summary.candidates.to_string()]);
    builder.push_record(["Attempts".to_string(), summary.attempts.to_string()]);
    builder.push_record(["Requests sent".to_string(), summary.requests.to_string()]);
    builder.push_record(["Hits".to_string(), summary.hits.to_string()]);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Terminal width from `COLUMNS`, 80 when unknown
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(80)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn outcome() -> ProbeOutcome {
        let json = r#"{
          "id": 0,
          "request": {"method": "GET", "baseURL": "https://{TARGET}.atlassian.net", "path": ["/signup"], "headers": []},
          "response": {"statusCode": 200, "detectionFingerprints": ["Jira"], "fingerprints": ["Sign up"]},
          "metadata": {"service": "jira", "serviceName": "Atlassian Jira", "description": "Open signups",
                       "reproductionSteps": ["Register an account"], "references": ["https://example.com/ref"]}
        }"#;
        let service: Arc<ServiceTemplate> = Arc::new(serde_json::from_str(json).unwrap());
        ProbeOutcome {
            vulnerable: true,
            ..ProbeOutcome::new("https://acme.atlassian.net/signup", "acme", &service)
        }
    }

    #[test]
    fn misconfiguration_hit_lists_reproduction_steps() {
        let reporter = TextReporter::new(ScanMode::Misconfiguration, Verbosity::Normal);
        let block = reporter.render_hit(&outcome());
        assert!(block.contains("URL: https://acme.atlassian.net/signup"));
        assert!(block.contains("Service: Atlassian Jira"));
        assert!(block.contains("Reproduction Steps:"));
        assert!(block.contains("\t- Register an account"));
        assert!(block.contains("\t- https://example.com/ref"));
    }

    #[test]
    fn detection_hit_omits_reproduction_steps() {
        let reporter = TextReporter::new(ScanMode::Detection, Verbosity::Normal);
        let block = reporter.render_hit(&outcome());
        assert!(block.contains("Atlassian Jira detected!"));
        assert!(!block.contains("Reproduction Steps:"));
        assert!(block.contains("References:"));
    }

    #[test]
    fn services_table_lists_every_service() {
        let service = outcome().service;
        let table = services_table(&[(*service).clone()]);
        assert!(table.contains("jira"));
        assert!(table.contains("Atlassian Jira"));
    }
}
