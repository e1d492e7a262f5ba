//! JSONL (JSON Lines) output, one hit per line

use crate::models::ProbeOutcome;
use std::io::Write;
use std::sync::Mutex;
use tracing::error;

use super::Reporter;

/// Writes every hit as one JSON object per line; misses are left to the logs
pub struct JsonLinesReporter<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Reporter for JsonLinesReporter<W> {
    fn report(&self, outcome: &ProbeOutcome) {
        if !outcome.is_hit() {
            return;
        }

        let line = match serde_json::to_string(outcome) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize result for {}: {}", outcome.url, e);
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            error!("Failed to write result for {}: {}", outcome.url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::ServiceTemplate;
    use std::sync::Arc;

    fn service() -> Arc<ServiceTemplate> {
        let json = r#"{
          "id": 3,
          "request": {"method": "GET", "baseURL": "https://{TARGET}.example.com", "path": ["/"], "headers": []},
          "response": {"statusCode": 200, "detectionFingerprints": ["x"], "fingerprints": []},
          "metadata": {"service": "ex", "serviceName": "Example", "description": "d",
                       "reproductionSteps": [], "references": []}
        }"#;
        Arc::new(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn writes_hits_only_one_per_line() {
        let service = service();
        let reporter = JsonLinesReporter::new(Vec::new());

        let miss = ProbeOutcome::new("https://a.example.com/", "a", &service);
        let hit = ProbeOutcome {
            exists: true,
            ..ProbeOutcome::new("https://b.example.com/", "b", &service)
        };
        reporter.report(&miss);
        reporter.report(&hit);

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["url"], "https://b.example.com/");
        assert_eq!(value["exists"], true);
        assert_eq!(value["vulnerable"], false);
        assert_eq!(value["serviceid"], "3");
        assert_eq!(value["service"]["metadata"]["serviceName"], "Example");
        assert!(value.get("failure").is_none());
    }
}
