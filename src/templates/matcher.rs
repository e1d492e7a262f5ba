//! Fingerprint compilation and response classification

use regex::Regex;

use super::loader::ServiceTemplate;
use crate::error::{MapperError, Result};
use crate::models::ScanMode;

/// Verdict for a single response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub exists: bool,
    pub vulnerable: bool,
    /// An exclusion pattern matched and suppressed every other signal
    pub excluded: bool,
}

/// Fingerprint lists of one service, compiled once per scan
#[derive(Debug, Clone)]
pub struct CompiledMatchers {
    mode: ScanMode,
    detection: Option<Regex>,
    vulnerability: Option<Regex>,
    exclusion: Option<Regex>,
}

/// Joins fragments with alternation and escapes literal dots.
///
/// A dot counts as literal unless it is already escaped or directly
/// followed by a quantifier (`.*`, `.+`, `.?`, `.{n}`).
pub fn build_expression(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|fragment| escape_literal_dots(fragment))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_literal_dots(fragment: &str) -> String {
    let chars: Vec<char> = fragment.chars().collect();
    let mut out = String::with_capacity(fragment.len() + 4);
    let mut backslashes = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        if c == '.' && backslashes % 2 == 0 {
            let quantified = matches!(chars.get(i + 1), Some('*' | '+' | '?' | '{'));
            if !quantified {
                out.push('\\');
            }
        }
        out.push(c);
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }

    out
}

fn compile(service: &ServiceTemplate, kind: &'static str, fragments: &[String]) -> Result<Option<Regex>> {
    if fragments.is_empty() {
        return Ok(None);
    }
    Regex::new(&build_expression(fragments))
        .map(Some)
        .map_err(|source| MapperError::Pattern {
            service: service.metadata.display_name.clone(),
            kind,
            source,
        })
}

impl CompiledMatchers {
    /// Compiles the exclusion list and the list `mode` classifies with.
    /// The other list is never compiled, so a broken one does not affect this mode.
    pub fn compile(service: &ServiceTemplate, mode: ScanMode) -> Result<Self> {
        let response = &service.response;
        let exclusion = match response.exclusion_patterns.as_deref() {
            Some(patterns) => compile(service, "exclusion", patterns)?,
            None => None,
        };

        let (detection, vulnerability) = match mode {
            ScanMode::Detection => (compile(service, "detection", &response.detection_patterns)?, None),
            ScanMode::Misconfiguration => (
                None,
                compile(service, "vulnerability", &response.vulnerability_patterns)?,
            ),
        };

        Ok(Self {
            mode,
            detection,
            vulnerability,
            exclusion,
        })
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Classifies a response blob (headers followed by body).
    ///
    /// Exclusion wins over everything. Detection mode only ever sets `exists`;
    /// misconfiguration mode only ever sets `vulnerable`, and only when the
    /// status code matched as well.
    pub fn classify(&self, status_matched: bool, blob: &str) -> Classification {
        if self.exclusion.as_ref().is_some_and(|re| re.is_match(blob)) {
            return Classification {
                excluded: true,
                ..Classification::default()
            };
        }

        let matches = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(blob));

        match self.mode {
            ScanMode::Detection => Classification {
                exists: matches(&self.detection),
                ..Classification::default()
            },
            ScanMode::Misconfiguration => Classification {
                vulnerable: status_matched && matches(&self.vulnerability),
                ..Classification::default()
            },
        }
    }
}
