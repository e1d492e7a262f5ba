//! URL crafting for (service, path, candidate) triples

use crate::error::{MapperError, Result};
use crate::models::Addressing;
use url::Url;

/// Placeholder replaced by the candidate in template addressing
pub const TARGET_PLACEHOLDER: &str = "{TARGET}";

/// Crafts the URL for one attempt.
///
/// Template addressing strips any `http://`/`https://` from the candidate and
/// substitutes every `{TARGET}` in `base_url + path`. A base URL without the
/// placeholder therefore ignores the candidate. Literal-domain addressing
/// ignores `base_url`, defaults the scheme to https and replaces only the path.
pub fn craft(base_url: &str, path: &str, candidate: &str, addressing: Addressing) -> Result<String> {
    match addressing {
        Addressing::Template => {
            let host = strip_scheme(candidate);
            let raw = format!("{base_url}{path}").replace(TARGET_PLACEHOLDER, host);
            Url::parse(&raw)
                .map(String::from)
                .map_err(|e| MapperError::InvalidUrl(format!("{raw} ({e})")))
        }
        Addressing::LiteralDomain => {
            let raw = if has_http_scheme(candidate) {
                candidate.to_string()
            } else {
                format!("https://{candidate}")
            };
            let mut url =
                Url::parse(&raw).map_err(|e| MapperError::InvalidUrl(format!("{raw} ({e})")))?;
            url.set_path(path);
            Ok(url.into())
        }
    }
}

fn has_http_scheme(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_scheme(candidate: &str) -> &str {
    candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"))
        .unwrap_or(candidate)
}
