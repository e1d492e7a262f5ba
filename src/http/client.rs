//! HTTP client wrapper with redirect capping and request tracking

use crate::error::{MapperError, Result};
use crate::models::ScanConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONNECTION};
use reqwest::{Client, Method};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Header lines followed by the body, as one searchable text.
    /// Header names appear in canonical form (`X-Frame-Options`), whatever
    /// casing the server sent.
    pub fn searchable_text(&self) -> String {
        let mut blob = String::with_capacity(self.body.len() + self.headers.len() * 32);
        for (name, value) in &self.headers {
            blob.push_str(&canonical_header_name(name));
            blob.push_str(": ");
            blob.push_str(value);
            blob.push('\n');
        }
        blob.push(' ');
        blob.push_str(&self.body);
        blob
    }
}

/// HTTP client wrapper carrying the caller's headers and a request counter
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_count: Arc<AtomicU64>,
    headers: Vec<(String, String)>,
}

impl HttpClient {
    /// Creates a new HttpClient from scan configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.skip_ssl)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            request_count: Arc::new(AtomicU64::new(0)),
            headers: config.headers.clone(),
        })
    }

    /// Sends one request and reads the full response.
    ///
    /// `template_headers` are applied first, then the caller's headers
    /// (last write wins), then `Connection: close`.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        template_headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<HttpResponse> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| MapperError::Request(format!("invalid method '{method}'")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in template_headers.iter().chain(self.headers.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| MapperError::Request(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| MapperError::Request(format!("invalid value for header '{name}': {e}")))?;
            headers.insert(name, value);
        }
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        self.request_count.fetch_add(1, Ordering::Relaxed);

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        debug!("Response: {status} for {}", response.url());

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    /// Returns the total number of requests made
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Uppercases the first letter and every letter after a hyphen, lowercases the rest
fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn transport_error(err: reqwest::Error) -> MapperError {
    let reason = if err.is_redirect() {
        format!("too many redirects: {err}")
    } else if err.is_timeout() {
        format!("timed out: {err}")
    } else if err.is_builder() {
        return MapperError::Request(err.to_string());
    } else {
        err.to_string()
    };
    MapperError::Transport(reason)
}
