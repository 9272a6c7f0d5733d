//! Request executor: one `RequestSpec` in, one `ResponseCapture` out.
//!
//! Transport failures are classified and surfaced, never retried. A
//! completed round trip always yields a capture regardless of HTTP status.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::broadcast;

use crate::error::{HarnessError, HarnessResult};

use super::request::RequestSpec;
use super::response::{ResponseBody, ResponseCapture};

/// Read-only request context shared by every scenario in a run.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub base_url: String,
    pub default_headers: Vec<(String, String)>,
    pub timeout_ms: u64,
}

impl ExecutionContext {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: Vec::new(),
            timeout_ms,
        }
    }

    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((key.into(), value.into()));
        self
    }
}

/// Join a spec path onto the base URL. Absolute URLs bypass the base
/// entirely so a scenario can target a different host than the configured
/// one.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Merge default headers with spec overrides. Overrides win on
/// case-insensitive key collision; an override with an empty value removes
/// the header instead of sending it blank.
pub fn merge_headers(
    defaults: &[(String, String)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = Vec::new();

    for (key, value) in defaults.iter().chain(overrides.iter()) {
        if key.is_empty() {
            continue;
        }
        merged.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        merged.push((key.clone(), value.clone()));
    }

    merged.retain(|(_, value)| !value.is_empty());
    merged
}

fn build_header_map(headers: &[(String, String)]) -> HarnessResult<HeaderMap> {
    let mut map = HeaderMap::new();

    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| HarnessError::InvalidRequest(format!("invalid header name `{key}`: {err}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|err| HarnessError::InvalidRequest(format!("invalid header value for `{key}`: {err}")))?;
        map.insert(name, header_value);
    }

    Ok(map)
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Execute one request. Returns a capture for any completed round trip;
/// transport failures (DNS, refused, TLS, timeout, read) and cancellation
/// come back as `HarnessError::Transport`.
pub async fn execute(
    spec: &RequestSpec,
    ctx: &ExecutionContext,
    cancel_rx: &mut broadcast::Receiver<()>,
) -> HarnessResult<ResponseCapture> {
    let url = resolve_url(&ctx.base_url, &spec.path);

    let mut merged = merge_headers(&ctx.default_headers, &spec.headers);
    let body = match &spec.body {
        Some(value) => {
            if !has_header(&merged, "content-type") {
                merged.push((CONTENT_TYPE.to_string(), "application/json".to_string()));
            }
            Some(value.to_string())
        }
        None => None,
    };
    let headers = build_header_map(&merged)?;

    let timeout_ms = spec.timeout_ms.unwrap_or(ctx.timeout_ms);
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|err| HarnessError::InvalidRequest(format!("failed to build HTTP client: {err}")))?;

    let mut request = client.request(spec.method.into(), &url).headers(headers);
    if let Some(body) = body {
        request = request.body(body);
    }

    let started = Instant::now();
    let result = tokio::select! {
        result = request.send() => result,
        _ = cancel_rx.recv() => return Err(HarnessError::cancelled()),
    };

    let response = result.map_err(|err| HarnessError::transport(&err))?;
    let status = response.status().as_u16();

    let mut response_headers = HashMap::new();
    for (key, value) in response.headers() {
        response_headers.insert(
            key.as_str().to_ascii_lowercase(),
            value.to_str().unwrap_or_default().to_string(),
        );
    }

    let bytes = tokio::select! {
        bytes = response.bytes() => bytes.map_err(|err| HarnessError::transport(&err))?,
        _ = cancel_rx.recv() => return Err(HarnessError::cancelled()),
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    let text = String::from_utf8_lossy(&bytes).into_owned();
    let body = match serde_json::from_str(&text) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Text(text),
    };

    Ok(ResponseCapture {
        status,
        headers: response_headers,
        body,
        size_bytes: bytes.len(),
        duration_ms,
    })
}
