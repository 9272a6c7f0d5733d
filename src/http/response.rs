use std::collections::HashMap;

use serde_json::Value;

/// Response body: parsed JSON when the payload decodes, raw text otherwise.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ResponseBody::Json(_) => "json",
            ResponseBody::Text(_) => "text",
        }
    }

    /// Short rendering for failure messages.
    pub fn preview(&self) -> String {
        let raw = match self {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        };
        if raw.chars().count() > 120 {
            let truncated: String = raw.chars().take(120).collect();
            format!("{truncated}...")
        } else {
            raw
        }
    }
}

/// Everything captured from one completed HTTP round trip.
///
/// Produced once per request and never mutated. 4xx/5xx statuses are valid
/// captures; only transport failures prevent one from existing.
#[derive(Debug, Clone)]
pub struct ResponseCapture {
    pub status: u16,
    /// Header names lowercased so lookups are case-insensitive.
    pub headers: HashMap<String, String>,
    pub body: ResponseBody,
    pub size_bytes: usize,
    pub duration_ms: u64,
}

impl ResponseCapture {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> Option<&Value> {
        self.body.as_json()
    }
}
