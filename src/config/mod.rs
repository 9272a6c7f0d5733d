//! Run configuration loaded from environment variables, with CLI overrides
//! applied on top.
//!
//! The two mock deployments of the Activities API disagree about
//! representation: one serves numeric ids with ISO-8601 due dates, the other
//! string ids with Unix-second due dates. Which contract to assert is a
//! per-environment configuration value, never a guess.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::error::{HarnessError, HarnessResult};
use crate::http::ExecutionContext;

pub mod defaults {
    pub const TIMEOUT_MS: u64 = 30_000;
    pub const WORKERS: usize = 4;
    pub const REPORT_FILE: &str = "test-results.json";
}

/// How the Activities API represents the `id` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    Number,
    String,
}

impl IdFormat {
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().as_str() {
            "number" | "numeric" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for IdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
        }
    }
}

/// How the Activities API represents the `dueDate` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDateFormat {
    Iso8601,
    Unix,
}

impl DueDateFormat {
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().as_str() {
            "iso8601" | "iso" => Some(Self::Iso8601),
            "unix" | "timestamp" => Some(Self::Unix),
            _ => None,
        }
    }
}

impl fmt::Display for DueDateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iso8601 => write!(f, "iso8601"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base URL of the Activities API under test.
    pub base_url: String,
    /// Personal access token for the GitHub scenarios. When absent the
    /// authenticated GitHub scenarios are skipped at catalog build time.
    pub github_token: Option<String>,
    pub timeout_ms: u64,
    pub workers: usize,
    pub id_format: IdFormat,
    pub due_date_format: DueDateFormat,
    pub report_file: PathBuf,
}

impl RunConfig {
    /// Load configuration from the process environment. Call
    /// `dotenvy::dotenv()` first so a local `.env` participates.
    pub fn from_env() -> HarnessResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Testable core of `from_env`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        let lookup = |name: &str| {
            get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        // TESTMAN_BASE_URL is canonical; URL matches what the original
        // deployment configuration used.
        let base_url = lookup("TESTMAN_BASE_URL")
            .or_else(|| lookup("URL"))
            .ok_or_else(|| {
                HarnessError::Config("TESTMAN_BASE_URL is not set; no API to test against".to_string())
            })?;

        let timeout_ms = match lookup("TESTMAN_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                HarnessError::Config(format!("TESTMAN_TIMEOUT_MS must be an integer, got `{raw}`"))
            })?,
            None => defaults::TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(HarnessError::Config(
                "TESTMAN_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        let workers = match lookup("TESTMAN_WORKERS") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                HarnessError::Config(format!("TESTMAN_WORKERS must be an integer, got `{raw}`"))
            })?,
            None => defaults::WORKERS,
        };
        if workers == 0 {
            return Err(HarnessError::Config(
                "TESTMAN_WORKERS must be greater than 0".to_string(),
            ));
        }

        let id_format = match lookup("TESTMAN_ID_FORMAT") {
            Some(raw) => IdFormat::parse(&raw).ok_or_else(|| {
                HarnessError::Config(format!(
                    "TESTMAN_ID_FORMAT must be `number` or `string`, got `{raw}`"
                ))
            })?,
            None => IdFormat::Number,
        };

        let due_date_format = match lookup("TESTMAN_DUE_DATE_FORMAT") {
            Some(raw) => DueDateFormat::parse(&raw).ok_or_else(|| {
                HarnessError::Config(format!(
                    "TESTMAN_DUE_DATE_FORMAT must be `iso8601` or `unix`, got `{raw}`"
                ))
            })?,
            None => DueDateFormat::Iso8601,
        };

        let report_file = lookup("TESTMAN_REPORT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::REPORT_FILE));

        Ok(Self {
            base_url,
            github_token: lookup("GITHUB_API_TOKEN"),
            timeout_ms,
            workers,
            id_format,
            due_date_format,
            report_file,
        })
    }

    /// Request context shared by every scenario: read-only after startup.
    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.base_url.clone(), self.timeout_ms)
            .default_header("accept", "application/json")
    }
}
