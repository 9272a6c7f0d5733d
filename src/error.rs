//! Error types for the harness.
//!
//! Assertion mismatches are not errors: they are recorded as failing
//! outcomes and never propagate. Everything here is either a transport
//! failure scoped to one scenario or a startup problem that aborts the run.

/// Classified cause of a failed HTTP round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    DnsError,
    ConnectError,
    TlsError,
    Timeout,
    ReadError,
    Cancelled,
}

impl TransportKind {
    pub fn label(self) -> &'static str {
        match self {
            TransportKind::DnsError => "DNS_ERROR",
            TransportKind::ConnectError => "CONNECT_ERROR",
            TransportKind::TlsError => "TLS_ERROR",
            TransportKind::Timeout => "TIMEOUT",
            TransportKind::ReadError => "READ_ERROR",
            TransportKind::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HarnessError {
    /// Missing or invalid run configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A step's request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP round trip did not complete. Never retried.
    #[error("transport failure ({}): {message}", .kind.label())]
    Transport {
        kind: TransportKind,
        message: String,
    },

    /// Writing a report artifact failed.
    #[error("report output failed: {0}")]
    Report(String),
}

impl HarnessError {
    /// Classify a reqwest error into a transport failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        HarnessError::Transport {
            kind: classify_reqwest_error(err),
            message: err.to_string(),
        }
    }

    pub fn cancelled() -> Self {
        HarnessError::Transport {
            kind: TransportKind::Cancelled,
            message: "request cancelled".into(),
        }
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        return TransportKind::Timeout;
    }

    let message = err.to_string().to_ascii_lowercase();
    if message.contains("dns") || message.contains("failed to lookup address") {
        return TransportKind::DnsError;
    }
    if message.contains("tls") || message.contains("ssl") || message.contains("certificate") {
        return TransportKind::TlsError;
    }
    if err.is_connect() {
        return TransportKind::ConnectError;
    }

    TransportKind::ReadError
}

pub type HarnessResult<T> = Result<T, HarnessError>;
