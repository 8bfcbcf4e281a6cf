//! Completion error types

use thiserror::Error;

/// Completion failure with classification.
///
/// Carries the full upstream detail for diagnostics. It never leaves the
/// conversation layer: callers only see [`crate::conversation::ChatError`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// HTTP status of the upstream response, when one was received
    pub status: Option<u16>,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Timeout, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Malformed, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Config, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Unknown, message)
    }
}

/// Error classification for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection refused, DNS, reset mid-body
    Network,
    /// Call exceeded the client timeout
    Timeout,
    /// Authentication failed (401, 403)
    Auth,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Bad request (400)
    InvalidRequest,
    /// 2xx body without a usable reply
    Malformed,
    /// Local setup problem (API key missing, client could not be built)
    Config,
    /// Any other non-2xx status
    Unknown,
}

/// Coarse failure families used in log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    ConfigurationMissing,
    TransportFailure,
    UpstreamRejection,
    MalformedResponse,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::TransportFailure => "transport_failure",
            Self::UpstreamRejection => "upstream_rejection",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl LlmErrorKind {
    pub fn category(self) -> FailureCategory {
        match self {
            Self::Config => FailureCategory::ConfigurationMissing,
            Self::Network | Self::Timeout => FailureCategory::TransportFailure,
            Self::Auth
            | Self::RateLimit
            | Self::ServerError
            | Self::InvalidRequest
            | Self::Unknown => FailureCategory::UpstreamRejection,
            Self::Malformed => FailureCategory::MalformedResponse,
        }
    }
}
