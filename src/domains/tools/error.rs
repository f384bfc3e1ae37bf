//! Tool-specific error types.
//!
//! Every failure a tool call can hit falls into one of the categories below.
//! They are all converted into a failure envelope at the adapter boundary;
//! none of them escape to the transport.

use thiserror::Error;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The caller's input was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A setting the adapter itself needs is missing.
    #[error("{0}")]
    Configuration(String),

    /// Talking to the external service failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The external service answered with something we cannot map.
    #[error("invalid upstream response: {0}")]
    Normalization(String),

    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new normalization error.
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization(msg.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short category label, used for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Upstream(_) => "upstream",
            Self::Normalization(_) => "normalization",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    /// Render the caller-facing message for this error.
    ///
    /// `context` names the action ("Search", "Download", ...) and prefixes
    /// upstream and normalization failures so the caller can tell them apart
    /// from input mistakes.
    pub fn describe(&self, context: &str) -> String {
        match self {
            Self::Validation(e) => format!("Input error: {e}"),
            Self::Configuration(msg) => msg.clone(),
            Self::Upstream(e) => format!("{context} failed: {e}"),
            Self::Normalization(_) => format!("{context} failed: {self}"),
            Self::NotFound(_) => self.to_string(),
            Self::Internal(msg) => format!("An internal server error occurred: {msg}"),
        }
    }
}

/// Rejections produced by the parameter validator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required parameter: {name}")]
    Missing { name: String },

    #[error("Invalid parameter '{name}': expected {expected}, got {actual}")]
    WrongType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid parameter '{name}': {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("Invalid parameter '{name}': '{value}' is not one of: {allowed}")]
    NotAllowed {
        name: String,
        value: String,
        allowed: String,
    },

    #[error("Invalid parameter '{name}': '{value}' does not match the expected format ({format})")]
    PatternMismatch {
        name: String,
        value: String,
        format: String,
    },

    #[error("Invalid parameter '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

impl ValidationError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing { name: name.into() }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The offending parameter.
    pub fn parameter(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::WrongType { name, .. }
            | Self::OutOfRange { name, .. }
            | Self::NotAllowed { name, .. }
            | Self::PatternMismatch { name, .. }
            | Self::Invalid { name, .. } => name,
        }
    }
}

/// Failures talking to an external service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("network error: {0}")]
    Transport(String),

    /// The request could not be built (bad URL, signing failure).
    #[error("could not build request: {0}")]
    Request(String),
}

impl UpstreamError {
    /// HTTP status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::Request(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_prefixes_by_category() {
        let missing = ToolError::from(ValidationError::missing("query"));
        assert_eq!(
            missing.describe("Search"),
            "Input error: Missing required parameter: query"
        );

        let upstream = ToolError::from(UpstreamError::Status {
            status: 503,
            body: "unavailable".into(),
        });
        assert_eq!(
            upstream.describe("Download"),
            "Download failed: HTTP 503: unavailable"
        );

        let shape = ToolError::normalization("missing field `link`");
        assert_eq!(
            shape.describe("Search"),
            "Search failed: invalid upstream response: missing field `link`"
        );

        let config = ToolError::configuration("Missing API credentials");
        assert_eq!(config.describe("Search"), "Missing API credentials");
    }

    #[test]
    fn test_validation_error_names_parameter() {
        let err = ValidationError::NotAllowed {
            name: "safe_search".into(),
            value: "medium".into(),
            allowed: "active, off".into(),
        };
        assert_eq!(err.parameter(), "safe_search");
        assert!(err.to_string().contains("safe_search"));
    }

    #[test]
    fn test_upstream_status_accessor() {
        let err = UpstreamError::Status {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(UpstreamError::Timeout("t".into()).status(), None);
    }
}
