use serde_json::Value;
use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    StateFileCorrupt,
    LockContention,
    StateWriteFailed,
    AuthenticationRequired,
    PermissionDenied,
    NotFound,
    InvalidRequest,
    InvalidInput,
    InvalidEnumValue,
    ServerError,
    NetworkUnreachable,
    DecodeFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::StateFileCorrupt => "E1002",
            Self::LockContention => "E1003",
            Self::StateWriteFailed => "E1004",
            Self::AuthenticationRequired => "E2001",
            Self::PermissionDenied => "E2002",
            Self::NotFound => "E2003",
            Self::InvalidRequest => "E2004",
            Self::InvalidInput => "E3001",
            Self::InvalidEnumValue => "E3002",
            Self::ServerError => "E5001",
            Self::NetworkUnreachable => "E5002",
            Self::DecodeFailed => "E5003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::StateFileCorrupt => "Persisted state file is corrupt",
            Self::LockContention => "Lock contention",
            Self::StateWriteFailed => "Could not write persisted state",
            Self::AuthenticationRequired => "Authentication required",
            Self::PermissionDenied => "Permission denied",
            Self::NotFound => "Resource not found",
            Self::InvalidRequest => "Request rejected by server",
            Self::InvalidInput => "Invalid input",
            Self::InvalidEnumValue => "Invalid status/priority/theme value",
            Self::ServerError => "Server error",
            Self::NetworkUnreachable => "API server unreachable",
            Self::DecodeFailed => "Unexpected response body",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in buglense/config.toml and retry."),
            Self::StateFileCorrupt => Some("Delete the state file to start from defaults."),
            Self::LockContention => Some("Retry after the other `bl` process releases its lock."),
            Self::StateWriteFailed => {
                Some("Check that --state-dir / BUGLENSE_STATE_DIR is a writable directory.")
            }
            Self::AuthenticationRequired => Some("Run `bl login` to start a session."),
            Self::PermissionDenied => Some("Ask a team owner for access."),
            Self::NotFound | Self::InvalidRequest => None,
            Self::InvalidInput => Some("Check the required fields and retry."),
            Self::InvalidEnumValue => Some("Use one of the documented values."),
            Self::ServerError => Some("Retry later. If persistent, check the server logs."),
            Self::NetworkUnreachable => {
                Some("Check --api-url / BUGLENSE_API_URL and that the server is running.")
            }
            Self::DecodeFailed => Some("Verify the API URL points at a BugLense server."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// Map an HTTP status onto the closest code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationRequired,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            500.. => Self::ServerError,
            _ => Self::InvalidRequest,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure returned by the API client and every store operation.
///
/// Only [`ApiError::Http`] carries a status code; everything else is a
/// generic failure without one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        /// Parsed JSON error body, when the server sent one.
        data: Option<Value>,
    },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// HTTP status for classified errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Http { status, .. } => ErrorCode::from_status(*status),
            Self::Network(_) => ErrorCode::NetworkUnreachable,
            Self::Decode(_) => ErrorCode::DecodeFailed,
            Self::Invalid(_) => ErrorCode::InvalidInput,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
