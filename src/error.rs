//! Error types for the role synchronization job

use std::fmt;

use thiserror::Error;

/// Result type alias for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while loading, resolving or writing role mappings
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration value missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials file unreadable or invalid
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Token exchange with the authorization server failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Google API answered with a non-success status
    #[error("Google API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Group or user does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Caller lacks permission on the resource
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Group nesting deeper than the configured limit
    #[error("Group '{group}' at nesting depth {depth} exceeds maximum {max_depth}")]
    DepthExceeded {
        group: String,
        depth: usize,
        max_depth: usize,
    },

    /// Operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl SyncError {
    /// Classifies the error for run reports
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::NotFound(_) => FailureKind::NotFound,
            SyncError::PermissionDenied(_) => FailureKind::PermissionDenied,
            SyncError::DepthExceeded { .. } => FailureKind::DepthExceeded,
            SyncError::Timeout(_) => FailureKind::Transient,
            SyncError::Http(err) if err.is_timeout() || err.is_connect() => FailureKind::Transient,
            SyncError::Api { status, .. } if is_transient_status(*status) => FailureKind::Transient,
            _ => FailureKind::Other,
        }
    }
}

/// Returns true for HTTP statuses worth retrying
pub(crate) fn is_transient_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Coarse failure classification carried by run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    Transient,
    DepthExceeded,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::NotFound => "not_found",
            FailureKind::PermissionDenied => "permission_denied",
            FailureKind::Transient => "transient",
            FailureKind::DepthExceeded => "depth_exceeded",
            FailureKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Serializes a [`FailureKind`] through its `Display` label
pub(crate) fn serialize_kind<S: serde::Serializer>(
    kind: &FailureKind,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(kind)
}
