//! Control-plane client error type.

use thiserror::Error;

/// Structured error surfaced by [`crate::ControlPlaneClient::request`].
///
/// `Network` and `Timeout` are retried once with a 250 ms back-off before
/// falling through to local storage; the remaining kinds are surfaced
/// directly to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct ControlPlaneError {
    pub kind: ControlPlaneErrorKind,
    pub retriable: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPlaneErrorKind {
    Network,
    Timeout,
    ServerError,
    NotFound,
    Conflict,
    BadRequest,
    Unauthorized,
    Malformed,
}

impl std::fmt::Display for ControlPlaneErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ControlPlaneErrorKind::Network => "network",
            ControlPlaneErrorKind::Timeout => "timeout",
            ControlPlaneErrorKind::ServerError => "server_error",
            ControlPlaneErrorKind::NotFound => "not_found",
            ControlPlaneErrorKind::Conflict => "conflict",
            ControlPlaneErrorKind::BadRequest => "bad_request",
            ControlPlaneErrorKind::Unauthorized => "unauthorized",
            ControlPlaneErrorKind::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

impl ControlPlaneError {
    pub fn new(kind: ControlPlaneErrorKind, message: impl Into<String>) -> Self {
        let retriable = matches!(kind, ControlPlaneErrorKind::Network | ControlPlaneErrorKind::Timeout);
        Self {
            kind,
            retriable,
            message: message.into(),
        }
    }

    /// Whether a failure of this kind should trigger a fallback-to-storage
    /// attempt (as opposed to being surfaced to the caller unconditionally).
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self.kind,
            ControlPlaneErrorKind::Network
                | ControlPlaneErrorKind::Timeout
                | ControlPlaneErrorKind::ServerError
                | ControlPlaneErrorKind::Malformed
        )
    }
}
