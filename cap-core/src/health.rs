//! Unified health status type, shared by the control-plane client's health
//! flag and any future health-check surface.

use serde::{Deserialize, Serialize};

/// Health status for a service or component.
///
/// The control-plane client only ever produces `Healthy` or `Degraded` —
/// the other two variants exist so a future health-check endpoint has a
/// real type to report against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational.
    Healthy,
    /// Component is operational but serving from a fallback path.
    Degraded,
    /// Component is not operational.
    Unhealthy,
    /// Health status is unknown (e.g., not yet checked).
    Unknown,
}

impl Default for HealthStatus {
    fn default() -> Self {
        HealthStatus::Unknown
    }
}
