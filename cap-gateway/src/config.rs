//! Control-plane client configuration.

use std::time::Duration;

use cap_core::EnvConfig;

/// Configuration for a single [`crate::ControlPlaneClient`] instance.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Per-request deadline, 10 s unless overridden per call.
    pub default_deadline: Duration,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            token: None,
            default_deadline: Duration::from_secs(10),
        }
    }
}

impl ControlPlaneConfig {
    /// Build from `WICKED_CP_URL` / `WICKED_CP_TOKEN` (via [`EnvConfig`]).
    pub fn from_env() -> Self {
        let env = EnvConfig::from_env();
        Self {
            base_url: env.control_plane_url,
            token: env.control_plane_token,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }
}
