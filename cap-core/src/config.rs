//! Centralized environment configuration.
//!
//! All `WICKED_*` environment variables are read in exactly one place so
//! the rest of the workspace never has to reach into `std::env` ad hoc.

/// Environment-sourced defaults shared by the control-plane client and the
/// storage manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Control-plane base URL. `WICKED_CP_URL`, default `http://127.0.0.1:8787`.
    pub control_plane_url: String,
    /// Optional bearer credential. `WICKED_CP_TOKEN`, unset by default.
    pub control_plane_token: Option<String>,
    /// Storage manager base directory. `WICKED_STORAGE_BASE`, default
    /// `~/.something-wicked`.
    pub storage_base: String,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            control_plane_url: "http://127.0.0.1:8787".to_string(),
            control_plane_token: None,
            storage_base: default_storage_base(),
        }
    }
}

impl EnvConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// - `WICKED_CP_URL`: control-plane base URL.
    /// - `WICKED_CP_TOKEN`: bearer credential for the control plane.
    /// - `WICKED_STORAGE_BASE`: storage manager base directory.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            control_plane_url: std::env::var("WICKED_CP_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.control_plane_url),
            control_plane_token: std::env::var("WICKED_CP_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            storage_base: std::env::var("WICKED_STORAGE_BASE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.storage_base),
        }
    }
}

fn default_storage_base() -> String {
    std::env::var("HOME")
        .map(|home| format!("{home}/.something-wicked"))
        .unwrap_or_else(|_| ".something-wicked".to_string())
}
