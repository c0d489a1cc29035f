//! CAP Gateway - Control-Plane Client
//!
//! A resource-oriented gateway client that routes every read on the core
//! data sources through a uniform `request(domain, source, verb, ...)`
//! surface, with transparent fallback to [`cap_storage::StorageManager`]
//! when the gateway is unreachable.

mod client;
mod config;
mod error;
mod fallback;

pub use client::ControlPlaneClient;
pub use config::ControlPlaneConfig;
pub use error::{ControlPlaneError, ControlPlaneErrorKind};
pub use fallback::FallbackRegistry;
