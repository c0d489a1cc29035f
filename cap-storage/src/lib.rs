//! CAP Storage - Local Fallback Store
//!
//! A content-addressed, per-domain JSON store implementing the same
//! collection/record semantics the control plane exposes over HTTP. The
//! context assembly pipeline falls back here transparently whenever the
//! control plane is unreachable.

mod config;
mod error;
mod manager;

pub use config::StorageManagerConfig;
pub use error::{StorageError, StorageResult};
pub use manager::StorageManager;
