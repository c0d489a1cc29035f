//! The common contract every knowledge-source adapter implements.

use async_trait::async_trait;
use cap_core::{ContextItem, Source};

/// `query(prompt, project) → ContextItem[]`. Implementations must never
/// propagate an error: any failure is caught, logged, and degrades to an
/// empty result.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;
    async fn query(&self, prompt: &str, project: Option<&str>) -> Vec<ContextItem>;
}
