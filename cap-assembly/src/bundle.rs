//! Context Bundle Emitter: the stable, serializable shape produced by one
//! `assemble()` call.

use cap_core::{ContextItem, Source};
use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: &str = "1.0.0";

/// One adapter that returned a hard error, alongside why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: Source,
    pub reason: String,
}

/// The emitter refuses to ship an item with non-finite relevance. In
/// practice `ContextItem::new` already rejects this at construction, but
/// the emitter re-checks at the boundary rather than trusting it
/// transitively.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("item {src}/{id} has non-finite relevance {relevance}")]
    NonFiniteRelevance { src: Source, id: String, relevance: f64 },
}

/// Ranked, budget-packed context handed back to the caller, with
/// diagnostics about every source consulted along the way. Field order
/// and `schema_version` are part of the wire contract — keep both
/// stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    pub tokens_used: usize,
    pub budget_tokens: usize,
    pub items: Vec<ContextItem>,
    pub sources_consulted: Vec<Source>,
    pub sources_succeeded: Vec<Source>,
    pub sources_failed: Vec<SourceFailure>,
    pub diagnostics: Vec<String>,
    pub schema_version: String,
}

impl ContextBundle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tokens_used: usize,
        budget_tokens: usize,
        items: Vec<ContextItem>,
        sources_consulted: Vec<Source>,
        sources_succeeded: Vec<Source>,
        sources_failed: Vec<SourceFailure>,
        diagnostics: Vec<String>,
    ) -> Result<Self, EmitError> {
        for item in &items {
            if !item.relevance.is_finite() {
                return Err(EmitError::NonFiniteRelevance {
                    src: item.source,
                    id: item.id.clone(),
                    relevance: item.relevance,
                });
            }
        }

        Ok(Self {
            tokens_used,
            budget_tokens,
            items,
            sources_consulted,
            sources_succeeded,
            sources_failed,
            diagnostics,
            schema_version: SCHEMA_VERSION.to_string(),
        })
    }
}
