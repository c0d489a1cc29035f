//! CAP Assembly — the Context Assembler and Context Bundle Emitter.
//!
//! [`ContextAssembler::assemble`] fans out to every registered
//! [`cap_sources::SourceAdapter`] concurrently, merges what comes back,
//! deduplicates by `(source, id)`, ranks by relevance and freshness, and
//! greedily packs the result under a token budget without ever splitting
//! an item. The result is a [`ContextBundle`]: a stable, serializable
//! shape carrying both the winning items and diagnostics about every
//! source that was consulted along the way.

mod assembler;
mod bundle;
mod config;

pub use assembler::ContextAssembler;
pub use bundle::{ContextBundle, EmitError, SourceFailure};
pub use config::AssemblerConfig;
