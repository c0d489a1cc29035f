//! Declarative per-record projection, applied by [`crate::generic::GenericAdapter`].
//!
//! This is the Rust replacement for the original's `title_fn` / `summary_fn`
//! / `boost_fn` closures: each source implements this trait once instead of
//! being dispatched by string from a shared manifest.

use cap_core::Record;

pub trait Projector: Send + Sync {
    /// Short display line, `title_fn` in the original manifest.
    fn title(&self, record: &Record) -> String;
    /// One-paragraph digest, `summary_fn` in the original manifest.
    fn summary(&self, record: &Record) -> String;
    /// `type_boost` contribution in `[0, 0.5]`, `boost_fn` in the original
    /// manifest.
    fn boost(&self, record: &Record) -> f64;
}

/// Truncate to at most `max_chars` Unicode scalar values, matching the
/// original's Python string-slice truncation.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
