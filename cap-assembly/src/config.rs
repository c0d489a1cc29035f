//! Budget and timing knobs for a single [`crate::ContextAssembler::assemble`]
//! call.

use std::time::Duration;

/// Mirrors the defaults named in the assembly entry point's signature:
/// `assemble(prompt, project, budget_tokens=8000, per_source_timeout_ms=2500,
/// overall_timeout_ms=6000)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblerConfig {
    /// Token budget the packed bundle must not exceed.
    pub budget_tokens: usize,
    /// Per-adapter deadline. A slow adapter times out without affecting
    /// the others.
    pub per_source_timeout: Duration,
    /// Deadline for the whole `assemble()` call. Adapter tasks still
    /// outstanding when it elapses are aborted.
    pub overall_timeout: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            budget_tokens: 8000,
            per_source_timeout: Duration::from_millis(2500),
            overall_timeout: Duration::from_millis(6000),
        }
    }
}

impl AssemblerConfig {
    pub fn with_budget_tokens(mut self, budget_tokens: usize) -> Self {
        self.budget_tokens = budget_tokens;
        self
    }

    pub fn with_per_source_timeout(mut self, timeout: Duration) -> Self {
        self.per_source_timeout = timeout;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AssemblerConfig::default();
        assert_eq!(config.budget_tokens, 8000);
        assert_eq!(config.per_source_timeout, Duration::from_millis(2500));
        assert_eq!(config.overall_timeout, Duration::from_millis(6000));
    }

    #[test]
    fn builders_override_individual_fields() {
        let config = AssemblerConfig::default()
            .with_budget_tokens(100)
            .with_per_source_timeout(Duration::from_millis(10))
            .with_overall_timeout(Duration::from_millis(20));
        assert_eq!(config.budget_tokens, 100);
        assert_eq!(config.per_source_timeout, Duration::from_millis(10));
        assert_eq!(config.overall_timeout, Duration::from_millis(20));
    }
}
