//! Registration table mapping a `(domain, source)` pair onto the local
//! storage manager collection that serves the same data when the control
//! plane is unreachable.

use std::collections::HashMap;

/// `(domain, source) → (sm_domain, sm_collection)`.
#[derive(Debug, Clone, Default)]
pub struct FallbackRegistry {
    table: HashMap<(String, String), (String, String)>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        domain: impl Into<String>,
        source: impl Into<String>,
        sm_domain: impl Into<String>,
        sm_collection: impl Into<String>,
    ) -> &mut Self {
        self.table
            .insert((domain.into(), source.into()), (sm_domain.into(), sm_collection.into()));
        self
    }

    pub fn lookup(&self, domain: &str, source: &str) -> Option<(&str, &str)> {
        self.table
            .get(&(domain.to_string(), source.to_string()))
            .map(|(d, c)| (d.as_str(), c.as_str()))
    }

    /// The registrations every source adapter in this workspace currently
    /// relies on. Every read verb the core consumes is fallback-safe;
    /// per `spec.md` §4.2 write verbs fall back only when registered, and
    /// none of the core's write paths are registered here because CAP
    /// never writes through the control plane.
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry
            .register("memory", "memories", "memory", "memories")
            .register("kanban", "tasks", "kanban", "tasks")
            .register("crew", "projects", "crew", "projects")
            .register("jam", "sessions", "jam", "sessions")
            .register("knowledge", "graph", "knowledge", "graph");
        registry
    }
}
