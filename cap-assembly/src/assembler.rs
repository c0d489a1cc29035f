//! Context Assembler: fan out to every registered source adapter
//! concurrently, merge, dedupe, rank, and pack the result under a token
//! budget.
//!
//! The fan-out/timeout shape is new relative to anything already in this
//! workspace — no adapter-style concurrency existed to generalize from —
//! but it leans on `tokio::task::JoinSet` and `tokio::time::timeout`,
//! which are the idiomatic primitives for exactly this "race N tasks
//! against a deadline, cancel the stragglers" problem and sit on top of
//! the `tokio` dependency this workspace already carries. The budget-pack
//! step keeps the greedy, priority-ordered admission shape of the
//! original context-window packer this crate replaces, retargeted from
//! section objects to ranked `ContextItem`s with truncation dropped
//! entirely: items are admitted whole or not at all.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use cap_core::{AdapterOutcome, ContextItem, HealthStatus, Source};
use cap_gateway::ControlPlaneClient;
use cap_sources::SourceAdapter;
use tokio::task::{Id, JoinSet};
use tokio::time::timeout;

use crate::bundle::{ContextBundle, EmitError, SourceFailure};
use crate::config::AssemblerConfig;

struct AdapterRun {
    source: Source,
    outcome: AdapterOutcome,
    items: Vec<ContextItem>,
    error: Option<String>,
}

/// Orchestrates every registered [`SourceAdapter`]. An optional shared
/// [`ControlPlaneClient`] is consulted only for its health flag, surfaced
/// as a `degraded: control-plane` diagnostic when the gateway has failed
/// over to local storage.
pub struct ContextAssembler {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    control_plane: Option<Arc<ControlPlaneClient>>,
}

impl ContextAssembler {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters, control_plane: None }
    }

    /// Attach the control-plane client shared with the adapters so a
    /// `degraded: control-plane` diagnostic can be raised alongside
    /// whatever items the adapters still managed to return from
    /// fallback storage.
    pub fn with_control_plane(mut self, control_plane: Arc<ControlPlaneClient>) -> Self {
        self.control_plane = Some(control_plane);
        self
    }

    pub async fn assemble(
        &self,
        prompt: &str,
        project: Option<&str>,
        config: &AssemblerConfig,
    ) -> Result<ContextBundle, EmitError> {
        let start = Instant::now();
        let runs = self.fan_out(prompt, project, config).await;

        let sources_consulted: Vec<Source> = self.adapters.iter().map(|a| a.source()).collect();
        let mut sources_succeeded = Vec::new();
        let mut sources_failed = Vec::new();
        let mut diagnostics = Vec::new();
        let mut merged = Vec::new();

        for run in runs {
            match run.outcome {
                AdapterOutcome::Succeeded => {
                    sources_succeeded.push(run.source);
                    merged.extend(run.items);
                }
                AdapterOutcome::Failed => {
                    let reason = run.error.unwrap_or_else(|| "adapter failed".to_string());
                    diagnostics.push(format!("failed: {}: {}", run.source, reason));
                    sources_failed.push(SourceFailure { source: run.source, reason });
                }
                AdapterOutcome::TimedOut => {
                    diagnostics.push(format!("timed_out: {}", run.source));
                }
                AdapterOutcome::Cancelled => {
                    diagnostics.push(format!("cancelled: {}", run.source));
                }
                AdapterOutcome::Pending | AdapterOutcome::Running => {
                    unreachable!("fan_out always resolves each task to a terminal outcome")
                }
            }
        }

        if let Some(cpc) = &self.control_plane {
            if cpc.health().await == HealthStatus::Degraded {
                diagnostics.push("degraded: control-plane".to_string());
            }
        }

        let ranked = dedupe_and_rank(merged);
        let (items, tokens_used) = pack(ranked, config.budget_tokens);

        tracing::info!(
            sources_consulted = sources_consulted.len(),
            sources_succeeded = sources_succeeded.len(),
            sources_failed = sources_failed.len(),
            items = items.len(),
            tokens_used,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "assembled context bundle"
        );

        ContextBundle::new(tokens_used, config.budget_tokens, items, sources_consulted, sources_succeeded, sources_failed, diagnostics)
    }

    /// Spawn every adapter concurrently, bound each to `per_source_timeout`,
    /// and bound the whole drain to `overall_timeout`. Adapters still
    /// outstanding when the overall deadline fires are aborted via
    /// [`JoinSet::abort_all`] — dropping a `JoinSet` (or calling
    /// `abort_all`) cancels its tasks at their next await point, which is
    /// how the sub-100ms cancellation requirement is met without any
    /// cooperative polling on our part.
    async fn fan_out(&self, prompt: &str, project: Option<&str>, config: &AssemblerConfig) -> Vec<AdapterRun> {
        let mut id_to_source: HashMap<Id, Source> = HashMap::new();
        let mut set: JoinSet<(AdapterOutcome, Vec<ContextItem>)> = JoinSet::new();

        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let source = adapter.source();
            let prompt = prompt.to_string();
            let project = project.map(str::to_string);
            let per_source_timeout = config.per_source_timeout;
            let abort_handle = set.spawn(async move {
                match timeout(per_source_timeout, adapter.query(&prompt, project.as_deref())).await {
                    Ok(items) => (AdapterOutcome::Succeeded, items),
                    Err(_) => {
                        tracing::warn!(%source, "adapter timed out");
                        (AdapterOutcome::TimedOut, Vec::new())
                    }
                }
            });
            id_to_source.insert(abort_handle.id(), source);
        }

        let mut runs: Vec<AdapterRun> = Vec::new();
        let drained = timeout(config.overall_timeout, async {
            while let Some(res) = set.join_next_with_id().await {
                match res {
                    Ok((id, (outcome, items))) => {
                        let source = id_to_source.get(&id).copied().expect("every spawned task is registered");
                        runs.push(AdapterRun { source, outcome, items, error: None });
                    }
                    Err(join_err) => {
                        let source = id_to_source.get(&join_err.id()).copied().expect("every spawned task is registered");
                        tracing::warn!(%source, error = %join_err, "adapter task failed");
                        runs.push(AdapterRun {
                            source,
                            outcome: AdapterOutcome::Failed,
                            items: Vec::new(),
                            error: Some(join_err.to_string()),
                        });
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            set.abort_all();
            let reported: HashSet<Source> = runs.iter().map(|r| r.source).collect();
            for adapter in &self.adapters {
                let source = adapter.source();
                if !reported.contains(&source) {
                    tracing::warn!(%source, "overall deadline exceeded before adapter returned");
                    runs.push(AdapterRun { source, outcome: AdapterOutcome::TimedOut, items: Vec::new(), error: None });
                }
            }
        }

        runs
    }
}

/// Group merged items by `(source, id)`, keeping the higher-relevance
/// item on a collision, then sort descending by relevance, ascending by
/// age, and finally by arrival order (merge order across adapters —
/// meaningful because `sort_by` is stable and ties are broken on an
/// explicit arrival index rather than left to chance).
fn dedupe_and_rank(merged: Vec<ContextItem>) -> Vec<ContextItem> {
    struct Candidate {
        item: ContextItem,
        arrival: usize,
    }

    let mut best: HashMap<(Source, String), Candidate> = HashMap::new();
    for (arrival, item) in merged.into_iter().enumerate() {
        let key = (item.source, item.id.clone());
        match best.get(&key) {
            Some(existing) if existing.item.relevance >= item.relevance => {}
            _ => {
                best.insert(key, Candidate { item, arrival });
            }
        }
    }

    let mut ranked: Vec<Candidate> = best.into_values().collect();
    ranked.sort_by(|a, b| {
        b.item
            .relevance
            .partial_cmp(&a.item.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item.age_days.partial_cmp(&b.item.age_days).unwrap_or(Ordering::Equal))
            .then_with(|| a.arrival.cmp(&b.arrival))
    });
    ranked.into_iter().map(|c| c.item).collect()
}

/// Greedily admit items in ranked order. An item that would overflow the
/// remaining budget is skipped, not treated as a stopping point — a
/// later, smaller item can still fit. Items are never split.
fn pack(ranked: Vec<ContextItem>, budget_tokens: usize) -> (Vec<ContextItem>, usize) {
    let mut tokens_used = 0usize;
    let mut items = Vec::new();
    for item in ranked {
        let estimate = item.token_estimate();
        if tokens_used + estimate <= budget_tokens {
            tokens_used += estimate;
            items.push(item);
        }
    }
    (items, tokens_used)
}



#[cfg(test)]
mod prop_tests {
    use super::test_support::*;
    use super::*;
    use proptest::prelude::*;

    fn arb_item(source: Source) -> impl Strategy<Value = ContextItem> {
        ("[a-z0-9]{1,10}", 0.0f64..=1.0, 0.0f64..1000.0)
            .prop_map(move |(id, relevance, age_days)| item(source, &id, relevance, age_days))
    }

    proptest! {
        #[test]
        fn assembled_bundles_respect_budget_ranking_and_uniqueness(
            mem_items in prop::collection::vec(arb_item(Source::Mem), 0..8),
            kanban_items in prop::collection::vec(arb_item(Source::Kanban), 0..8),
            budget in 0usize..2000,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let bundle = rt.block_on(async {
                let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
                    Arc::new(FixedAdapter { source: Source::Mem, items: mem_items, delay: None }),
                    Arc::new(FixedAdapter { source: Source::Kanban, items: kanban_items, delay: None }),
                ];
                let assembler = ContextAssembler::new(adapters);
                let config = AssemblerConfig::default().with_budget_tokens(budget);
                assembler.assemble("anything", None, &config).await.unwrap()
            });

            let total_tokens: usize = bundle.items.iter().map(|i| i.token_estimate()).sum();
            prop_assert!(total_tokens <= bundle.budget_tokens);
            prop_assert_eq!(total_tokens, bundle.tokens_used);

            for pair in bundle.items.windows(2) {
                prop_assert!(pair[0].relevance >= pair[1].relevance);
            }

            for item in &bundle.items {
                prop_assert!(item.relevance.is_finite() && (0.0..=1.0).contains(&item.relevance));
                prop_assert!(item.age_days >= 0.0);
            }

            let mut seen = HashSet::new();
            for item in &bundle.items {
                prop_assert!(seen.insert(item.dedupe_key()));
            }
        }
    }
}
