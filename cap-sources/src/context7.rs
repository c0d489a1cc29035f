//! `context7` adapter: external library documentation lookup.
//!
//! Unlike every other adapter, this one never talks to the control plane.
//! It extracts candidate library names from the prompt, resolves each to a
//! library id, and fetches docs through a pluggable [`DocsFetcher`] — with
//! the resolve+fetch pair memoized together in the external-docs cache,
//! keyed by `(library_id, full prompt)`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cap_core::{ContextItem, Source};
use cap_docs::ExternalDocsCache;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::adapter::SourceAdapter;

const MAX_LIBRARIES_PER_QUERY: usize = 3;
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(2000);

static LIBRARY_IDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("react", "/facebook/react"),
        ("nextjs", "/vercel/next.js"),
        ("next", "/vercel/next.js"),
        ("express", "/expressjs/express"),
        ("fastapi", "/tiangolo/fastapi"),
        ("django", "/django/django"),
        ("flask", "/pallets/flask"),
        ("vue", "/vuejs/core"),
        ("angular", "/angular/angular"),
        ("svelte", "/sveltejs/svelte"),
    ]
    .into_iter()
    .collect()
});

/// Resolve a human-typed library name to a context7-style library id. This
/// is a last-resort shim over a handful of well-known libraries; anything
/// outside the map simply produces no result.
pub fn resolve_library_id(name: &str) -> Option<&'static str> {
    let normalized = name.to_lowercase().replace(".js", "").replace('-', "");
    LIBRARY_IDS.get(normalized.as_str()).copied()
}

static MENTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(react)\b").unwrap(),
        Regex::new(r"\b(vue)\b").unwrap(),
        Regex::new(r"\b(angular)\b").unwrap(),
        Regex::new(r"\b(svelte)\b").unwrap(),
        Regex::new(r"\b(next(?:js)?)\b").unwrap(),
        Regex::new(r"\b(nuxt)\b").unwrap(),
    ]
});

static INSTALL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"npm install ([a-z0-9@/_.-]+)").unwrap(),
        Regex::new(r"pip install ([a-z0-9_.-]+)").unwrap(),
        Regex::new(r"yarn add ([a-z0-9@/_.-]+)").unwrap(),
    ]
});

static IMPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"from\s+(\w+)\s+import").unwrap(),
        Regex::new(r"^import\s+(\w+)").unwrap(),
        Regex::new(r#"require\(['"](\w+)['"]\)"#).unwrap(),
    ]
});

static IGNORED_NAMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["os", "sys", "json", "time", "re", "math", "from", "import"].into_iter().collect());

/// Pull up to five candidate library names out of free-form text, checking
/// mentions, install commands, and import statements in that order.
pub fn extract_library_names(prompt: &str) -> Vec<String> {
    let lower = prompt.to_lowercase();
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    let mut push = |name: &str, seen: &mut HashSet<String>, names: &mut Vec<String>| {
        let name = name.trim();
        if name.chars().count() < 2 {
            return;
        }
        if IGNORED_NAMES.contains(name.to_lowercase().as_str()) {
            return;
        }
        let key = name.to_lowercase();
        if seen.insert(key) {
            names.push(name.to_string());
        }
    };

    for pattern in MENTION_PATTERNS.iter() {
        for cap in pattern.captures_iter(&lower) {
            push(&cap[1], &mut seen, &mut names);
        }
    }
    for pattern in INSTALL_PATTERNS.iter() {
        for cap in pattern.captures_iter(&lower) {
            push(&cap[1], &mut seen, &mut names);
        }
    }
    for pattern in IMPORT_PATTERNS.iter() {
        for cap in pattern.captures_iter(prompt) {
            push(&cap[1], &mut seen, &mut names);
        }
    }

    names.truncate(5);
    names
}

/// Fetches documentation snippets for a resolved library. The default
/// implementation is a stub: there is no live documentation backend wired
/// up, so every lookup degrades to an empty result, same as the system
/// this was ported from when its MCP integration is unavailable.
#[async_trait]
pub trait DocsFetcher: Send + Sync {
    async fn fetch_docs(&self, library_id: &str, library_name: &str, query: &str) -> Vec<ContextItem>;
}

pub struct NullDocsFetcher;

#[async_trait]
impl DocsFetcher for NullDocsFetcher {
    async fn fetch_docs(&self, _library_id: &str, _library_name: &str, _query: &str) -> Vec<ContextItem> {
        Vec::new()
    }
}

pub struct Context7Adapter {
    cache: Arc<ExternalDocsCache>,
    fetcher: Arc<dyn DocsFetcher>,
    per_lookup_timeout: Duration,
}

impl Context7Adapter {
    pub fn new(cache: Arc<ExternalDocsCache>, fetcher: Arc<dyn DocsFetcher>) -> Self {
        Self { cache, fetcher, per_lookup_timeout: DEFAULT_LOOKUP_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_lookup_timeout = timeout;
        self
    }

    async fn resolve_and_fetch(&self, name: &str, prompt: &str) -> Vec<ContextItem> {
        let Some(library_id) = resolve_library_id(name) else {
            return Vec::new();
        };
        self.fetcher.fetch_docs(library_id, name, prompt).await
    }
}

#[async_trait]
impl SourceAdapter for Context7Adapter {
    fn source(&self) -> Source {
        Source::Context7
    }

    async fn query(&self, prompt: &str, _project: Option<&str>) -> Vec<ContextItem> {
        let names = extract_library_names(prompt);
        if names.is_empty() {
            return Vec::new();
        }

        let mut items = Vec::new();
        for name in names.into_iter().take(MAX_LIBRARIES_PER_QUERY) {
            let Some(library_id) = resolve_library_id(&name) else {
                continue;
            };

            if let Some(cached) = self.cache.get(library_id, prompt).await {
                items.extend(cached);
                continue;
            }

            let fetched = match tokio::time::timeout(self.per_lookup_timeout, self.resolve_and_fetch(&name, prompt)).await {
                Ok(items) => items,
                Err(_) => {
                    tracing::warn!(library = %name, "context7 lookup timed out");
                    Vec::new()
                }
            };

            if let Err(err) = self.cache.set(library_id, prompt, &fetched).await {
                tracing::warn!(library = %name, error = %err, "failed to cache context7 lookup");
            }
            items.extend(fetched);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_libraries_case_insensitively() {
        assert_eq!(resolve_library_id("React"), Some("/facebook/react"));
        assert_eq!(resolve_library_id("Next.js"), Some("/vercel/next.js"));
        assert_eq!(resolve_library_id("unknown-thing"), None);
    }

    #[test]
    fn extracts_mentions_install_commands_and_imports() {
        let names = extract_library_names("can you npm install react and show me how vue compares");
        assert!(names.iter().any(|n| n == "react"));
        assert!(names.iter().any(|n| n == "vue"));
    }

    #[test]
    fn drops_short_and_ignored_names() {
        let names = extract_library_names("import os and import re, then import json");
        assert!(names.is_empty());
    }

    #[test]
    fn caps_candidate_names_at_five() {
        let names = extract_library_names("react vue angular svelte next nuxt");
        assert!(names.len() <= 5);
    }

    #[tokio::test]
    async fn empty_prompt_yields_no_items() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(ExternalDocsCache::new(dir.path()).await.unwrap());
        let adapter = Context7Adapter::new(cache, Arc::new(NullDocsFetcher));
        assert!(adapter.query("nothing relevant here", None).await.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_library_name_short_circuits_without_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(ExternalDocsCache::new(dir.path()).await.unwrap());
        let adapter = Context7Adapter::new(cache, Arc::new(NullDocsFetcher));
        let items = adapter.query("how do I use react with npm install some-obscure-lib", None).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn repeated_lookup_uses_cache_on_second_call() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(ExternalDocsCache::new(dir.path()).await.unwrap());
        let adapter = Context7Adapter::new(cache.clone(), Arc::new(NullDocsFetcher));

        let prompt = "how do hooks work in react";
        let _ = adapter.query(prompt, None).await;
        let stats_after_first = cache.stats().await;
        let _ = adapter.query(prompt, None).await;
        let stats_after_second = cache.stats().await;

        assert!(stats_after_second.hits > stats_after_first.hits);
    }
}
