//! Fetch → filter → cap → project → score pipeline shared by every
//! control-plane-backed adapter (everything but `context7`).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use cap_core::{ContextItem, DomainQueryConfig, Record, Source};
use cap_gateway::ControlPlaneClient;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::adapter::SourceAdapter;
use crate::keywords::{extract_keywords, keyword_score};
use crate::projector::Projector;
use crate::scorer::relevance;

pub struct GenericAdapter<P: Projector> {
    config: DomainQueryConfig,
    projector: P,
    cpc: Arc<ControlPlaneClient>,
}

impl<P: Projector> GenericAdapter<P> {
    pub fn new(config: DomainQueryConfig, projector: P, cpc: Arc<ControlPlaneClient>) -> Self {
        Self { config, projector, cpc }
    }
}

#[async_trait]
impl<P: Projector> SourceAdapter for GenericAdapter<P> {
    fn source(&self) -> Source {
        self.config.label
    }

    async fn query(&self, prompt: &str, project: Option<&str>) -> Vec<ContextItem> {
        let keywords = extract_keywords(prompt);
        if keywords.is_empty() {
            return Vec::new();
        }

        tracing::debug!(
            source = %self.source(),
            prompt_len = prompt.len(),
            project = ?project,
            "querying source adapter"
        );

        let mut params = BTreeMap::new();
        if let Some(query_key) = &self.config.query_key {
            params.insert(query_key.clone(), Value::String(keywords.join(" ")));
        }
        if let Some(project) = project {
            params.insert("project".to_string(), Value::String(project.to_string()));
        }
        let params = if params.is_empty() { None } else { Some(params) };

        let response = match self
            .cpc
            .request(&self.config.domain, &self.config.collection, self.config.verb, params, None)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(source = %self.source(), error = %err, "adapter query failed, degrading to empty");
                return Vec::new();
            }
        };

        let prompt_lower = prompt.to_lowercase();
        let now = Utc::now();

        response
            .records()
            .into_iter()
            .filter(|record| !record.is_archived() && !record.is_deleted())
            .take(self.config.cap_per_domain)
            .filter_map(|record| self.project(&record, &prompt_lower, now))
            .collect()
    }
}

impl<P: Projector> GenericAdapter<P> {
    fn project(&self, record: &Record, prompt_lower: &str, now: DateTime<Utc>) -> Option<ContextItem> {
        let title = self.projector.title(record);
        let summary = self.projector.summary(record);
        let kw_score = keyword_score(prompt_lower, &format!("{title} {summary}"));
        let boost = self.projector.boost(record);
        let age_days = age_days_of(record, now);
        let score = relevance(kw_score, boost, age_days);

        let id = record.id().unwrap_or_default().to_string();
        let mut metadata = BTreeMap::new();
        metadata.insert("domain".to_string(), Value::String(self.config.domain.clone()));
        metadata.insert("semantic_score".to_string(), Value::from(score));

        match ContextItem::new(id, self.source(), title, summary.clone(), Some(summary), score, age_days, metadata) {
            Ok(item) => Some(item.with_semantic_score(score)),
            Err(err) => {
                tracing::warn!(source = %self.source(), error = ?err, "dropping record that failed validation");
                None
            }
        }
    }
}

/// Days since `created_at`/`created`, matching the original's tolerance
/// for either field name and silent fallback to `0.0` on parse failure.
fn age_days_of(record: &Record, now: DateTime<Utc>) -> f64 {
    let created = record.get_str("created_at").or_else(|| record.get_str("created"));
    let Some(created) = created else {
        return 0.0;
    };
    match DateTime::parse_from_rfc3339(created) {
        Ok(dt) => ((now - dt.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0)
            .floor()
            .max(0.0),
        Err(_) => 0.0,
    }
}
