//! `mem` adapter: long-term memory search.

use std::sync::Arc;

use cap_core::{DomainQueryConfig, Record, Source};
use cap_gateway::ControlPlaneClient;

use crate::generic::GenericAdapter;
use crate::projector::{truncate_chars, Projector};

pub struct MemProjector;

impl Projector for MemProjector {
    fn title(&self, record: &Record) -> String {
        record
            .get_str("title")
            .or_else(|| record.get_str("type"))
            .unwrap_or("memory")
            .to_string()
    }

    fn summary(&self, record: &Record) -> String {
        let text = record.get_str("summary").or_else(|| record.get_str("content")).unwrap_or("");
        truncate_chars(text, 200)
    }

    fn boost(&self, record: &Record) -> f64 {
        match record.get_str("type").unwrap_or("") {
            "decision" | "preference" | "working" => 0.3,
            "procedural" => 0.1,
            _ => 0.0,
        }
    }
}

pub fn adapter(cpc: Arc<ControlPlaneClient>) -> GenericAdapter<MemProjector> {
    GenericAdapter::new(DomainQueryConfig::new("memory", "memories", Source::Mem), MemProjector, cpc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(fields: &[(&str, serde_json::Value)]) -> Record {
        let mut map = BTreeMap::new();
        for (k, v) in fields {
            map.insert(k.to_string(), v.clone());
        }
        Record::new(map)
    }

    #[test]
    fn boost_table_matches_documented_values() {
        let p = MemProjector;
        assert_eq!(p.boost(&record(&[("type", json!("decision"))])), 0.3);
        assert_eq!(p.boost(&record(&[("type", json!("preference"))])), 0.3);
        assert_eq!(p.boost(&record(&[("type", json!("working"))])), 0.3);
        assert_eq!(p.boost(&record(&[("type", json!("procedural"))])), 0.1);
        assert_eq!(p.boost(&record(&[("type", json!("episodic"))])), 0.0);
        assert_eq!(p.boost(&record(&[])), 0.0);
    }

    #[test]
    fn title_falls_back_to_type_then_default() {
        let p = MemProjector;
        assert_eq!(p.title(&record(&[("title", json!("Retries bounded at 3"))])), "Retries bounded at 3");
        assert_eq!(p.title(&record(&[("type", json!("decision"))])), "decision");
        assert_eq!(p.title(&record(&[])), "memory");
    }

    #[test]
    fn summary_truncates_to_200_chars() {
        let p = MemProjector;
        let long = "x".repeat(250);
        let summary = p.summary(&record(&[("content", json!(long))]));
        assert_eq!(summary.chars().count(), 200);
    }
}
