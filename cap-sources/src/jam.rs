//! `jam` adapter: brainstorm session search.

use std::sync::Arc;

use cap_core::{DomainQueryConfig, Record, Source};
use cap_gateway::ControlPlaneClient;

use crate::generic::GenericAdapter;
use crate::projector::{truncate_chars, Projector};

pub struct JamProjector;

impl Projector for JamProjector {
    fn title(&self, record: &Record) -> String {
        let topic = record.get_str("topic").unwrap_or("session");
        format!("Brainstorm: {topic}")
    }

    fn summary(&self, record: &Record) -> String {
        let text = record
            .get_str("summary")
            .or_else(|| record.get("synthesis").and_then(|v| v.get("summary")).and_then(|v| v.as_str()))
            .unwrap_or("");
        truncate_chars(text, 200)
    }

    fn boost(&self, _record: &Record) -> f64 {
        0.0
    }
}

pub fn adapter(cpc: Arc<ControlPlaneClient>) -> GenericAdapter<JamProjector> {
    GenericAdapter::new(DomainQueryConfig::new("jam", "sessions", Source::Jam), JamProjector, cpc)
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
    fn boost_is_always_zero() {
        let p = JamProjector;
        assert_eq!(p.boost(&record(&[])), 0.0);
    }

    #[test]
    fn summary_falls_back_to_nested_synthesis_summary() {
        let p = JamProjector;
        let r = record(&[("synthesis", json!({"summary": "converged on mutex map"}))]);
        assert_eq!(p.summary(&r), "converged on mutex map");
    }

    #[test]
    fn title_wraps_topic() {
        let p = JamProjector;
        let r = record(&[("topic", json!("locking strategy"))]);
        assert_eq!(p.title(&r), "Brainstorm: locking strategy");
    }
}
