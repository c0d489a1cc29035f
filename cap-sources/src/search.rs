//! `search` adapter: code/knowledge graph search.

use std::sync::Arc;

use cap_core::{DomainQueryConfig, Record, Source};
use cap_gateway::ControlPlaneClient;

use crate::generic::GenericAdapter;
use crate::projector::Projector;

pub struct SearchProjector;

impl Projector for SearchProjector {
    fn title(&self, record: &Record) -> String {
        let name = record.get_str("name").unwrap_or("symbol");
        match record.get_str("file") {
            Some(file) => {
                let basename = file.rsplit('/').next().unwrap_or(file);
                let line = record.get_f64("line").map(|l| l as i64).unwrap_or(0);
                format!("{name} ({basename}:{line})")
            }
            None => name.to_string(),
        }
    }

    fn summary(&self, record: &Record) -> String {
        let kind = record.get_str("type").unwrap_or("symbol");
        let name = record.get_str("name").unwrap_or("symbol");
        format!("{kind}: {name}")
    }

    fn boost(&self, _record: &Record) -> f64 {
        0.0
    }
}

pub fn adapter(cpc: Arc<ControlPlaneClient>) -> GenericAdapter<SearchProjector> {
    GenericAdapter::new(DomainQueryConfig::new("knowledge", "graph", Source::Search), SearchProjector, cpc)
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
    fn title_includes_file_and_line_when_present() {
        let p = SearchProjector;
        let r = record(&[("name", json!("relevance")), ("file", json!("cap-sources/src/scorer.rs")), ("line", json!(12))]);
        assert_eq!(p.title(&r), "relevance (scorer.rs:12)");
    }

    #[test]
    fn title_falls_back_to_bare_name_without_file() {
        let p = SearchProjector;
        let r = record(&[("name", json!("relevance"))]);
        assert_eq!(p.title(&r), "relevance");
    }

    #[test]
    fn boost_is_always_zero() {
        assert_eq!(SearchProjector.boost(&record(&[])), 0.0);
    }
}
