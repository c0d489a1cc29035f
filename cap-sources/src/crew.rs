//! `crew` adapter: active project listing (no query, uses `List`).

use std::sync::Arc;

use cap_core::{DomainQueryConfig, Record, Source, Verb};
use cap_gateway::ControlPlaneClient;

use crate::generic::GenericAdapter;
use crate::projector::Projector;

pub struct CrewProjector;

impl Projector for CrewProjector {
    fn title(&self, record: &Record) -> String {
        let name = record.get_str("name").unwrap_or("project");
        let phase = record.get_str("current_phase").unwrap_or("unknown");
        format!("Project: {name} ({phase} phase)")
    }

    fn summary(&self, record: &Record) -> String {
        let phase = record.get_str("current_phase").unwrap_or("unknown");
        let complexity = record.get_f64("complexity_score").unwrap_or(0.0);
        format!("Phase: {phase}, Complexity: {complexity}/7")
    }

    fn boost(&self, record: &Record) -> f64 {
        let archived = record.is_archived();
        let phase = record.get_str("current_phase").unwrap_or("");
        if !archived && phase != "done" && phase != "review" {
            0.4
        } else {
            0.0
        }
    }
}

pub fn adapter(cpc: Arc<ControlPlaneClient>) -> GenericAdapter<CrewProjector> {
    let config = DomainQueryConfig::new("crew", "projects", Source::Crew)
        .with_verb(Verb::List)
        .with_query_key(None);
    GenericAdapter::new(config, CrewProjector, cpc)
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
    fn boost_excludes_archived_and_finished_phases() {
        let p = CrewProjector;
        assert_eq!(p.boost(&record(&[("current_phase", json!("design"))])), 0.4);
        assert_eq!(p.boost(&record(&[("current_phase", json!("done"))])), 0.0);
        assert_eq!(p.boost(&record(&[("current_phase", json!("review"))])), 0.0);
        assert_eq!(
            p.boost(&record(&[("current_phase", json!("design")), ("archived", json!(true))])),
            0.0
        );
    }

    #[test]
    fn title_and_summary_include_phase_and_complexity() {
        let p = CrewProjector;
        let r = record(&[
            ("name", json!("context-pipeline")),
            ("current_phase", json!("build")),
            ("complexity_score", json!(5)),
        ]);
        assert_eq!(p.title(&r), "Project: context-pipeline (build phase)");
        assert_eq!(p.summary(&r), "Phase: build, Complexity: 5/7");
    }
}
