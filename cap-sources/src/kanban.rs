//! `kanban` adapter: task board search.

use std::sync::Arc;

use cap_core::{DomainQueryConfig, Record, Source};
use cap_gateway::ControlPlaneClient;

use crate::generic::GenericAdapter;
use crate::projector::{truncate_chars, Projector};

pub struct KanbanProjector;

impl Projector for KanbanProjector {
    fn title(&self, record: &Record) -> String {
        let swimlane = record.get_str("swimlane").unwrap_or("backlog");
        let name = record.get_str("name").unwrap_or("task");
        format!("[{swimlane}] {name}")
    }

    fn summary(&self, record: &Record) -> String {
        let text = record.get_str("description").or_else(|| record.get_str("name")).unwrap_or("");
        truncate_chars(text, 200)
    }

    fn boost(&self, record: &Record) -> f64 {
        match record.get_str("swimlane").unwrap_or("") {
            "doing" | "in_progress" => 0.2,
            _ => 0.0,
        }
    }
}

pub fn adapter(cpc: Arc<ControlPlaneClient>) -> GenericAdapter<KanbanProjector> {
    GenericAdapter::new(DomainQueryConfig::new("kanban", "tasks", Source::Kanban), KanbanProjector, cpc)
}
