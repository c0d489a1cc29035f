//! `Record`: the opaque, source-specific unit stored in a Storage Manager
//! collection and returned by the control plane.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A duck-typed collection element. Only `id` is required; `archived` and
/// `deleted` are recognized by name when present. Everything else is
/// source-specific and carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn is_archived(&self) -> bool {
        self.0
            .get("archived")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_deleted(&self) -> bool {
        self.0
            .get("deleted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Shallow-merge `diff` onto this record, as used by `update`.
    pub fn merge(&mut self, diff: &BTreeMap<String, Value>) {
        for (key, value) in diff {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }
}
