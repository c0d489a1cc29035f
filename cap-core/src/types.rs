//! Core data model: `ContextItem`, `Source`, `Verb`, and the small
//! value types that describe how a source is queried and what comes back.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::record::Record;

/// Which adapter produced a `ContextItem`. Doubles as the item's `source`
/// field and the tag used in `sources_consulted` / `sources_succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Mem,
    Kanban,
    Crew,
    Jam,
    Search,
    Context7,
}

impl Source {
    /// The wire/display label, identical to the serde rename.
    pub fn label(self) -> &'static str {
        match self {
            Source::Mem => "mem",
            Source::Kanban => "kanban",
            Source::Crew => "crew",
            Source::Jam => "jam",
            Source::Search => "search",
            Source::Context7 => "context7",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A control-plane verb. `Search`/`List` are the only verbs a source
/// adapter issues; the rest exist for the control-plane client's general
/// `request` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    List,
    Get,
    Search,
    Create,
    Update,
    Delete,
}

impl Verb {
    /// HTTP method the control-plane client maps this verb onto.
    pub fn http_method(self) -> &'static str {
        match self {
            Verb::List | Verb::Get | Verb::Search => "GET",
            Verb::Create => "POST",
            Verb::Update => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

/// Declarative per-source query configuration. One instance per adapter;
/// the projection functions (`title_fn`/`summary_fn`/`boost_fn`) are not
/// stored here as closures — each adapter type implements them directly,
/// per the re-architecture note against dynamic dispatch by string.
#[derive(Debug, Clone)]
pub struct DomainQueryConfig {
    /// Control-plane domain, e.g. `"memory"`.
    pub domain: String,
    /// Collection name within the domain, e.g. `"memories"`.
    pub collection: String,
    /// Verb used to issue the read: `Search` when the source supports a
    /// keyword query, `List` when the adapter must filter client-side.
    pub verb: Verb,
    /// Query-parameter name carrying the keyword string, absent when
    /// `verb` is `List` and there is no server-side query support.
    pub query_key: Option<String>,
    /// Tag stamped on every `ContextItem` this adapter produces.
    pub label: Source,
    /// Hard cap on records considered per invocation.
    pub cap_per_domain: usize,
}

impl DomainQueryConfig {
    pub fn new(domain: impl Into<String>, collection: impl Into<String>, label: Source) -> Self {
        Self {
            domain: domain.into(),
            collection: collection.into(),
            verb: Verb::Search,
            query_key: Some("q".to_string()),
            label,
            cap_per_domain: 10,
        }
    }

    pub fn with_verb(mut self, verb: Verb) -> Self {
        self.verb = verb;
        self
    }

    pub fn with_query_key(mut self, query_key: Option<&str>) -> Self {
        self.query_key = query_key.map(str::to_string);
        self
    }

    pub fn with_cap_per_domain(mut self, cap: usize) -> Self {
        self.cap_per_domain = cap;
        self
    }
}

/// The universal unit of assembly produced by every source adapter.
///
/// Construction is validating: `title` must be non-empty and at most 200
/// characters, `relevance` must be finite and in `[0, 1]`, and `age_days`
/// must be finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub relevance: f64,
    pub age_days: f64,
    /// The upstream source sometimes emits a parallel `semantic_score`
    /// alongside `relevance`. Precedence between the two is not decided
    /// upstream (see the data-model discussion of this field) so both are
    /// exposed rather than one silently overwriting the other.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f64>,
    pub metadata: BTreeMap<String, Value>,
}

impl ContextItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        source: Source,
        title: impl Into<String>,
        summary: impl Into<String>,
        excerpt: Option<String>,
        relevance: f64,
        age_days: f64,
        metadata: BTreeMap<String, Value>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        if title.chars().count() > 200 {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                reason: "must be at most 200 characters".to_string(),
            });
        }
        if !relevance.is_finite() || !(0.0..=1.0).contains(&relevance) {
            return Err(ValidationError::InvalidValue {
                field: "relevance".to_string(),
                reason: format!("must be finite and in [0, 1], got {relevance}"),
            });
        }
        if !age_days.is_finite() || age_days < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "age_days".to_string(),
                reason: format!("must be finite and non-negative, got {age_days}"),
            });
        }

        Ok(Self {
            id: id.into(),
            source,
            title,
            summary: summary.into(),
            excerpt,
            relevance,
            age_days,
            semantic_score: None,
            metadata,
        })
    }

    pub fn with_semantic_score(mut self, score: f64) -> Self {
        self.semantic_score = Some(score);
        self
    }

    /// `⌊total_char_length / 4⌋` — the cost metric used for budget packing.
    pub fn token_estimate(&self) -> usize {
        let len = self.title.chars().count()
            + self.summary.chars().count()
            + self.excerpt.as_ref().map_or(0, |e| e.chars().count());
        len / 4
    }

    /// Dedupe key: `(source, id)`.
    pub fn dedupe_key(&self) -> (Source, &str) {
        (self.source, self.id.as_str())
    }
}

/// The data payload of a `ControlPlaneResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    List(Vec<Record>),
    One(Record),
    Null,
}

/// Structured error embedded in a control-plane response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Uniform envelope returned by the control plane (or synthesized by the
/// fallback path). Adapters consume `data`; the envelope itself is never
/// exposed past the control-plane client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneResponse {
    pub ok: bool,
    pub data: ResponseData,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ControlPlaneResponse {
    pub fn ok_list(records: Vec<Record>) -> Self {
        Self {
            ok: true,
            data: ResponseData::List(records),
            meta: BTreeMap::new(),
            error: None,
        }
    }

    pub fn ok_one(record: Record) -> Self {
        Self {
            ok: true,
            data: ResponseData::One(record),
            meta: BTreeMap::new(),
            error: None,
        }
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: ResponseData::Null,
            meta: BTreeMap::new(),
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Records carried by this response, regardless of whether the
    /// control plane answered with a list or a single record.
    pub fn records(self) -> Vec<Record> {
        match self.data {
            ResponseData::List(records) => records,
            ResponseData::One(record) => vec![record],
            ResponseData::Null => Vec::new(),
        }
    }
}

/// Cached external-library documentation lookup, keyed by
/// `sha256(library_id || ":" || query)` truncated to 16 hex chars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalDocEntry {
    pub library_id: String,
    pub query: String,
    pub cached_at: DateTime<Utc>,
    pub items: Vec<ContextItem>,
}

/// State machine for a single adapter task inside one `assemble()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterOutcome {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(relevance: f64, age_days: f64) -> Result<ContextItem, ValidationError> {
        ContextItem::new(
            "abc123",
            Source::Mem,
            "a title",
            "a summary",
            None,
            relevance,
            age_days,
            BTreeMap::new(),
        )
    }

    #[test]
    fn rejects_empty_title() {
        let err = ContextItem::new(
            "id1",
            Source::Mem,
            "",
            "summary",
            None,
            0.5,
            1.0,
            BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "title"));
    }

    #[test]
    fn rejects_overlong_title() {
        let title = "x".repeat(201);
        let err = ContextItem::new(
            "id1", Source::Mem, title, "s", None, 0.5, 1.0, BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field, .. } if field == "title"));
    }

    #[test]
    fn rejects_nan_and_out_of_range_relevance() {
        assert!(item(f64::NAN, 1.0).is_err());
        assert!(item(1.5, 1.0).is_err());
        assert!(item(-0.1, 1.0).is_err());
        assert!(item(0.0, 1.0).is_ok());
        assert!(item(1.0, 1.0).is_ok());
    }

    #[test]
    fn rejects_negative_or_nonfinite_age() {
        assert!(item(0.5, -1.0).is_err());
        assert!(item(0.5, f64::INFINITY).is_err());
        assert!(item(0.5, 0.0).is_ok());
    }

    #[test]
    fn token_estimate_matches_formula() {
        let it = ContextItem::new(
            "id1",
            Source::Mem,
            "1234",
            "12345678",
            Some("12".to_string()),
            0.5,
            0.0,
            BTreeMap::new(),
        )
        .unwrap();
        // (4 + 8 + 2) / 4 = 3
        assert_eq!(it.token_estimate(), 3);
    }

    #[test]
    fn dedupe_key_is_source_and_id() {
        let it = item(0.5, 1.0).unwrap();
        assert_eq!(it.dedupe_key(), (Source::Mem, "abc123"));
    }

    #[test]
    fn source_label_round_trips_through_display() {
        for s in [
            Source::Mem,
            Source::Kanban,
            Source::Crew,
            Source::Jam,
            Source::Search,
            Source::Context7,
        ] {
            assert_eq!(s.to_string(), s.label());
        }
    }

    #[test]
    fn verb_http_method_mapping() {
        assert_eq!(Verb::List.http_method(), "GET");
        assert_eq!(Verb::Get.http_method(), "GET");
        assert_eq!(Verb::Search.http_method(), "GET");
        assert_eq!(Verb::Create.http_method(), "POST");
        assert_eq!(Verb::Update.http_method(), "PATCH");
        assert_eq!(Verb::Delete.http_method(), "DELETE");
    }
}
