//! The control-plane client: a uniform `request(domain, source, verb, ...)`
//! surface over HTTP with transparent fallback to local storage.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use cap_core::{ControlPlaneResponse, HealthStatus, Verb};
use cap_storage::StorageManager;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::ControlPlaneConfig;
use crate::error::{ControlPlaneError, ControlPlaneErrorKind};
use crate::fallback::FallbackRegistry;

const RETRY_BACKOFF: std::time::Duration = std::time::Duration::from_millis(250);

/// Resource-oriented gateway client. Routes every read/write on the core
/// data sources through [`ControlPlaneClient::request`], with transparent
/// fallback to [`StorageManager`] when the gateway is unreachable.
pub struct ControlPlaneClient {
    http: reqwest::Client,
    config: ControlPlaneConfig,
    storage: Arc<StorageManager>,
    fallback: FallbackRegistry,
    health: RwLock<HealthStatus>,
}

impl ControlPlaneClient {
    pub fn new(config: ControlPlaneConfig, storage: Arc<StorageManager>) -> Result<Self, ControlPlaneError> {
        let http = reqwest::Client::builder()
            .timeout(config.default_deadline)
            .build()
            .map_err(|e| ControlPlaneError::new(ControlPlaneErrorKind::Network, e.to_string()))?;

        Ok(Self {
            http,
            config,
            storage,
            fallback: FallbackRegistry::default_registry(),
            health: RwLock::new(HealthStatus::Healthy),
        })
    }

    pub fn with_fallback_registry(mut self, fallback: FallbackRegistry) -> Self {
        self.fallback = fallback;
        self
    }

    pub async fn health(&self) -> HealthStatus {
        *self.health.read().await
    }

    /// `request(domain, source, verb, params, body) → ControlPlaneResponse`
    pub async fn request(
        &self,
        domain: &str,
        source: &str,
        verb: Verb,
        params: Option<BTreeMap<String, Value>>,
        body: Option<BTreeMap<String, Value>>,
    ) -> Result<ControlPlaneResponse, ControlPlaneError> {
        if self.health().await == HealthStatus::Degraded {
            return self.fallback_request(domain, source, verb, params.as_ref()).await;
        }

        match self.try_http(domain, source, verb, params.as_ref(), body.as_ref()).await {
            Ok(response) => {
                self.mark_healthy().await;
                Ok(response)
            }
            Err(err) if err.retriable => {
                tokio::time::sleep(RETRY_BACKOFF).await;
                match self.try_http(domain, source, verb, params.as_ref(), body.as_ref()).await {
                    Ok(response) => {
                        self.mark_healthy().await;
                        Ok(response)
                    }
                    Err(err) => self.handle_failure(err, domain, source, verb, params.as_ref()).await,
                }
            }
            Err(err) => self.handle_failure(err, domain, source, verb, params.as_ref()).await,
        }
    }

    async fn handle_failure(
        &self,
        err: ControlPlaneError,
        domain: &str,
        source: &str,
        verb: Verb,
        params: Option<&BTreeMap<String, Value>>,
    ) -> Result<ControlPlaneResponse, ControlPlaneError> {
        if err.is_fallback_eligible() {
            self.mark_degraded().await;
            if let Ok(response) = self.fallback_request(domain, source, verb, params).await {
                return Ok(response);
            }
        }
        Err(err)
    }

    async fn mark_healthy(&self) {
        let mut health = self.health.write().await;
        if *health != HealthStatus::Healthy {
            tracing::info!("control plane recovered, health flag reset to healthy");
        }
        *health = HealthStatus::Healthy;
    }

    async fn mark_degraded(&self) {
        let mut health = self.health.write().await;
        if *health != HealthStatus::Degraded {
            tracing::warn!("control plane unreachable, health flag flipped to degraded");
        }
        *health = HealthStatus::Degraded;
    }

    async fn try_http(
        &self,
        domain: &str,
        source: &str,
        verb: Verb,
        params: Option<&BTreeMap<String, Value>>,
        body: Option<&BTreeMap<String, Value>>,
    ) -> Result<ControlPlaneResponse, ControlPlaneError> {
        let id = params.and_then(|p| p.get("id")).and_then(Value::as_str);
        let mut path = format!("/api/v1/data/{domain}/{source}/{}", verb_segment(verb));
        if let Some(id) = id {
            path.push('/');
            path.push_str(id);
        }
        let url = format!("{}{}", self.config.base_url, path);

        let mut request = match verb.http_method() {
            "GET" => self.http.get(&url),
            "POST" => self.http.post(&url),
            "PATCH" => self.http.patch(&url),
            "DELETE" => self.http.delete(&url),
            other => {
                return Err(ControlPlaneError::new(
                    ControlPlaneErrorKind::BadRequest,
                    format!("unsupported method {other}"),
                ))
            }
        };

        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        if let Some(params) = params {
            let query: Vec<(String, String)> = params
                .iter()
                .filter(|(k, _)| k.as_str() != "id")
                .map(|(k, v)| (k.clone(), value_to_query_string(v)))
                .collect();
            request = request.query(&query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        let elapsed = start.elapsed();
        tracing::debug!(
            domain,
            source,
            verb = verb.http_method(),
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "control-plane request"
        );

        if status.is_success() {
            response
                .json::<ControlPlaneResponse>()
                .await
                .map_err(|e| ControlPlaneError::new(ControlPlaneErrorKind::Malformed, e.to_string()))
        } else {
            Err(ControlPlaneError::new(kind_for_status(status.as_u16()), format!("http status {status}")))
        }
    }

    async fn fallback_request(
        &self,
        domain: &str,
        source: &str,
        verb: Verb,
        params: Option<&BTreeMap<String, Value>>,
    ) -> Result<ControlPlaneResponse, ControlPlaneError> {
        let (sm_domain, sm_collection) = self.fallback.lookup(domain, source).ok_or_else(|| {
            ControlPlaneError::new(
                ControlPlaneErrorKind::Network,
                format!("no fallback registered for {domain}/{source}"),
            )
        })?;

        match verb {
            Verb::List | Verb::Search => {
                let records = self
                    .storage
                    .list(sm_domain, sm_collection, &BTreeMap::new())
                    .await
                    .map_err(|e| ControlPlaneError::new(ControlPlaneErrorKind::Network, e.to_string()))?;
                tracing::warn!(domain, source, "serving degraded response from local storage");
                Ok(ControlPlaneResponse::ok_list(records))
            }
            Verb::Get => {
                let id = params
                    .and_then(|p| p.get("id"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ControlPlaneError::new(ControlPlaneErrorKind::BadRequest, "get requires id"))?;
                match self.storage.get(sm_domain, sm_collection, id).await {
                    Ok(Some(record)) => Ok(ControlPlaneResponse::ok_one(record)),
                    Ok(None) => Err(ControlPlaneError::new(ControlPlaneErrorKind::NotFound, format!("{id} not found"))),
                    Err(e) => Err(ControlPlaneError::new(ControlPlaneErrorKind::Network, e.to_string())),
                }
            }
            _ => Err(ControlPlaneError::new(
                ControlPlaneErrorKind::BadRequest,
                "write verbs are not registered fallback-safe in this workspace",
            )),
        }
    }
}

fn verb_segment(verb: Verb) -> &'static str {
    match verb {
        Verb::List => "list",
        Verb::Get => "get",
        Verb::Search => "search",
        Verb::Create => "create",
        Verb::Update => "update",
        Verb::Delete => "delete",
    }
}

fn kind_for_status(status: u16) -> ControlPlaneErrorKind {
    match status {
        404 => ControlPlaneErrorKind::NotFound,
        409 => ControlPlaneErrorKind::Conflict,
        400 => ControlPlaneErrorKind::BadRequest,
        401 => ControlPlaneErrorKind::Unauthorized,
        500..=599 => ControlPlaneErrorKind::ServerError,
        _ => ControlPlaneErrorKind::ServerError,
    }
}

fn classify_transport_error(err: reqwest::Error) -> ControlPlaneError {
    if err.is_timeout() {
        ControlPlaneError::new(ControlPlaneErrorKind::Timeout, err.to_string())
    } else {
        ControlPlaneError::new(ControlPlaneErrorKind::Network, err.to_string())
    }
}

fn value_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cap_core::Record;
    use cap_storage::StorageManagerConfig;
    use serde_json::json;
    use std::collections::BTreeMap as Map;

    async fn seeded_storage() -> (tempfile::TempDir, Arc<StorageManager>) {
        let dir = tempfile::tempdir().unwrap();
        let sm = StorageManager::new(StorageManagerConfig::new(dir.path()));
        for id in ["m1", "m2", "m3"] {
            let mut fields = Map::new();
            fields.insert("id".to_string(), json!(id));
            fields.insert("title".to_string(), json!("a memory"));
            sm.create("memory", "memories", Record::new(fields)).await.unwrap();
        }
        (dir, Arc::new(sm))
    }

    #[tokio::test]
    async fn unreachable_gateway_falls_back_to_storage() {
        let (_dir, sm) = seeded_storage().await;
        let config = ControlPlaneConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            token: None,
            default_deadline: std::time::Duration::from_millis(500),
        };
        let client = ControlPlaneClient::new(config, sm).unwrap();

        let response = client
            .request("memory", "memories", Verb::List, None, None)
            .await
            .unwrap();
        assert!(response.ok);
        assert_eq!(response.records().len(), 3);
        assert_eq!(client.health().await, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn unregistered_domain_has_no_fallback() {
        let (_dir, sm) = seeded_storage().await;
        let config = ControlPlaneConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            token: None,
            default_deadline: std::time::Duration::from_millis(500),
        };
        let client = ControlPlaneClient::new(config, sm).unwrap();

        let err = client
            .request("unregistered", "widgets", Verb::List, None, None)
            .await
            .unwrap_err();
        assert!(err.is_fallback_eligible() || err.kind == ControlPlaneErrorKind::Network);
    }
}
