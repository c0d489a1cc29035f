//! Local JSON collection store: one file per record, atomic writes, soft
//! delete, and advisory-locked JSONL append logs.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_core::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::StorageManagerConfig;
use crate::error::{StorageError, StorageResult};

static VALID_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_:-]{1,128}$").unwrap());

fn validate_id(id: &str) -> StorageResult<()> {
    if VALID_ID.is_match(id) {
        Ok(())
    } else {
        Err(StorageError::InvalidId { id: id.to_string() })
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A JSON collection store rooted at a configurable base directory. Each
/// collection is a subdirectory of `<base>/<domain>/<collection>/` holding
/// one `{id}.json` file per record, plus optional `<date>.jsonl` append
/// logs.
///
/// Concurrent writes to the same path are serialized through an in-process
/// per-path mutex map rather than OS-level advisory file locks — this
/// crate is consumed from a single process, so the simpler primitive
/// avoids the cross-platform footguns of file-descriptor locking.
pub struct StorageManager {
    config: StorageManagerConfig,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl StorageManager {
    pub fn new(config: StorageManagerConfig) -> Self {
        Self {
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    fn collection_dir(&self, domain: &str, collection: &str) -> PathBuf {
        self.config.base_dir.join(domain).join(collection)
    }

    fn record_path(&self, domain: &str, collection: &str, id: &str) -> PathBuf {
        self.collection_dir(domain, collection).join(format!("{id}.json"))
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_record(&self, path: &Path) -> StorageResult<Option<Record>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let fields: BTreeMap<String, Value> = serde_json::from_slice(&bytes)?;
                Ok(Some(Record::new(fields)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic write-to-temp-then-rename.
    async fn write_record(&self, path: &Path, record: &Record) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(record.fields())?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        tracing::debug!(path = %path.display(), "wrote record");
        Ok(())
    }

    /// `get(collection, id) → Record | null`
    pub async fn get(&self, domain: &str, collection: &str, id: &str) -> StorageResult<Option<Record>> {
        validate_id(id)?;
        let path = self.record_path(domain, collection, id);
        self.read_record(&path).await
    }

    /// `list(collection, **filter) → Record[]`. `filter` holds equality
    /// predicates on top-level fields; an empty filter matches everything.
    /// Soft-deleted records are excluded unless `include_deleted` is set
    /// on the manager's config.
    pub async fn list(
        &self,
        domain: &str,
        collection: &str,
        filter: &BTreeMap<String, Value>,
    ) -> StorageResult<Vec<Record>> {
        let dir = self.collection_dir(domain, collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(record) = self.read_record(&path).await? else {
                continue;
            };
            if !self.config.include_deleted && record.is_deleted() {
                continue;
            }
            if filter
                .iter()
                .all(|(key, value)| record.get(key) == Some(value))
            {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// `create(record)` — requires `record.id`; fails with `AlreadyExists`
    /// when a file for the id already exists.
    pub async fn create(&self, domain: &str, collection: &str, mut record: Record) -> StorageResult<Record> {
        let id = record
            .id()
            .ok_or_else(|| StorageError::InvalidId { id: String::new() })?
            .to_string();
        validate_id(&id)?;

        let path = self.record_path(domain, collection, &id);
        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        if self.read_record(&path).await?.is_some() {
            return Err(StorageError::AlreadyExists {
                collection: collection.to_string(),
                id,
            });
        }

        let timestamp = now_iso8601();
        record.set("created_at", Value::String(timestamp.clone()));
        record.set("updated_at", Value::String(timestamp));
        self.write_record(&path, &record).await?;
        tracing::debug!(collection, id = %record.id().unwrap_or_default(), "created record");
        Ok(record)
    }

    /// `update(collection, id, diff) → Record` — read-modify-write; fails
    /// with `NotFound` when absent; merges `diff` shallowly and stamps
    /// `updated_at`.
    pub async fn update(
        &self,
        domain: &str,
        collection: &str,
        id: &str,
        diff: &BTreeMap<String, Value>,
    ) -> StorageResult<Record> {
        validate_id(id)?;
        let path = self.record_path(domain, collection, id);
        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        let mut record = self.read_record(&path).await?.ok_or_else(|| StorageError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        record.merge(diff);
        record.set("updated_at", Value::String(now_iso8601()));
        self.write_record(&path, &record).await?;
        tracing::debug!(collection, id, "updated record");
        Ok(record)
    }

    /// `delete(collection, id) → bool` — soft delete: sets
    /// `deleted=true, deleted_at=<now>`.
    pub async fn delete(&self, domain: &str, collection: &str, id: &str) -> StorageResult<bool> {
        validate_id(id)?;
        let path = self.record_path(domain, collection, id);
        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        let Some(mut record) = self.read_record(&path).await? else {
            return Ok(false);
        };
        record.set("deleted", Value::Bool(true));
        record.set("deleted_at", Value::String(now_iso8601()));
        self.write_record(&path, &record).await?;
        tracing::debug!(collection, id, "soft-deleted record");
        Ok(true)
    }

    /// Append a JSON line to `<base>/<domain>/<collection>/<log_name>.jsonl`,
    /// serialized against the per-path lock so concurrent appends from
    /// within this process never interleave.
    pub async fn append_jsonl(
        &self,
        domain: &str,
        collection: &str,
        log_name: &str,
        value: &Value,
    ) -> StorageResult<()> {
        let path = self.collection_dir(domain, collection).join(format!("{log_name}.jsonl"));
        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn valid_ids_round_trip(id in "[A-Za-z0-9_:-]{1,64}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let found = rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let sm = StorageManager::new(StorageManagerConfig::new(dir.path()));
                let record = {
                    let mut fields = BTreeMap::new();
                    fields.insert("id".to_string(), Value::String(id.clone()));
                    Record::new(fields)
                };
                sm.create("d", "c", record).await.unwrap();
                sm.get("d", "c", &id).await.unwrap()
            });
            prop_assert!(found.is_some());
            let found = found.unwrap();
            prop_assert_eq!(found.id(), Some(id.as_str()));
        }

        #[test]
        fn ids_with_disallowed_characters_are_rejected(id in "[^A-Za-z0-9_:-]{1,20}") {
            prop_assume!(!id.is_empty());
            prop_assert!(super::validate_id(&id).is_err());
        }
    }
}
