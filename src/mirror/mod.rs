//! Local mirror of submitted documents.
//!
//! Never the system of record: the upstream owns every document. The mirror
//! keeps what this client submitted so it can be listed offline and later
//! exported into the canonical list.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::ServiceError;

pub mod file;
pub mod memory;

pub use file::FileMirror;
pub use memory::InMemoryMirror;

/// Issues submitted by the bulk flow, pending export.
pub const BULK_ISSUES: &str = "bulk_issues";
/// DCs submitted by the bulk flow, pending export.
pub const BULK_DCS: &str = "bulk_dcs";
/// Canonical list of known DCs.
pub const DCS: &str = "dcs";

pub const LISTS: [&str; 3] = [BULK_ISSUES, BULK_DCS, DCS];

const DOCUMENT_PREFIX: &str = "dc_";

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown mirror list: {0}")]
    UnknownList(String),
    #[error("Mirror operation failed: {0}")]
    OperationFailed(String),
}

impl From<MirrorError> for ServiceError {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Serialization(e) => ServiceError::SerializationError(e.to_string()),
            MirrorError::UnknownList(list) => {
                ServiceError::ValidationError(format!("Unknown mirror list: {}", list))
            }
            other => ServiceError::StorageError(other.to_string()),
        }
    }
}

/// Raw key/value storage behind [`LocalMirror`].
#[async_trait::async_trait]
pub trait MirrorBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, MirrorError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), MirrorError>;
    async fn delete(&self, key: &str) -> Result<(), MirrorError>;
    async fn exists(&self, key: &str) -> Result<bool, MirrorError>;
}

/// Typed access to the mirror lists.
///
/// Every list is a JSON array under its own key. Read-modify-write cycles are
/// serialized so concurrent appends do not lose records.
#[derive(Clone)]
pub struct LocalMirror {
    backend: Arc<dyn MirrorBackend>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalMirror {
    pub fn new(backend: Arc<dyn MirrorBackend>) -> Self {
        Self {
            backend,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryMirror::new()))
    }

    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileMirror::new(dir)))
    }

    /// Records of `list`, deserialized as `T`.
    pub async fn list<T: DeserializeOwned>(&self, list: &str) -> Result<Vec<T>, MirrorError> {
        let raw = self.raw_list(checked(list)?).await?;
        raw.into_iter()
            .map(|value| serde_json::from_value(value).map_err(MirrorError::from))
            .collect()
    }

    pub async fn append<T: Serialize>(&self, list: &str, record: &T) -> Result<(), MirrorError> {
        let list = checked(list)?;
        let value = serde_json::to_value(record)?;

        let _guard = self.write_lock.lock().await;
        let mut rows = self.raw_list(list).await?;
        rows.push(value);
        self.write_list(list, &rows).await?;

        debug!(list, rows = rows.len(), "mirror list appended");
        Ok(())
    }

    /// Merges `from` into `to`, skipping records already present verbatim,
    /// then empties `from`. Returns how many records were merged.
    pub async fn export_to(&self, from: &str, to: &str) -> Result<usize, MirrorError> {
        let (from, to) = (checked(from)?, checked(to)?);
        if from == to {
            return Err(MirrorError::OperationFailed(format!(
                "cannot export {} into itself",
                from
            )));
        }

        let _guard = self.write_lock.lock().await;
        let pending = self.raw_list(from).await?;
        let mut canonical = self.raw_list(to).await?;

        let mut merged = 0;
        for record in pending {
            if !canonical.contains(&record) {
                canonical.push(record);
                merged += 1;
            }
        }

        self.write_list(to, &canonical).await?;
        self.backend.delete(from).await?;

        info!(from, to, merged, "mirror list exported");
        Ok(merged)
    }

    pub async fn clear(&self, list: &str) -> Result<(), MirrorError> {
        let list = checked(list)?;
        let _guard = self.write_lock.lock().await;
        self.backend.delete(list).await?;
        info!(list, "mirror list cleared");
        Ok(())
    }

    /// Stores `document` under the ad-hoc `dc_<number>` key.
    pub async fn save_document<T: Serialize>(
        &self,
        dc_number: &str,
        document: &T,
    ) -> Result<(), MirrorError> {
        let body = serde_json::to_string(document)?;
        self.backend.set(&document_key(dc_number), &body).await
    }

    pub async fn document<T: DeserializeOwned>(
        &self,
        dc_number: &str,
    ) -> Result<Option<T>, MirrorError> {
        match self.backend.get(&document_key(dc_number)).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// DC numbers found in `dcs` and `bulk_dcs`, as stored.
    pub async fn known_dc_numbers(&self) -> Result<BTreeSet<String>, MirrorError> {
        let mut numbers = BTreeSet::new();
        for list in [DCS, BULK_DCS] {
            for row in self.raw_list(list).await? {
                if let Some(number) = row.get("dcNumber").and_then(Value::as_str) {
                    numbers.insert(number.to_string());
                }
            }
        }
        Ok(numbers)
    }

    /// Case-insensitive lookup against [`Self::known_dc_numbers`].
    pub async fn is_dc_number_known(&self, dc_number: &str) -> Result<bool, MirrorError> {
        let wanted = dc_number.trim().to_lowercase();
        Ok(self
            .known_dc_numbers()
            .await?
            .iter()
            .any(|known| known.trim().to_lowercase() == wanted))
    }

    async fn raw_list(&self, list: &str) -> Result<Vec<Value>, MirrorError> {
        match self.backend.get(list).await? {
            Some(body) if !body.trim().is_empty() => Ok(serde_json::from_str(&body)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn write_list(&self, list: &str, rows: &[Value]) -> Result<(), MirrorError> {
        let body = serde_json::to_string_pretty(rows)?;
        self.backend.set(list, &body).await
    }
}

fn checked(list: &str) -> Result<&str, MirrorError> {
    LISTS
        .iter()
        .find(|known| **known == list)
        .copied()
        .ok_or_else(|| MirrorError::UnknownList(list.to_string()))
}

fn document_key(dc_number: &str) -> String {
    format!("{}{}", DOCUMENT_PREFIX, dc_number.trim())
}
