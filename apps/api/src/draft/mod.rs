//! Draft persistence — local-first with a best-effort remote mirror.
//!
//! Exactly one in-progress draft is authoritative at a time. `save` writes
//! locally first and must succeed (or surface a storage error); the remote
//! mirror is fire-and-forget and can never invalidate the local save. `load`
//! prefers the local copy and only consults the remote store on a cold start,
//! seeding the local copy from the newest remote draft when one exists.
//!
//! Schema migration happens in `model::normalize` on load — the store keys
//! are stable and versionless.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::normalize::normalize;
use crate::model::CVDocument;

/// The persisted draft envelope. Key names are part of the storage contract
/// and never change — do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub cv_builder_data: Value,
    pub cv_builder_data_timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Local storage is full")]
    StorageFull,

    #[error("Local storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Draft serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Synchronous local storage seam. Tests substitute `MemoryDraftStore` for
/// the on-disk implementation.
pub trait DraftStorage: Send + Sync {
    fn write(&self, record: &DraftRecord) -> Result<(), StorageError>;
    fn read(&self) -> Result<Option<DraftRecord>, StorageError>;
}

/// File-backed local store — the `localStorage` equivalent.
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("cv_builder_draft.json"),
        }
    }
}

impl DraftStorage for FileDraftStore {
    fn write(&self, record: &DraftRecord) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(map_io)?;
        }
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&self.path, json).map_err(map_io)
    }

    fn read(&self) -> Result<Option<DraftRecord>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // An unreadable envelope is treated as no draft rather than a
                // hard failure; the builder starts clean.
                warn!("Discarding unreadable local draft: {e}");
                Ok(None)
            }
        }
    }
}

fn map_io(e: std::io::Error) -> StorageError {
    // ENOSPC surfaces as its own variant so the caller can tell the user.
    if e.raw_os_error() == Some(28) {
        StorageError::StorageFull
    } else {
        StorageError::Io(e)
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryDraftStore {
    inner: Mutex<Option<DraftRecord>>,
}

impl DraftStorage for MemoryDraftStore {
    fn write(&self, record: &DraftRecord) -> Result<(), StorageError> {
        *self.inner.lock().expect("draft store lock poisoned") = Some(record.clone());
        Ok(())
    }

    fn read(&self) -> Result<Option<DraftRecord>, StorageError> {
        Ok(self.inner.lock().expect("draft store lock poisoned").clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDraft {
    pub id: String,
    pub last_modified: DateTime<Utc>,
    pub cv_data: Value,
}

#[derive(Debug, Deserialize)]
struct SaveDraftResponse {
    id: String,
}

/// Remote draft API seam. Failures here are always non-fatal.
#[async_trait]
pub trait RemoteDraftApi: Send + Sync {
    async fn save_draft(&self, cv_data: &Value) -> anyhow::Result<String>;
    async fn list_drafts(&self) -> anyhow::Result<Vec<RemoteDraft>>;
}

/// HTTP implementation of the remote draft API.
pub struct HttpDraftApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDraftApi {
    pub fn new(base_url: String, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
        }
    }
}

#[async_trait]
impl RemoteDraftApi for HttpDraftApi {
    async fn save_draft(&self, cv_data: &Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/save-draft", self.base_url))
            .json(&serde_json::json!({ "cvData": cv_data }))
            .send()
            .await?
            .error_for_status()?;
        let body: SaveDraftResponse = response.json().await?;
        Ok(body.id)
    }

    async fn list_drafts(&self) -> anyhow::Result<Vec<RemoteDraft>> {
        let response = self
            .client
            .get(format!("{}/drafts", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftHandle {
    pub saved_at: DateTime<Utc>,
}

/// The layered store handed to the session layer.
#[derive(Clone)]
pub struct DraftStore {
    local: Arc<dyn DraftStorage>,
    remote: Option<Arc<dyn RemoteDraftApi>>,
}

impl DraftStore {
    pub fn new(local: Arc<dyn DraftStorage>, remote: Option<Arc<dyn RemoteDraftApi>>) -> Self {
        Self { local, remote }
    }

    /// Persists a snapshot. The local write is synchronous and authoritative;
    /// the remote mirror runs in the background and its failure is logged,
    /// never surfaced.
    pub fn save(&self, doc: &CVDocument) -> Result<DraftHandle, StorageError> {
        let record = DraftRecord {
            cv_builder_data: serde_json::to_value(doc)?,
            cv_builder_data_timestamp: Utc::now(),
        };
        self.local.write(&record)?;

        if let Some(remote) = &self.remote {
            let remote = Arc::clone(remote);
            let cv_data = record.cv_builder_data.clone();
            tokio::spawn(async move {
                match remote.save_draft(&cv_data).await {
                    Ok(id) => info!("Mirrored draft to remote store (id {id})"),
                    Err(e) => warn!("Remote draft mirror failed, local save stands: {e}"),
                }
            });
        }

        Ok(DraftHandle {
            saved_at: record.cv_builder_data_timestamp,
        })
    }

    /// Loads the authoritative draft: local copy first, remote only when no
    /// local copy exists. A remote hit seeds the local store.
    pub async fn load(&self) -> Result<Option<CVDocument>, StorageError> {
        if let Some(record) = self.local.read()? {
            return Ok(Some(normalize(&record.cv_builder_data)));
        }

        let Some(remote) = &self.remote else {
            return Ok(None);
        };
        let mut drafts = match remote.list_drafts().await {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!("Remote draft lookup failed, starting clean: {e}");
                return Ok(None);
            }
        };
        drafts.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        let Some(newest) = drafts.into_iter().next() else {
            return Ok(None);
        };

        let doc = normalize(&newest.cv_data);
        let record = DraftRecord {
            cv_builder_data: serde_json::to_value(&doc)?,
            cv_builder_data_timestamp: newest.last_modified,
        };
        self.local.write(&record)?;
        info!("Seeded local draft from remote draft {}", newest.id);
        Ok(Some(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ada_doc() -> CVDocument {
        let mut doc = CVDocument::default();
        doc.personal_info.first_name = "Ada".to_string();
        doc.personal_info.last_name = "Lovelace".to_string();
        doc.personal_info.email = "ada@x.com".to_string();
        doc
    }

    struct FailingRemote {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteDraftApi for FailingRemote {
        async fn save_draft(&self, _cv_data: &Value) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("remote is down")
        }

        async fn list_drafts(&self) -> anyhow::Result<Vec<RemoteDraft>> {
            anyhow::bail!("remote is down")
        }
    }

    struct StaticRemote {
        drafts: Vec<RemoteDraft>,
    }

    #[async_trait]
    impl RemoteDraftApi for StaticRemote {
        async fn save_draft(&self, _cv_data: &Value) -> anyhow::Result<String> {
            Ok("remote-1".to_string())
        }

        async fn list_drafts(&self) -> anyhow::Result<Vec<RemoteDraft>> {
            Ok(self.drafts.clone())
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = DraftStore::new(Arc::new(MemoryDraftStore::default()), None);
        let doc = ada_doc();
        store.save(&doc).unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_remote_failure_never_invalidates_local_save() {
        let store = DraftStore::new(
            Arc::new(MemoryDraftStore::default()),
            Some(Arc::new(FailingRemote {
                calls: AtomicUsize::new(0),
            })),
        );
        let handle = store.save(&ada_doc());
        assert!(handle.is_ok());
        let loaded = store.load().await.unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn test_cold_start_seeds_from_newest_remote_draft() {
        let older = RemoteDraft {
            id: "old".to_string(),
            last_modified: "2025-01-01T00:00:00Z".parse().unwrap(),
            cv_data: serde_json::json!({ "personalInfo": { "firstName": "Old" } }),
        };
        let newer = RemoteDraft {
            id: "new".to_string(),
            last_modified: "2025-06-01T00:00:00Z".parse().unwrap(),
            cv_data: serde_json::json!({ "personalInfo": { "firstName": "New" } }),
        };
        let local = Arc::new(MemoryDraftStore::default());
        let store = DraftStore::new(
            local.clone(),
            Some(Arc::new(StaticRemote {
                drafts: vec![older, newer],
            })),
        );

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.personal_info.first_name, "New");
        // the remote hit seeded the local copy
        assert!(local.read().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_local_copy_wins_over_remote() {
        let local = Arc::new(MemoryDraftStore::default());
        let remote_doc = serde_json::json!({ "personalInfo": { "firstName": "Remote" } });
        let store = DraftStore::new(
            local.clone(),
            Some(Arc::new(StaticRemote {
                drafts: vec![RemoteDraft {
                    id: "r".to_string(),
                    last_modified: Utc::now(),
                    cv_data: remote_doc,
                }],
            })),
        );

        let mut doc = ada_doc();
        doc.personal_info.first_name = "Local".to_string();
        store.save(&doc).unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.personal_info.first_name, "Local");
    }

    #[tokio::test]
    async fn test_remote_down_on_cold_start_is_clean_start() {
        let store = DraftStore::new(
            Arc::new(MemoryDraftStore::default()),
            Some(Arc::new(FailingRemote {
                calls: AtomicUsize::new(0),
            })),
        );
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(Arc::new(FileDraftStore::new(dir.path())), None);
        store.save(&ada_doc()).unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.personal_info.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path());
        assert!(store.read().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::new(dir.path());
        std::fs::write(dir.path().join("cv_builder_draft.json"), b"not json").unwrap();
        assert!(store.read().unwrap().is_none());
    }
}
