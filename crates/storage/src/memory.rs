//! In-memory `LeadStorage` backend with optional JSON file persistence.
//!
//! Committed state lives behind a `tokio::sync::RwLock`. A snapshot keeps a
//! private working copy (so it can read its own writes) plus a journal of the
//! mutations it made. On commit the journal is replayed onto a copy of the
//! current committed state, the result is flushed to disk when a data file is
//! configured, and only then swapped in. A snapshot that is dropped or
//! aborted never touches committed state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{ActivityRecord, LeadFilter, LeadRecord, NoteRecord, UserRecord};
use crate::traits::LeadStorage;

/// Everything the backend stores. Also the on-disk JSON layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub leads: Vec<LeadRecord>,
    #[serde(default)]
    pub activity: Vec<ActivityRecord>,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone)]
enum PendingOp {
    InsertLead(LeadRecord),
    UpdateLead(LeadRecord),
    DeleteLead(String),
    InsertActivity(ActivityRecord),
    InsertNote(NoteRecord),
}

impl PendingOp {
    fn apply(&self, data: &mut StoreData) -> Result<(), StorageError> {
        match self {
            PendingOp::InsertLead(record) => {
                if data.leads.iter().any(|l| l.id == record.id) {
                    return Err(StorageError::AlreadyExists {
                        lead_id: record.id.clone(),
                    });
                }
                data.leads.push(record.clone());
            }
            PendingOp::UpdateLead(record) => {
                let slot = data
                    .leads
                    .iter_mut()
                    .find(|l| l.id == record.id)
                    .ok_or_else(|| StorageError::LeadNotFound {
                        lead_id: record.id.clone(),
                    })?;
                *slot = record.clone();
            }
            PendingOp::DeleteLead(lead_id) => {
                let before = data.leads.len();
                data.leads.retain(|l| &l.id != lead_id);
                if data.leads.len() == before {
                    return Err(StorageError::LeadNotFound {
                        lead_id: lead_id.clone(),
                    });
                }
            }
            PendingOp::InsertActivity(record) => data.activity.push(record.clone()),
            PendingOp::InsertNote(record) => data.notes.push(record.clone()),
        }
        Ok(())
    }
}

/// Snapshot type for [`MemoryStorage`].
pub struct MemorySnapshot {
    staged: StoreData,
    journal: Vec<PendingOp>,
}

impl MemorySnapshot {
    fn record(&mut self, op: PendingOp) -> Result<(), StorageError> {
        op.apply(&mut self.staged)?;
        self.journal.push(op);
        Ok(())
    }
}

/// In-memory storage, optionally backed by a JSON data file.
pub struct MemoryStorage {
    state: RwLock<StoreData>,
    path: Option<PathBuf>,
}

impl MemoryStorage {
    /// An empty, purely in-memory store.
    pub fn new() -> Self {
        Self::with_data(StoreData::default())
    }

    /// A purely in-memory store seeded with `data`.
    pub fn with_data(data: StoreData) -> Self {
        Self {
            state: RwLock::new(data),
            path: None,
        }
    }

    /// Open a store backed by `path`. A missing file starts an empty store;
    /// the file is created on the first commit.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                StorageError::Backend(format!("invalid data file '{}': {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => {
                return Err(StorageError::Backend(format!(
                    "cannot read data file '{}': {}",
                    path.display(),
                    e
                )))
            }
        };
        tracing::debug!(path = %path.display(), leads = data.leads.len(), "opened data file");
        Ok(Self {
            state: RwLock::new(data),
            path: Some(path),
        })
    }

    /// A clone of the committed state.
    pub async fn export(&self) -> StoreData {
        self.state.read().await.clone()
    }

    async fn flush(&self, data: &StoreData) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let text = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Backend(format!("serialization error: {}", e)))?;
        tokio::fs::write(path, text).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to write data file");
            StorageError::Backend(format!("cannot write data file '{}': {}", path.display(), e))
        })
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(lead_id: &str) -> StorageError {
    StorageError::LeadNotFound {
        lead_id: lead_id.to_string(),
    }
}

/// Newest first by `created_at`; later insertions win ties.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> &str) -> Vec<T> {
    let mut indexed: Vec<(usize, &T)> = items.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        created_at(b)
            .cmp(created_at(a))
            .then_with(|| ib.cmp(ia))
    });
    indexed.into_iter().map(|(_, item)| item.clone()).collect()
}

#[async_trait]
impl LeadStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot {
            staged: self.state.read().await.clone(),
            journal: Vec::new(),
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        if snapshot.journal.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        let mut next = state.clone();
        for op in &snapshot.journal {
            op.apply(&mut next)?;
        }
        self.flush(&next).await?;
        *state = next;
        Ok(())
    }

    async fn abort_snapshot(&self, _snapshot: MemorySnapshot) -> Result<(), StorageError> {
        Ok(())
    }

    async fn insert_lead(
        &self,
        snapshot: &mut MemorySnapshot,
        record: LeadRecord,
    ) -> Result<(), StorageError> {
        snapshot.record(PendingOp::InsertLead(record))
    }

    async fn get_lead_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        lead_id: &str,
    ) -> Result<LeadRecord, StorageError> {
        snapshot
            .staged
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .cloned()
            .ok_or_else(|| not_found(lead_id))
    }

    async fn update_lead(
        &self,
        snapshot: &mut MemorySnapshot,
        record: LeadRecord,
    ) -> Result<(), StorageError> {
        snapshot.record(PendingOp::UpdateLead(record))
    }

    async fn delete_lead(
        &self,
        snapshot: &mut MemorySnapshot,
        lead_id: &str,
    ) -> Result<(), StorageError> {
        snapshot.record(PendingOp::DeleteLead(lead_id.to_string()))
    }

    async fn insert_activity(
        &self,
        snapshot: &mut MemorySnapshot,
        record: ActivityRecord,
    ) -> Result<(), StorageError> {
        snapshot.record(PendingOp::InsertActivity(record))
    }

    async fn insert_note(
        &self,
        snapshot: &mut MemorySnapshot,
        record: NoteRecord,
    ) -> Result<(), StorageError> {
        snapshot.record(PendingOp::InsertNote(record))
    }

    async fn get_lead(&self, lead_id: &str) -> Result<LeadRecord, StorageError> {
        self.state
            .read()
            .await
            .leads
            .iter()
            .find(|l| l.id == lead_id)
            .cloned()
            .ok_or_else(|| not_found(lead_id))
    }

    async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, StorageError> {
        let state = self.state.read().await;
        let matching: Vec<LeadRecord> = state
            .leads
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |l| l.created_at.as_str()))
    }

    async fn list_activity(&self, lead_id: &str) -> Result<Vec<ActivityRecord>, StorageError> {
        let state = self.state.read().await;
        let matching: Vec<ActivityRecord> = state
            .activity
            .iter()
            .filter(|a| a.lead_id == lead_id)
            .cloned()
            .collect();
        Ok(newest_first(&matching, |a| a.created_at.as_str()))
    }

    async fn list_notes(&self, lead_id: &str) -> Result<Vec<NoteRecord>, StorageError> {
        let state = self.state.read().await;
        let matching: Vec<NoteRecord> = state
            .notes
            .iter()
            .filter(|n| n.lead_id == lead_id)
            .cloned()
            .collect();
        Ok(newest_first(&matching, |n| n.created_at.as_str()))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.state.read().await.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    fn lead(id: &str, created_at: &str) -> LeadRecord {
        LeadRecord {
            id: id.to_string(),
            name: format!("Lead {}", id),
            email: format!("{}@example.com", id),
            phone: None,
            company: "Acme".to_string(),
            company_domain: None,
            service: "Consulting".to_string(),
            description: None,
            source: Some("manual".to_string()),
            created_at: created_at.to_string(),
            status: "New".to_string(),
            owner_id: None,
            archived: false,
            expected_value: None,
            probability: None,
            last_activity: None,
        }
    }

    #[tokio::test]
    async fn memory_storage_passes_conformance() {
        let report = run_conformance_suite(|| async { MemoryStorage::new() }).await;
        assert!(report.failed == 0, "{report}");
        assert!(report.total > 0);
    }

    #[tokio::test]
    async fn commit_flushes_to_data_file_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");

        let storage = MemoryStorage::open(&path).await.unwrap();
        let mut snap = storage.begin_snapshot().await.unwrap();
        storage
            .insert_lead(&mut snap, lead("l1", "2026-01-01T00:00:00Z"))
            .await
            .unwrap();
        storage.commit_snapshot(snap).await.unwrap();
        assert!(path.exists());

        let reopened = MemoryStorage::open(&path).await.unwrap();
        let got = reopened.get_lead("l1").await.unwrap();
        assert_eq!(got.email, "l1@example.com");
    }

    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MemoryStorage::open(dir.path().join("absent.json"))
            .await
            .unwrap();
        assert!(storage
            .list_leads(&LeadFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn open_corrupt_file_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        match MemoryStorage::open(&path).await {
            Err(StorageError::Backend(msg)) => assert!(msg.contains("invalid data file")),
            Err(other) => panic!("expected Backend, got {other}"),
            Ok(_) => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn concurrent_snapshots_both_apply() {
        let storage = MemoryStorage::with_data(StoreData {
            leads: vec![lead("a", "2026-01-01T00:00:00Z")],
            ..StoreData::default()
        });

        let mut first = storage.begin_snapshot().await.unwrap();
        let mut second = storage.begin_snapshot().await.unwrap();
        storage
            .insert_lead(&mut first, lead("b", "2026-01-02T00:00:00Z"))
            .await
            .unwrap();
        let mut edited = lead("a", "2026-01-01T00:00:00Z");
        edited.status = "Contacted".to_string();
        storage.update_lead(&mut second, edited).await.unwrap();

        storage.commit_snapshot(first).await.unwrap();
        storage.commit_snapshot(second).await.unwrap();

        let all = storage.list_leads(&LeadFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(storage.get_lead("a").await.unwrap().status, "Contacted");
    }

    #[tokio::test]
    async fn replay_conflict_leaves_state_untouched() {
        let storage = MemoryStorage::with_data(StoreData {
            leads: vec![lead("a", "2026-01-01T00:00:00Z")],
            ..StoreData::default()
        });

        let mut deleter = storage.begin_snapshot().await.unwrap();
        let mut editor = storage.begin_snapshot().await.unwrap();
        storage.delete_lead(&mut deleter, "a").await.unwrap();
        let mut edited = lead("a", "2026-01-01T00:00:00Z");
        edited.archived = true;
        storage.update_lead(&mut editor, edited.clone()).await.unwrap();
        storage
            .insert_activity(
                &mut editor,
                ActivityRecord {
                    id: "act-1".to_string(),
                    lead_id: "a".to_string(),
                    activity_type: "archived".to_string(),
                    description: "Lead archived".to_string(),
                    created_at: "2026-01-03T00:00:00Z".to_string(),
                },
            )
            .await
            .unwrap();

        storage.commit_snapshot(deleter).await.unwrap();
        let err = storage.commit_snapshot(editor).await.unwrap_err();
        assert!(matches!(err, StorageError::LeadNotFound { .. }));
        assert!(storage.list_activity("a").await.unwrap().is_empty());
    }
}
