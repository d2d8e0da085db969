use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{ActivityRecord, LeadFilter, LeadRecord, NoteRecord, UserRecord};

/// The storage trait for Leadbook backends.
///
/// A `LeadStorage` implementation holds leads, their activity trail, notes,
/// and the user list.
///
/// ## Snapshot Semantics
///
/// All mutating operations take `&mut Self::Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()` -- start a transaction, returns a `Snapshot`
/// 2. Call mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)` -- commit and consume the transaction
///    OR `abort_snapshot(snapshot)` -- roll back and consume the transaction
///
/// If a `Snapshot` is dropped without committing, its mutations MUST be
/// discarded. A lead update and the activity record describing it are
/// written in the same snapshot, so neither is visible without the other.
///
/// ## Concurrency
///
/// There is no version check on leads: two snapshots updating the same lead
/// both commit, and the later commit wins.
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait LeadStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Lead operations (within snapshot) ─────────────────────────────────────

    /// Insert a new lead.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the id is taken.
    async fn insert_lead(
        &self,
        snapshot: &mut Self::Snapshot,
        record: LeadRecord,
    ) -> Result<(), StorageError>;

    /// Read a lead as seen by the snapshot, including its own uncommitted writes.
    ///
    /// Returns `Err(StorageError::LeadNotFound)` if the lead does not exist.
    async fn get_lead_for_update(
        &self,
        snapshot: &mut Self::Snapshot,
        lead_id: &str,
    ) -> Result<LeadRecord, StorageError>;

    /// Replace a stored lead with `record` (matched by `record.id`).
    ///
    /// Returns `Err(StorageError::LeadNotFound)` if the lead does not exist.
    async fn update_lead(
        &self,
        snapshot: &mut Self::Snapshot,
        record: LeadRecord,
    ) -> Result<(), StorageError>;

    /// Hard-delete a lead. Activity records and notes are kept.
    ///
    /// Returns `Err(StorageError::LeadNotFound)` if the lead does not exist.
    async fn delete_lead(
        &self,
        snapshot: &mut Self::Snapshot,
        lead_id: &str,
    ) -> Result<(), StorageError>;

    // ── Recording operations (within snapshot) ────────────────────────────────

    /// Append an activity record.
    async fn insert_activity(
        &self,
        snapshot: &mut Self::Snapshot,
        record: ActivityRecord,
    ) -> Result<(), StorageError>;

    /// Append a note.
    async fn insert_note(
        &self,
        snapshot: &mut Self::Snapshot,
        record: NoteRecord,
    ) -> Result<(), StorageError>;

    // ── Query operations (outside snapshot, committed state only) ─────────────

    /// Read a committed lead.
    ///
    /// Returns `Err(StorageError::LeadNotFound)` if the lead does not exist.
    async fn get_lead(&self, lead_id: &str) -> Result<LeadRecord, StorageError>;

    /// List leads matching `filter`, most recently created first.
    async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, StorageError>;

    /// Activity for a lead, newest first.
    async fn list_activity(&self, lead_id: &str) -> Result<Vec<ActivityRecord>, StorageError>;

    /// Notes for a lead, newest first.
    async fn list_notes(&self, lead_id: &str) -> Result<Vec<NoteRecord>, StorageError>;

    /// All users available for owner assignment.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError>;
}
