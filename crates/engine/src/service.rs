//! Persistence-facing lead service.
//!
//! Drives the pure functions in [`crate::lifecycle`] through a
//! [`LeadStorage`] backend. Every mutation runs in a single storage
//! snapshot: the lead write and its activity record are committed together,
//! and any failure aborts the whole snapshot so neither is visible.

use leadbook_storage::{
    ActivityRecord, LeadFilter, LeadRecord, LeadStorage, NoteRecord, StorageError, UserRecord,
};
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::forecast::{self, ForecastSummary, StageSummary};
use crate::lifecycle;
use crate::query::{self, DashboardStats};
use crate::types::{Lead, LeadChange, LeadUpdate, NewLead, NoteChange};

/// Lead operations over a storage backend.
pub struct LeadService<S> {
    storage: S,
}

impl<S: LeadStorage> LeadService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Leads matching `filter`, newest first.
    pub async fn fetch_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, EngineError> {
        self.storage
            .list_leads(filter)
            .await?
            .into_iter()
            .map(Lead::try_from)
            .collect()
    }

    pub async fn get_lead(&self, id: &str) -> Result<Lead, EngineError> {
        Lead::try_from(self.storage.get_lead(id).await?)
    }

    /// Activity trail for a lead, newest first. Survives a hard delete.
    pub async fn activity(&self, id: &str) -> Result<Vec<ActivityRecord>, EngineError> {
        Ok(self.storage.list_activity(id).await?)
    }

    pub async fn notes(&self, id: &str) -> Result<Vec<NoteRecord>, EngineError> {
        self.get_lead(id).await?;
        Ok(self.storage.list_notes(id).await?)
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>, EngineError> {
        Ok(self.storage.list_users().await?)
    }

    pub async fn pipeline_board(&self) -> Result<Vec<StageSummary>, EngineError> {
        let leads = self.fetch_leads(&LeadFilter::active()).await?;
        Ok(forecast::pipeline_board(&leads))
    }

    pub async fn forecast_summary(&self) -> Result<ForecastSummary, EngineError> {
        let leads = self.fetch_leads(&LeadFilter::active()).await?;
        Ok(forecast::forecast_summary(&leads))
    }

    pub async fn dashboard_stats(&self, now: OffsetDateTime) -> Result<DashboardStats, EngineError> {
        let leads = self.fetch_leads(&LeadFilter::active()).await?;
        Ok(query::dashboard_stats(&leads, now))
    }

    // ── Mutations ─────────────────────────────────────────────────────────────

    pub async fn create_lead(&self, input: &NewLead, now: OffsetDateTime) -> Result<Lead, EngineError> {
        let change = lifecycle::create_lead(input, now)?;
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = self.write_created(&mut snapshot, &change).await;
        self.finish(snapshot, result, &change.lead.id, "created").await?;
        tracing::info!(lead_id = %change.lead.id, name = %change.lead.name, "lead created");
        Ok(change.lead)
    }

    pub async fn transition_status(
        &self,
        id: &str,
        new_status: &str,
        now: OffsetDateTime,
    ) -> Result<Lead, EngineError> {
        self.apply(id, "status_change", |lead| {
            lifecycle::transition_status(lead, new_status, now).map(Some)
        })
        .await
    }

    /// Returns the lead unchanged when it already sits in `target`.
    pub async fn move_card(
        &self,
        id: &str,
        target: &str,
        now: OffsetDateTime,
    ) -> Result<Lead, EngineError> {
        self.apply(id, "move", |lead| lifecycle::move_card(lead, target, now))
            .await
    }

    pub async fn update_lead_fields(
        &self,
        id: &str,
        update: &LeadUpdate,
        now: OffsetDateTime,
    ) -> Result<Lead, EngineError> {
        self.apply(id, "lead_updated", |lead| {
            lifecycle::update_lead_fields(lead, update, now).map(Some)
        })
        .await
    }

    pub async fn archive_lead(&self, id: &str, now: OffsetDateTime) -> Result<Lead, EngineError> {
        self.apply(id, "archived", |lead| Ok(Some(lifecycle::archive_lead(lead, now))))
            .await
    }

    pub async fn restore_lead(&self, id: &str) -> Result<Lead, EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = async {
            let lead = Lead::try_from(self.storage.get_lead_for_update(&mut snapshot, id).await?)?;
            let restored = lifecycle::restore_lead(&lead);
            self.storage
                .update_lead(&mut snapshot, LeadRecord::from(restored.clone()))
                .await?;
            Ok::<_, EngineError>(restored)
        }
        .await;
        let restored = self.finish(snapshot, result, id, "restore").await?;
        tracing::info!(lead_id = %id, "lead restored");
        Ok(restored)
    }

    /// Hard delete. The lead's activity trail and notes are kept.
    pub async fn delete_lead(&self, id: &str) -> Result<(), EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = self
            .storage
            .delete_lead(&mut snapshot, id)
            .await
            .map_err(EngineError::from);
        self.finish(snapshot, result, id, "delete").await?;
        tracing::info!(lead_id = %id, "lead deleted");
        Ok(())
    }

    pub async fn add_note(
        &self,
        id: &str,
        text: &str,
        now: OffsetDateTime,
    ) -> Result<NoteRecord, EngineError> {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = async {
            let lead = Lead::try_from(self.storage.get_lead_for_update(&mut snapshot, id).await?)?;
            let NoteChange { note, activity } = lifecycle::add_note(&lead, text, now)?;
            self.storage.insert_note(&mut snapshot, note.clone()).await?;
            self.storage.insert_activity(&mut snapshot, activity).await?;
            Ok::<_, EngineError>(note)
        }
        .await;
        let note = self.finish(snapshot, result, id, "note_added").await?;
        tracing::info!(lead_id = %id, note_id = %note.id, "note added");
        Ok(note)
    }

    // ── Snapshot plumbing ─────────────────────────────────────────────────────

    /// Read the lead, run `change`, write the result and its activity.
    ///
    /// `change` returning `Ok(None)` means there is nothing to write; the
    /// snapshot is aborted and the current lead is returned.
    async fn apply<F>(&self, id: &str, action: &str, change: F) -> Result<Lead, EngineError>
    where
        F: FnOnce(&Lead) -> Result<Option<LeadChange>, EngineError>,
    {
        let mut snapshot = self.storage.begin_snapshot().await?;
        let result = async {
            let lead = Lead::try_from(self.storage.get_lead_for_update(&mut snapshot, id).await?)?;
            match change(&lead)? {
                Some(change) => {
                    self.write_updated(&mut snapshot, &change).await?;
                    Ok::<_, EngineError>((change.lead, true))
                }
                None => Ok((lead, false)),
            }
        }
        .await;

        match result {
            Ok((lead, false)) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                tracing::debug!(lead_id = %id, action, "no change");
                Ok(lead)
            }
            other => {
                let (lead, _) = self.finish(snapshot, other, id, action).await?;
                tracing::info!(lead_id = %id, action, status = %lead.status, "lead changed");
                Ok(lead)
            }
        }
    }

    async fn write_updated(
        &self,
        snapshot: &mut S::Snapshot,
        change: &LeadChange,
    ) -> Result<(), StorageError> {
        self.storage
            .update_lead(snapshot, LeadRecord::from(change.lead.clone()))
            .await?;
        self.storage
            .insert_activity(snapshot, change.activity.clone())
            .await
    }

    async fn write_created(
        &self,
        snapshot: &mut S::Snapshot,
        change: &LeadChange,
    ) -> Result<(), EngineError> {
        self.storage
            .insert_lead(snapshot, LeadRecord::from(change.lead.clone()))
            .await?;
        self.storage
            .insert_activity(snapshot, change.activity.clone())
            .await?;
        Ok(())
    }

    /// Commit on success, abort on failure.
    async fn finish<T>(
        &self,
        snapshot: S::Snapshot,
        result: Result<T, EngineError>,
        id: &str,
        action: &str,
    ) -> Result<T, EngineError> {
        match result {
            Ok(value) => {
                self.storage.commit_snapshot(snapshot).await?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                tracing::warn!(lead_id = %id, action, error = %e, "aborted, nothing written");
                Err(e)
            }
        }
    }
}
