use std::future::Future;

use super::{make_activity, make_lead, seed, TestResult};
use crate::{LeadFilter, LeadStorage, StorageError};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "snapshot",
            "insert_not_visible_before_commit",
            insert_not_visible_before_commit(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "insert_not_visible_after_abort",
            insert_not_visible_after_abort(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "snapshot_reads_its_own_writes",
            snapshot_reads_its_own_writes(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "update_not_visible_before_commit",
            update_not_visible_before_commit(factory).await,
        ),
        TestResult::from_result(
            "snapshot",
            "dropped_snapshot_discards_writes",
            dropped_snapshot_discards_writes(factory).await,
        ),
    ]
}

async fn insert_not_visible_before_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_lead(&mut snap, make_lead("lead-1", "2025-01-01T00:00:00Z"))
        .await
        .map_err(|e| e.to_string())?;

    let visible = s.get_lead("lead-1").await;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    match visible {
        Err(StorageError::LeadNotFound { .. }) => Ok(()),
        other => Err(format!(
            "uncommitted insert must be invisible, got {:?}",
            other
        )),
    }
}

async fn insert_not_visible_after_abort<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_lead(&mut snap, make_lead("lead-1", "2025-01-01T00:00:00Z"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_activity(
        &mut snap,
        make_activity("act-1", "lead-1", "created", "2025-01-01T00:00:00Z"),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let leads = s
        .list_leads(&LeadFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    let activity = s.list_activity("lead-1").await.map_err(|e| e.to_string())?;
    if !leads.is_empty() || !activity.is_empty() {
        return Err(format!(
            "aborted snapshot left {} leads and {} activity records",
            leads.len(),
            activity.len()
        ));
    }
    Ok(())
}

async fn snapshot_reads_its_own_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_lead(&mut snap, make_lead("lead-1", "2025-01-01T00:00:00Z"))
        .await
        .map_err(|e| e.to_string())?;
    let read = s.get_lead_for_update(&mut snap, "lead-1").await;
    let _ = s.abort_snapshot(snap).await;
    match read {
        Ok(rec) if rec.id == "lead-1" => Ok(()),
        other => Err(format!("expected own insert to be readable, got {:?}", other)),
    }
}

async fn update_not_visible_before_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut rec = s
        .get_lead_for_update(&mut snap, "lead-1")
        .await
        .map_err(|e| e.to_string())?;
    rec.status = "Contacted".to_string();
    s.update_lead(&mut snap, rec)
        .await
        .map_err(|e| e.to_string())?;

    let outside = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    if outside.status != "New" {
        return Err(format!(
            "uncommitted update leaked: status {}",
            outside.status
        ));
    }
    let after = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    if after.status != "Contacted" {
        return Err(format!("expected Contacted after commit, got {}", after.status));
    }
    Ok(())
}

async fn dropped_snapshot_discards_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.insert_lead(&mut snap, make_lead("lead-1", "2025-01-01T00:00:00Z"))
            .await
            .map_err(|e| e.to_string())?;
    }
    match s.get_lead("lead-1").await {
        Err(StorageError::LeadNotFound { .. }) => Ok(()),
        other => Err(format!("dropped snapshot leaked an insert: {:?}", other)),
    }
}
