use std::future::Future;

use super::{make_lead, TestResult};
use crate::{LeadFilter, LeadStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "get_lead_nonexistent",
            get_lead_nonexistent(factory).await,
        ),
        TestResult::from_result(
            "error",
            "get_lead_for_update_nonexistent",
            get_lead_for_update_nonexistent(factory).await,
        ),
        TestResult::from_result(
            "error",
            "update_lead_nonexistent",
            update_lead_nonexistent(factory).await,
        ),
        TestResult::from_result(
            "error",
            "delete_lead_nonexistent",
            delete_lead_nonexistent(factory).await,
        ),
        TestResult::from_result(
            "error",
            "empty_store_queries_return_empty",
            empty_store_queries_return_empty(factory).await,
        ),
    ]
}

async fn get_lead_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_lead("lead-999").await {
        Err(StorageError::LeadNotFound { lead_id }) if lead_id == "lead-999" => Ok(()),
        other => Err(format!("expected LeadNotFound(lead-999), got {:?}", other)),
    }
}

async fn get_lead_for_update_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_lead_for_update(&mut snap, "lead-999").await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::LeadNotFound { .. }) => Ok(()),
        other => Err(format!("expected LeadNotFound, got {:?}", other)),
    }
}

async fn update_lead_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .update_lead(&mut snap, make_lead("lead-999", "2025-01-01T00:00:00Z"))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::LeadNotFound { .. }) => Ok(()),
        other => Err(format!("expected LeadNotFound, got {:?}", other)),
    }
}

async fn delete_lead_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.delete_lead(&mut snap, "lead-999").await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::LeadNotFound { .. }) => Ok(()),
        other => Err(format!("expected LeadNotFound, got {:?}", other)),
    }
}

async fn empty_store_queries_return_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let leads = s
        .list_leads(&LeadFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    let activity = s
        .list_activity("lead-999")
        .await
        .map_err(|e| e.to_string())?;
    let notes = s.list_notes("lead-999").await.map_err(|e| e.to_string())?;
    if !leads.is_empty() || !activity.is_empty() || !notes.is_empty() {
        return Err(format!(
            "expected empty results, got {} leads, {} activity, {} notes",
            leads.len(),
            activity.len(),
            notes.len()
        ));
    }
    Ok(())
}
