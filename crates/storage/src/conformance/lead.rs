use std::future::Future;

use super::{make_lead, seed, TestResult};
use crate::{LeadFilter, LeadStorage, StorageError};

pub(super) async fn run_lead_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "lead",
            "insert_lead_visible_after_commit",
            insert_lead_visible_after_commit(factory).await,
        ),
        TestResult::from_result(
            "lead",
            "insert_lead_preserves_fields",
            insert_lead_preserves_fields(factory).await,
        ),
        TestResult::from_result(
            "lead",
            "duplicate_insert_returns_already_exists",
            duplicate_insert_returns_already_exists(factory).await,
        ),
        TestResult::from_result(
            "lead",
            "update_lead_replaces_record",
            update_lead_replaces_record(factory).await,
        ),
        TestResult::from_result(
            "lead",
            "delete_lead_removes_record",
            delete_lead_removes_record(factory).await,
        ),
        TestResult::from_result(
            "lead",
            "delete_lead_keeps_activity",
            delete_lead_keeps_activity(factory).await,
        ),
    ]
}

async fn insert_lead_visible_after_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    if rec.id != "lead-1" {
        return Err(format!("expected id lead-1, got {}", rec.id));
    }
    Ok(())
}

async fn insert_lead_preserves_fields<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut lead = make_lead("lead-1", "2025-01-01T00:00:00Z");
    lead.status = "Negotiation".to_string();
    lead.expected_value = Some(rust_decimal::Decimal::new(125050, 2));
    lead.probability = Some(40);
    lead.owner_id = Some("user-7".to_string());
    lead.phone = Some("+1 555 0100".to_string());
    seed(&s, vec![lead.clone()]).await?;

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    if rec != lead {
        return Err(format!("record changed on round trip: {:?}", rec));
    }
    Ok(())
}

async fn duplicate_insert_returns_already_exists<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .insert_lead(&mut snap, make_lead("lead-1", "2025-02-01T00:00:00Z"))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists { lead_id }) if lead_id == "lead-1" => Ok(()),
        other => Err(format!("expected AlreadyExists(lead-1), got {:?}", other)),
    }
}

async fn update_lead_replaces_record<S, F, Fut>(factory: &F) -> Result<(), String>
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
    rec.status = "Won".to_string();
    rec.probability = Some(100);
    rec.last_activity = Some("2025-01-02T00:00:00Z".to_string());
    s.update_lead(&mut snap, rec)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    if rec.status != "Won" || rec.probability != Some(100) {
        return Err(format!(
            "expected Won/100, got {}/{:?}",
            rec.status, rec.probability
        ));
    }
    if rec.last_activity.as_deref() != Some("2025-01-02T00:00:00Z") {
        return Err(format!("last_activity not updated: {:?}", rec.last_activity));
    }
    Ok(())
}

async fn delete_lead_removes_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        vec![
            make_lead("lead-1", "2025-01-01T00:00:00Z"),
            make_lead("lead-2", "2025-01-02T00:00:00Z"),
        ],
    )
    .await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.delete_lead(&mut snap, "lead-1")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    match s.get_lead("lead-1").await {
        Err(StorageError::LeadNotFound { .. }) => {}
        other => return Err(format!("expected LeadNotFound, got {:?}", other)),
    }
    let remaining = s
        .list_leads(&LeadFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    if remaining.len() != 1 || remaining[0].id != "lead-2" {
        return Err(format!("expected only lead-2, got {:?}", remaining));
    }
    Ok(())
}

async fn delete_lead_keeps_activity<S, F, Fut>(factory: &F) -> Result<(), String>
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
        super::make_activity("act-1", "lead-1", "created", "2025-01-01T00:00:00Z"),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.delete_lead(&mut snap, "lead-1")
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let trail = s
        .list_activity("lead-1")
        .await
        .map_err(|e| e.to_string())?;
    if trail.len() != 1 {
        return Err(format!(
            "activity must survive hard delete, found {} records",
            trail.len()
        ));
    }
    Ok(())
}
