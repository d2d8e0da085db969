use std::future::Future;

use super::{make_activity, make_lead, make_note, seed, TestResult};
use crate::{LeadStorage, StorageError};

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "commit",
            "update_and_activity_both_visible_after_commit",
            update_and_activity_both_visible_after_commit(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "update_and_activity_neither_visible_after_abort",
            update_and_activity_neither_visible_after_abort(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "note_and_activity_committed_together",
            note_and_activity_committed_together(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "commit_empty_snapshot",
            commit_empty_snapshot(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "sequential_commits_accumulate_activity",
            sequential_commits_accumulate_activity(factory).await,
        ),
        TestResult::from_result(
            "commit",
            "later_commit_wins_on_same_lead",
            later_commit_wins_on_same_lead(factory).await,
        ),
    ]
}

async fn update_and_activity_both_visible_after_commit<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
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
    rec.status = "Qualified".to_string();
    s.update_lead(&mut snap, rec)
        .await
        .map_err(|e| e.to_string())?;
    s.insert_activity(
        &mut snap,
        make_activity("act-1", "lead-1", "status_change", "2025-01-02T00:00:00Z"),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    let trail = s.list_activity("lead-1").await.map_err(|e| e.to_string())?;
    if rec.status != "Qualified" {
        return Err(format!("expected Qualified, got {}", rec.status));
    }
    if trail.len() != 1 || trail[0].activity_type != "status_change" {
        return Err(format!("expected one status_change record, got {:?}", trail));
    }
    Ok(())
}

async fn update_and_activity_neither_visible_after_abort<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
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
    rec.archived = true;
    s.update_lead(&mut snap, rec)
        .await
        .map_err(|e| e.to_string())?;
    s.insert_activity(
        &mut snap,
        make_activity("act-1", "lead-1", "archived", "2025-01-02T00:00:00Z"),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    let trail = s.list_activity("lead-1").await.map_err(|e| e.to_string())?;
    if rec.archived {
        return Err("aborted update leaked: lead archived".to_string());
    }
    if !trail.is_empty() {
        return Err(format!("aborted activity leaked: {:?}", trail));
    }
    Ok(())
}

async fn note_and_activity_committed_together<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_note(&mut snap, make_note("note-1", "lead-1", "2025-01-03T00:00:00Z"))
        .await
        .map_err(|e| e.to_string())?;
    s.insert_activity(
        &mut snap,
        make_activity("act-1", "lead-1", "note_added", "2025-01-03T00:00:00Z"),
    )
    .await
    .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let notes = s.list_notes("lead-1").await.map_err(|e| e.to_string())?;
    let trail = s.list_activity("lead-1").await.map_err(|e| e.to_string())?;
    if notes.len() != 1 || notes[0].note != "note note-1" {
        return Err(format!("expected one note, got {:?}", notes));
    }
    if trail.len() != 1 {
        return Err(format!("expected one activity record, got {}", trail.len()));
    }
    Ok(())
}

async fn commit_empty_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}

async fn sequential_commits_accumulate_activity<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    for i in 1..=3 {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.insert_activity(
            &mut snap,
            make_activity(
                &format!("act-{}", i),
                "lead-1",
                "status_change",
                &format!("2025-01-0{}T00:00:00Z", i + 1),
            ),
        )
        .await
        .map_err(|e| e.to_string())?;
        s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    }

    let trail = s.list_activity("lead-1").await.map_err(|e| e.to_string())?;
    if trail.len() != 3 {
        return Err(format!("expected 3 records, got {}", trail.len()));
    }
    Ok(())
}

async fn later_commit_wins_on_same_lead<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, vec![make_lead("lead-1", "2025-01-01T00:00:00Z")]).await?;

    let mut first = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut second = s.begin_snapshot().await.map_err(|e| e.to_string())?;

    let mut a = s
        .get_lead_for_update(&mut first, "lead-1")
        .await
        .map_err(|e| e.to_string())?;
    a.status = "Contacted".to_string();
    s.update_lead(&mut first, a)
        .await
        .map_err(|e| e.to_string())?;

    let mut b = s
        .get_lead_for_update(&mut second, "lead-1")
        .await
        .map_err(|e| e.to_string())?;
    b.status = "Lost".to_string();
    s.update_lead(&mut second, b)
        .await
        .map_err(|e| e.to_string())?;

    s.commit_snapshot(first).await.map_err(|e| e.to_string())?;
    match s.commit_snapshot(second).await {
        Ok(()) => {}
        Err(StorageError::Backend(msg)) => return Err(format!("second commit failed: {}", msg)),
        Err(e) => return Err(e.to_string()),
    }

    let rec = s.get_lead("lead-1").await.map_err(|e| e.to_string())?;
    if rec.status != "Lost" {
        return Err(format!("expected last write (Lost) to win, got {}", rec.status));
    }
    Ok(())
}
