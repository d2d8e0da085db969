use std::future::Future;

use super::{make_activity, make_lead, seed, TestResult};
use crate::{LeadFilter, LeadStorage};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "query",
            "list_leads_newest_first",
            list_leads_newest_first(factory).await,
        ),
        TestResult::from_result(
            "query",
            "list_leads_archived_filter",
            list_leads_archived_filter(factory).await,
        ),
        TestResult::from_result(
            "query",
            "list_leads_status_filter",
            list_leads_status_filter(factory).await,
        ),
        TestResult::from_result(
            "query",
            "list_activity_scoped_and_newest_first",
            list_activity_scoped_and_newest_first(factory).await,
        ),
    ]
}

async fn list_leads_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        vec![
            make_lead("old", "2025-01-01T00:00:00Z"),
            make_lead("newest", "2025-03-01T00:00:00Z"),
            make_lead("middle", "2025-02-01T00:00:00Z"),
        ],
    )
    .await?;

    let ids: Vec<String> = s
        .list_leads(&LeadFilter::default())
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|l| l.id)
        .collect();
    if ids != ["newest", "middle", "old"] {
        return Err(format!("expected newest-first order, got {:?}", ids));
    }
    Ok(())
}

async fn list_leads_archived_filter<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut archived = make_lead("gone", "2025-01-02T00:00:00Z");
    archived.archived = true;
    seed(
        &s,
        vec![make_lead("live", "2025-01-01T00:00:00Z"), archived],
    )
    .await?;

    let active = s
        .list_leads(&LeadFilter::active())
        .await
        .map_err(|e| e.to_string())?;
    let gone = s
        .list_leads(&LeadFilter::archived())
        .await
        .map_err(|e| e.to_string())?;
    if active.len() != 1 || active[0].id != "live" {
        return Err(format!("active filter returned {:?}", active));
    }
    if gone.len() != 1 || gone[0].id != "gone" {
        return Err(format!("archived filter returned {:?}", gone));
    }
    Ok(())
}

async fn list_leads_status_filter<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut won = make_lead("won", "2025-01-02T00:00:00Z");
    won.status = "Won".to_string();
    let mut won_archived = make_lead("won-archived", "2025-01-03T00:00:00Z");
    won_archived.status = "Won".to_string();
    won_archived.archived = true;
    seed(
        &s,
        vec![make_lead("new", "2025-01-01T00:00:00Z"), won, won_archived],
    )
    .await?;

    let hits = s
        .list_leads(&LeadFilter::active().with_status("Won"))
        .await
        .map_err(|e| e.to_string())?;
    if hits.len() != 1 || hits[0].id != "won" {
        return Err(format!("expected only active Won lead, got {:?}", hits));
    }
    Ok(())
}

async fn list_activity_scoped_and_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
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
            make_lead("lead-2", "2025-01-01T00:00:00Z"),
        ],
    )
    .await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for record in [
        make_activity("a1", "lead-1", "created", "2025-01-01T00:00:00Z"),
        make_activity("a2", "lead-2", "created", "2025-01-01T00:00:00Z"),
        make_activity("a3", "lead-1", "status_change", "2025-01-05T00:00:00Z"),
    ] {
        s.insert_activity(&mut snap, record)
            .await
            .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let ids: Vec<String> = s
        .list_activity("lead-1")
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|a| a.id)
        .collect();
    if ids != ["a3", "a1"] {
        return Err(format!("expected [a3, a1], got {:?}", ids));
    }
    Ok(())
}
