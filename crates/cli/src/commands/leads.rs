//! Lead subcommands: list, show, create and the mutations.

use leadbook_engine::query::{self, Page};
use leadbook_engine::{Lead, LeadService, LeadUpdate, NewLead};
use leadbook_storage::{ActivityRecord, LeadFilter, LeadStorage, NoteRecord};
use serde::Serialize;
use time::OffsetDateTime;

use super::Context;
use crate::error::CliError;

pub(crate) struct ListQuery {
    pub(crate) status: Option<String>,
    pub(crate) archived: bool,
    pub(crate) search: Option<String>,
    pub(crate) page: usize,
    pub(crate) per_page: usize,
}

/// One table row.
fn lead_line(lead: &Lead) -> String {
    let value = lead
        .expected_value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    let probability = lead
        .probability
        .map(|p| format!("{}%", p))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {:<13}  {:<20}  {:<24}  {:>10}  {:>4}",
        lead.id, lead.status, lead.name, lead.company, value, probability
    )
}

fn lead_detail(lead: &Lead) -> String {
    let mut out = vec![
        format!("{} ({})", lead.name, lead.id),
        format!("  status:        {}", lead.status),
        format!("  email:         {}", lead.email),
    ];
    if let Some(phone) = &lead.phone {
        out.push(format!("  phone:         {}", phone));
    }
    out.push(format!("  company:       {}", lead.company));
    out.push(format!("  service:       {}", lead.service));
    if let Some(description) = &lead.description {
        out.push(format!("  description:   {}", description));
    }
    out.push(format!(
        "  owner:         {}",
        lead.owner_id.as_deref().unwrap_or("-")
    ));
    out.push(format!(
        "  value:         {}",
        lead.expected_value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push(format!(
        "  probability:   {}",
        lead.probability
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push(format!("  created:       {}", lead.created_at));
    out.push(format!(
        "  last activity: {}",
        lead.last_activity.as_deref().unwrap_or("-")
    ));
    if lead.archived {
        out.push("  (archived)".to_string());
    }
    out.join("\n")
}

pub(crate) async fn cmd_list<S: LeadStorage>(
    service: &LeadService<S>,
    q: &ListQuery,
    ctx: Context,
) -> Result<(), CliError> {
    let mut filter = if q.archived {
        LeadFilter::archived()
    } else {
        LeadFilter::active()
    };
    if let Some(status) = &q.status {
        // Normalise slugs like "proposal-sent" before filtering.
        let stage = status.parse::<leadbook_engine::Stage>()?;
        filter = filter.with_status(stage.as_str());
    }
    let leads = service.fetch_leads(&filter).await?;
    let matched = query::search(&leads, q.search.as_deref().unwrap_or(""));
    let page: Page<&Lead> = query::paginate(matched, q.page, q.per_page);

    ctx.emit(&page, || {
        let mut lines: Vec<String> = page.items.iter().map(|l| lead_line(l)).collect();
        if lines.is_empty() {
            lines.push("no leads".to_string());
        }
        lines.push(format!(
            "page {} of {} ({} leads)",
            page.page,
            page.total_pages.max(1),
            page.total
        ));
        lines.join("\n")
    });
    Ok(())
}

#[derive(Serialize)]
struct LeadView {
    lead: Lead,
    age_days: Option<i64>,
    activity: Vec<ActivityRecord>,
    notes: Vec<NoteRecord>,
}

pub(crate) async fn cmd_show<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service.get_lead(id).await?;
    let view = LeadView {
        age_days: query::lead_age_days(&lead, OffsetDateTime::now_utc()),
        activity: service.activity(id).await?,
        notes: service.notes(id).await?,
        lead,
    };

    ctx.emit(&view, || {
        let mut out = vec![lead_detail(&view.lead)];
        if !view.activity.is_empty() {
            out.push("activity:".to_string());
            out.extend(view.activity.iter().map(|a| {
                format!("  {}  {:<13}  {}", a.created_at, a.activity_type, a.description)
            }));
        }
        if !view.notes.is_empty() {
            out.push("notes:".to_string());
            out.extend(
                view.notes
                    .iter()
                    .map(|n| format!("  {}  {}", n.created_at, n.note)),
            );
        }
        out.join("\n")
    });
    Ok(())
}

pub(crate) async fn cmd_create<S: LeadStorage>(
    service: &LeadService<S>,
    input: &NewLead,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service.create_lead(input, OffsetDateTime::now_utc()).await?;
    ctx.emit(&lead, || format!("created {}", lead.id));
    Ok(())
}

pub(crate) async fn cmd_status<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    stage: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service
        .transition_status(id, stage, OffsetDateTime::now_utc())
        .await?;
    ctx.emit(&lead, || format!("{} is now {}", lead.id, lead.status));
    Ok(())
}

pub(crate) async fn cmd_move<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    stage: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service.move_card(id, stage, OffsetDateTime::now_utc()).await?;
    ctx.emit(&lead, || format!("{} is in {}", lead.id, lead.status));
    Ok(())
}

pub(crate) async fn cmd_update<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    update: &LeadUpdate,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service
        .update_lead_fields(id, update, OffsetDateTime::now_utc())
        .await?;
    ctx.emit(&lead, || lead_detail(&lead));
    Ok(())
}

pub(crate) async fn cmd_archive<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service.archive_lead(id, OffsetDateTime::now_utc()).await?;
    ctx.emit(&lead, || format!("archived {}", lead.id));
    Ok(())
}

pub(crate) async fn cmd_restore<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let lead = service.restore_lead(id).await?;
    ctx.emit(&lead, || format!("restored {}", lead.id));
    Ok(())
}

pub(crate) async fn cmd_delete<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    ctx: Context,
) -> Result<(), CliError> {
    service.delete_lead(id).await?;
    ctx.emit(&serde_json::json!({ "deleted": id }), || {
        format!("deleted {}", id)
    });
    Ok(())
}

pub(crate) async fn cmd_note<S: LeadStorage>(
    service: &LeadService<S>,
    id: &str,
    text: &str,
    ctx: Context,
) -> Result<(), CliError> {
    let note = service.add_note(id, text, OffsetDateTime::now_utc()).await?;
    ctx.emit(&note, || format!("noted {} on {}", note.id, id));
    Ok(())
}
