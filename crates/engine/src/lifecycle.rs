//! Lead status engine.
//!
//! Pure functions: each takes a lead snapshot and the current time and
//! returns the updated lead together with the activity record to append.
//! The input lead is never modified, and validation happens before any
//! change is produced, so an `Err` means "nothing to write".
//!
//! Any stage may move to any other stage. A lead moved to `Won` always ends
//! with `probability == 100`.

use leadbook_storage::NoteRecord;
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::stage::Stage;
use crate::timestamp;
use crate::types::{
    check_expected_value, check_probability, ActivityKind, Lead, LeadChange, LeadUpdate, NewLead,
    NoteChange,
};

/// Set `status`, pinning probability to 100 for `Won`.
fn set_status(lead: &mut Lead, stage: Stage) {
    lead.status = stage;
    if stage == Stage::Won {
        lead.probability = Some(100);
    }
}

/// Move `lead` to `new_status`.
///
/// Fails with `InvalidStatus` when `new_status` is not a pipeline stage.
pub fn transition_status(
    lead: &Lead,
    new_status: &str,
    now: OffsetDateTime,
) -> Result<LeadChange, EngineError> {
    let stage = new_status.parse::<Stage>()?;
    let mut next = lead.clone();
    set_status(&mut next, stage);
    next.last_activity = Some(timestamp::format_utc(now));
    let activity = ActivityKind::StatusChange.record(
        &next.id,
        format!("Status updated to {}", stage),
        now,
    );
    Ok(LeadChange {
        lead: next,
        activity,
    })
}

/// Drop a pipeline card on `target` column.
///
/// Dropping a card on the column it already sits in is a no-op (`None`).
pub fn move_card(
    lead: &Lead,
    target: &str,
    now: OffsetDateTime,
) -> Result<Option<LeadChange>, EngineError> {
    let stage = target.parse::<Stage>()?;
    if stage == lead.status {
        return Ok(None);
    }
    transition_status(lead, stage.as_str(), now).map(Some)
}

/// Apply the multi-field edit form.
pub fn update_lead_fields(
    lead: &Lead,
    update: &LeadUpdate,
    now: OffsetDateTime,
) -> Result<LeadChange, EngineError> {
    let stage = update
        .status
        .as_deref()
        .map(|s| s.parse::<Stage>())
        .transpose()?;
    let probability = update.probability.map(check_probability).transpose()?;
    let expected_value = update
        .expected_value
        .map(check_expected_value)
        .transpose()?;

    let mut next = lead.clone();
    if let Some(owner) = &update.owner_id {
        next.owner_id = owner.clone().filter(|o| !o.trim().is_empty());
    }
    if let Some(value) = expected_value {
        next.expected_value = Some(value);
    }
    if let Some(p) = probability {
        next.probability = Some(p);
    }
    // Status last: a Won lead keeps 100 even if the same edit lowered it.
    let target = stage.unwrap_or(next.status);
    set_status(&mut next, target);
    next.last_activity = Some(timestamp::format_utc(now));

    let activity = ActivityKind::LeadUpdated.record(&next.id, "Lead updated", now);
    Ok(LeadChange {
        lead: next,
        activity,
    })
}

/// Soft-delete: hide the lead from every pipeline and forecast view.
pub fn archive_lead(lead: &Lead, now: OffsetDateTime) -> LeadChange {
    let mut next = lead.clone();
    next.archived = true;
    next.last_activity = Some(timestamp::format_utc(now));
    let activity = ActivityKind::Archived.record(&next.id, "Lead archived", now);
    LeadChange {
        lead: next,
        activity,
    }
}

/// Undo an archive. Writes no activity record and leaves `last_activity`
/// alone.
pub fn restore_lead(lead: &Lead) -> Lead {
    let mut next = lead.clone();
    next.archived = false;
    next
}

/// Build a new lead in `New` from the creation form.
pub fn create_lead(input: &NewLead, now: OffsetDateTime) -> Result<LeadChange, EngineError> {
    if input.name.trim().is_empty() {
        return Err(EngineError::invalid_field("name", "must not be empty"));
    }
    let probability = input.probability.map(check_probability).transpose()?;
    let expected_value = input
        .expected_value
        .map(check_expected_value)
        .transpose()?;
    let created_at = timestamp::format_utc(now);

    let lead = Lead {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: non_blank(&input.phone),
        company: input.company.trim().to_string(),
        company_domain: non_blank(&input.company_domain),
        service: input.service.trim().to_string(),
        description: non_blank(&input.description),
        source: Some("manual".to_string()),
        created_at: created_at.clone(),
        status: Stage::New,
        owner_id: non_blank(&input.owner_id),
        archived: false,
        expected_value,
        probability,
        last_activity: Some(created_at),
    };
    let activity = ActivityKind::Created.record(&lead.id, "Lead created manually", now);
    Ok(LeadChange { lead, activity })
}

/// Attach a note to `lead`.
pub fn add_note(lead: &Lead, text: &str, now: OffsetDateTime) -> Result<NoteChange, EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::EmptyNote);
    }
    let note = NoteRecord {
        id: uuid::Uuid::new_v4().to_string(),
        lead_id: lead.id.clone(),
        note: text.to_string(),
        created_at: timestamp::format_utc(now),
    };
    let activity = ActivityKind::NoteAdded.record(&lead.id, "Note added", now);
    Ok(NoteChange { note, activity })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
