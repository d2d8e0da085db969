//! Typed lead model and the closed input sets of the mutating operations.
//!
//! Storage keeps leads as [`LeadRecord`]s with a raw status string. The
//! engine works on [`Lead`], whose status is a validated [`Stage`].

use leadbook_storage::{ActivityRecord, LeadRecord, NoteRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::error::EngineError;
use crate::stage::Stage;
use crate::timestamp;

/// A lead with a validated stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub company_domain: Option<String>,
    pub service: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub created_at: String,
    pub status: Stage,
    pub owner_id: Option<String>,
    pub archived: bool,
    /// Null is read as 0 by the forecast functions.
    pub expected_value: Option<Decimal>,
    /// Percentage in [0, 100]. Null is read as 0.
    pub probability: Option<u8>,
    pub last_activity: Option<String>,
}

impl Lead {
    pub fn expected_value_or_zero(&self) -> Decimal {
        self.expected_value.unwrap_or(Decimal::ZERO)
    }

    pub fn probability_or_zero(&self) -> u8 {
        self.probability.unwrap_or(0)
    }
}

impl TryFrom<LeadRecord> for Lead {
    type Error = EngineError;

    fn try_from(record: LeadRecord) -> Result<Self, Self::Error> {
        let status = record.status.parse::<Stage>()?;
        let probability = record.probability.map(check_probability).transpose()?;
        let expected_value = record
            .expected_value
            .map(check_expected_value)
            .transpose()?;
        Ok(Lead {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            company: record.company,
            company_domain: record.company_domain,
            service: record.service,
            description: record.description,
            source: record.source,
            created_at: record.created_at,
            status,
            owner_id: record.owner_id,
            archived: record.archived,
            expected_value,
            probability,
            last_activity: record.last_activity,
        })
    }
}

impl From<Lead> for LeadRecord {
    fn from(lead: Lead) -> Self {
        LeadRecord {
            id: lead.id,
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            company: lead.company,
            company_domain: lead.company_domain,
            service: lead.service,
            description: lead.description,
            source: lead.source,
            created_at: lead.created_at,
            status: lead.status.as_str().to_string(),
            owner_id: lead.owner_id,
            archived: lead.archived,
            expected_value: lead.expected_value,
            probability: lead.probability.map(i64::from),
            last_activity: lead.last_activity,
        }
    }
}

pub(crate) fn check_probability(value: i64) -> Result<u8, EngineError> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| {
            EngineError::invalid_field(
                "probability",
                format!("{} is outside 0..=100", value),
            )
        })
}

/// Largest accepted expected value. Keeps every forecast sum far from
/// `Decimal::MAX`.
pub const MAX_EXPECTED_VALUE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

pub(crate) fn check_expected_value(value: Decimal) -> Result<Decimal, EngineError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(EngineError::invalid_field(
            "expected_value",
            format!("{} is negative", value),
        ));
    }
    if value > MAX_EXPECTED_VALUE {
        return Err(EngineError::invalid_field(
            "expected_value",
            format!("{} exceeds {}", value, MAX_EXPECTED_VALUE),
        ));
    }
    Ok(value)
}

/// Fields accepted when creating a lead. Status is always `New`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewLead {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub company_domain: Option<String>,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub expected_value: Option<Decimal>,
    #[serde(default)]
    pub probability: Option<i64>,
}

/// The multi-field edit. Absent fields are left as they are.
///
/// `owner_id` distinguishes "absent" (`None`) from "clear the owner"
/// (`Some(None)`, sent as JSON `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeadUpdate {
    #[serde(default, deserialize_with = "present")]
    pub owner_id: Option<Option<String>>,
    #[serde(default)]
    pub expected_value: Option<Decimal>,
    #[serde(default)]
    pub probability: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Maps a present field (even `null`) to `Some`, leaving `None` for absent.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Activity types written by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Created,
    StatusChange,
    LeadUpdated,
    Archived,
    NoteAdded,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Created => "created",
            ActivityKind::StatusChange => "status_change",
            ActivityKind::LeadUpdated => "lead_updated",
            ActivityKind::Archived => "archived",
            ActivityKind::NoteAdded => "note_added",
        }
    }

    pub(crate) fn record(
        self,
        lead_id: &str,
        description: impl Into<String>,
        at: OffsetDateTime,
    ) -> ActivityRecord {
        ActivityRecord {
            id: uuid::Uuid::new_v4().to_string(),
            lead_id: lead_id.to_string(),
            activity_type: self.as_str().to_string(),
            description: description.into(),
            created_at: timestamp::format_utc(at),
        }
    }
}

/// An updated lead plus the activity record that describes the change.
/// Both must be persisted together.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadChange {
    pub lead: Lead,
    pub activity: ActivityRecord,
}

/// A new note plus its `note_added` activity record.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteChange {
    pub note: NoteRecord,
    pub activity: ActivityRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, probability: Option<i64>) -> LeadRecord {
        LeadRecord {
            id: "lead-1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            company: "Analytical".to_string(),
            company_domain: None,
            service: "Engines".to_string(),
            description: None,
            source: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            status: status.to_string(),
            owner_id: None,
            archived: false,
            expected_value: Some(Decimal::from(500)),
            probability,
            last_activity: None,
        }
    }

    #[test]
    fn record_round_trips_through_lead() {
        let rec = record("Proposal Sent", Some(35));
        let lead = Lead::try_from(rec.clone()).unwrap();
        assert_eq!(lead.status, Stage::ProposalSent);
        assert_eq!(lead.probability, Some(35));
        assert_eq!(LeadRecord::from(lead), rec);
    }

    #[test]
    fn unknown_stored_status_is_invalid_status() {
        let err = Lead::try_from(record("Archived", None)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidStatus { .. }));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let err = Lead::try_from(record("New", Some(101))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidField { ref field, .. } if field == "probability"));
        assert!(Lead::try_from(record("New", Some(-1))).is_err());
    }

    #[test]
    fn expected_value_is_capped() {
        assert_eq!(MAX_EXPECTED_VALUE, Decimal::from(1_000_000_000_000_000_i64));
        assert_eq!(check_expected_value(MAX_EXPECTED_VALUE).unwrap(), MAX_EXPECTED_VALUE);

        let err = check_expected_value(Decimal::MAX).unwrap_err();
        assert!(matches!(err, EngineError::InvalidField { ref field, .. } if field == "expected_value"));

        let mut rec = record("Won", Some(100));
        rec.expected_value = Some(MAX_EXPECTED_VALUE + Decimal::ONE);
        assert!(Lead::try_from(rec).is_err());
    }

    #[test]
    fn update_distinguishes_null_owner_from_absent() {
        let cleared: LeadUpdate = serde_json::from_str(r#"{"owner_id": null}"#).unwrap();
        assert_eq!(cleared.owner_id, Some(None));
        let untouched: LeadUpdate = serde_json::from_str(r#"{"probability": 20}"#).unwrap();
        assert_eq!(untouched.owner_id, None);
        assert_eq!(untouched.probability, Some(20));
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let result: Result<LeadUpdate, _> = serde_json::from_str(r#"{"archived": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn expected_value_accepts_numbers_and_strings() {
        let update: LeadUpdate =
            serde_json::from_str(r#"{"expected_value": 1250.5}"#).unwrap();
        assert_eq!(update.expected_value, Some(Decimal::new(12505, 1)));
        let update: LeadUpdate =
            serde_json::from_str(r#"{"expected_value": "99"}"#).unwrap();
        assert_eq!(update.expected_value, Some(Decimal::from(99)));
    }
}
