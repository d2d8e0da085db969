use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A lead as stored in the backend.
///
/// `status` is kept as the raw stage name; the engine validates it against
/// the fixed stage set before any write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub company: String,
    #[serde(default)]
    pub company_domain: Option<String>,
    pub service: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    pub status: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub expected_value: Option<Decimal>,
    #[serde(default)]
    pub probability: Option<i64>,
    /// ISO 8601 / RFC 3339 timestamp string. None until the first mutation.
    #[serde(default)]
    pub last_activity: Option<String>,
}

/// An append-only audit entry attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub lead_id: String,
    /// Activity type, e.g. `"status_change"` or `"archived"`.
    #[serde(rename = "type")]
    pub activity_type: String,
    pub description: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
}

/// A free-text note attached to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub lead_id: String,
    pub note: String,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
}

/// A user that leads can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Filter for `list_leads`. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFilter {
    pub archived: Option<bool>,
    pub status: Option<String>,
}

impl LeadFilter {
    /// Non-archived leads only.
    pub fn active() -> Self {
        Self {
            archived: Some(false),
            status: None,
        }
    }

    /// Archived leads only.
    pub fn archived() -> Self {
        Self {
            archived: Some(true),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn matches(&self, lead: &LeadRecord) -> bool {
        self.archived.map_or(true, |a| lead.archived == a)
            && self.status.as_deref().map_or(true, |s| lead.status == s)
    }
}
