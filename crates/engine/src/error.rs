use leadbook_storage::StorageError;

/// Errors that can occur while applying engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The requested status is not one of the seven pipeline stages.
    #[error("invalid status '{status}': expected one of New, Contacted, Qualified, Proposal Sent, Negotiation, Won, Lost")]
    InvalidStatus { status: String },

    /// A field value is outside its allowed range.
    #[error("invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// A note with no visible text.
    #[error("note text must not be empty")]
    EmptyNote,

    /// No lead with the given id.
    #[error("lead not found: {id}")]
    LeadNotFound { id: String },

    /// The write or the activity insert failed; nothing was committed.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl EngineError {
    pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Errors raised before any write: the caller sent bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidStatus { .. } | EngineError::InvalidField { .. } | EngineError::EmptyNote
        )
    }
}

impl From<StorageError> for EngineError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::LeadNotFound { lead_id } => EngineError::LeadNotFound { id: lead_id },
            other => EngineError::Persistence(other.to_string()),
        }
    }
}
