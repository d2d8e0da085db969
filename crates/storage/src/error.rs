/// All errors that can be returned by a LeadStorage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No lead with the given id.
    #[error("lead not found: {lead_id}")]
    LeadNotFound { lead_id: String },

    /// A lead with this id already exists.
    #[error("lead already exists: {lead_id}")]
    AlreadyExists { lead_id: String },

    /// A backend-specific storage error (file I/O, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
