//! Leadbook engine -- lead status transitions and the weighted revenue
//! forecast.
//!
//! The pure functions in [`lifecycle`] and [`forecast`] take lead snapshots
//! and return new values; [`LeadService`] drives them through a
//! [`leadbook_storage::LeadStorage`] backend so that each change and its
//! activity record are committed atomically.

pub mod error;
pub mod forecast;
pub mod lifecycle;
pub mod numeric;
pub mod query;
pub mod service;
pub mod stage;
pub mod timestamp;
pub mod types;

pub use error::EngineError;
pub use forecast::{ForecastSummary, StageSummary};
pub use query::{DashboardStats, Page};
pub use service::LeadService;
pub use stage::Stage;
pub use types::{ActivityKind, Lead, LeadChange, LeadUpdate, NewLead, NoteChange};
