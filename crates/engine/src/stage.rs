//! The fixed, ordered set of pipeline stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A lead lifecycle stage. Declaration order is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    New,
    Contacted,
    Qualified,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Negotiation,
    Won,
    Lost,
}

impl Stage {
    /// Every stage, in pipeline order. Column order for boards and the
    /// option list for status pickers.
    pub const ALL: [Stage; 7] = [
        Stage::New,
        Stage::Contacted,
        Stage::Qualified,
        Stage::ProposalSent,
        Stage::Negotiation,
        Stage::Won,
        Stage::Lost,
    ];

    /// Display name, also the stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Contacted => "Contacted",
            Stage::Qualified => "Qualified",
            Stage::ProposalSent => "Proposal Sent",
            Stage::Negotiation => "Negotiation",
            Stage::Won => "Won",
            Stage::Lost => "Lost",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Contacted => "contacted",
            Stage::Qualified => "qualified",
            Stage::ProposalSent => "proposal_sent",
            Stage::Negotiation => "negotiation",
            Stage::Won => "won",
            Stage::Lost => "lost",
        }
    }

    /// Won and Lost close a lead.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }

    /// Part of the open pipeline (not Won/Lost).
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = EngineError;

    /// Accepts the display name (`"Proposal Sent"`) or the slug, written
    /// with underscores or hyphens (`"proposal_sent"`, `"proposal-sent"`).
    /// Anything else is `InvalidStatus`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.replace('-', "_");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s || stage.slug() == slug)
            .ok_or_else(|| EngineError::InvalidStatus {
                status: s.to_string(),
            })
    }
}
