use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::identity::IdentityId;

/// Non-fatal conditions surfaced next to the results they affect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisWarning {
    AmbiguousIdentity { detail: String, identities: Vec<IdentityId> },
    UnresolvedTarget { cluster_id: usize, date: NaiveDate },
    CollaboratorUnavailable { collaborator: String, reason: String },
}

impl AnalysisWarning {
    pub fn involves(&self, identity: IdentityId) -> bool {
        match self {
            AnalysisWarning::AmbiguousIdentity { identities, .. } => identities.contains(&identity),
            _ => false,
        }
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::AmbiguousIdentity { detail, .. } => {
                write!(f, "ambiguous identity: {}", detail)
            }
            AnalysisWarning::UnresolvedTarget { cluster_id, date } => {
                write!(f, "no honoree found for cluster {} on {}", cluster_id, date)
            }
            AnalysisWarning::CollaboratorUnavailable { collaborator, reason } => {
                write!(f, "{} unavailable: {}", collaborator, reason)
            }
        }
    }
}
