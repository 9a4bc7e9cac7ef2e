use serde::{Deserialize, Serialize};

use crate::models::{AnalysisWarning, BirthdayEntity, ParticipantIdentity};
use crate::parsers::LineFormat;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub messages: usize,
    pub text_messages: usize,
    pub orphan_lines: usize,
    pub wishes: usize,
    pub thanks_responses: usize,
    pub clusters: usize,
    pub entities: usize,
    pub rejected: usize,
}

/// Everything one analysis run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub format: LineFormat,
    /// Entities meeting the confidence threshold, best first
    pub entities: Vec<BirthdayEntity>,
    /// Entities below the threshold, best first
    pub rejected: Vec<BirthdayEntity>,
    /// Warnings not tied to a single entity
    pub warnings: Vec<AnalysisWarning>,
    pub participants: Vec<ParticipantIdentity>,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    pub fn participant(&self, id: crate::models::IdentityId) -> Option<&ParticipantIdentity> {
        self.participants.iter().find(|p| p.id == id)
    }
}
