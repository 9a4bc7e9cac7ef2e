use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::identity::IdentityId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub wish_count: usize,
    pub thanks_count: usize,
    pub total_relevance: f64,
    pub phone_mentions: usize,
    pub name_mentions: usize,
    pub belated_count: usize,
    pub advance_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayCluster {
    pub id: usize,
    /// Transcript indices in timestamp order
    pub message_indices: Vec<usize>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Calendar date of the earliest member
    pub anchor_date: NaiveDate,
    /// Anchor date corrected for belated/advance wishes
    pub birthday_date: NaiveDate,
    /// Distinct canonical senders of wish messages, sorted
    pub wishers: Vec<IdentityId>,
    pub summary: SignalSummary,
}

impl BirthdayCluster {
    pub fn wisher_count(&self) -> usize {
        self.wishers.len()
    }

    pub fn year(&self) -> i32 {
        self.birthday_date.year()
    }

    pub fn contains(&self, message_index: usize) -> bool {
        self.message_indices.contains(&message_index)
    }
}
