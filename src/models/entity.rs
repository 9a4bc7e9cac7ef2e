use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::cluster::BirthdayCluster;
use super::evidence::{ConfidenceBreakdown, EvidenceItem, Strategy, StrategyReport};
use super::identity::IdentityId;
use super::warning::AnalysisWarning;

/// Reference year used to compare month/day pairs; a leap year so Feb 29 exists.
const REFERENCE_YEAR: i32 = 2000;
const DAYS_IN_REFERENCE_YEAR: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day).map(|_| Self { month, day })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { month: date.month(), day: date.day() }
    }

    fn ordinal(&self) -> i64 {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, self.month, self.day)
            .map(|d| i64::from(d.ordinal0()))
            .unwrap_or(0)
    }

    /// Distance in days ignoring the year, wrapping Dec 31 to Jan 1
    pub fn distance(&self, other: &MonthDay) -> i64 {
        let diff = (self.ordinal() - other.ordinal()).abs();
        diff.min(DAYS_IN_REFERENCE_YEAR - diff)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub id: IdentityId,
    pub key: String,
    pub display_name: String,
}

/// One observed celebration of a recurring birthday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub cluster: BirthdayCluster,
    pub target: Option<IdentityId>,
    pub decided_by: Option<Strategy>,
    pub strategies: Vec<StrategyReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayEntity {
    pub date: MonthDay,
    pub occurrences: Vec<Occurrence>,
    pub target: Option<TargetRef>,
    pub evidence: Vec<EvidenceItem>,
    pub confidence: f64,
    pub breakdown: ConfidenceBreakdown,
    pub warnings: Vec<AnalysisWarning>,
}

impl BirthdayEntity {
    pub fn years(&self) -> BTreeSet<i32> {
        self.occurrences.iter().map(|o| o.cluster.year()).collect()
    }

    /// Number of distinct years in which the birthday was celebrated
    pub fn occurrence_count(&self) -> usize {
        self.years().len()
    }

    pub fn target_id(&self) -> Option<IdentityId> {
        self.target.as_ref().map(|t| t.id)
    }

    pub fn max_wishers(&self) -> usize {
        self.occurrences.iter().map(|o| o.cluster.wisher_count()).max().unwrap_or(0)
    }
}
