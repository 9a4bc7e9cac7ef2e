//! Versioned results document

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::BirthdayEntity;
use crate::pipeline::AnalysisReport;

/// Schema version, bumped whenever the report layout changes
pub const RESULTS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

/// Report for one transcript file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub path: PathBuf,
    pub report: AnalysisReport,
}

impl ResultsDocument {
    pub fn new(sources: Vec<SourceReport>) -> Self {
        Self { version: RESULTS_VERSION, generated_at: Utc::now(), sources }
    }

    /// Accepted entities across all sources, paired with their file
    pub fn entities(&self) -> impl Iterator<Item = (&PathBuf, &BirthdayEntity)> {
        self.sources.iter().flat_map(|s| s.report.entities.iter().map(move |e| (&s.path, e)))
    }

    pub fn entity_count(&self) -> usize {
        self.sources.iter().map(|s| s.report.entities.len()).sum()
    }
}
