use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CollaboratorError;
use crate::models::IdentityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Registry,
    Scoring,
    Clustering,
    Resolution,
    Classification,
    Merging,
    Confidence,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Registry => "registry",
            Stage::Scoring => "scoring",
            Stage::Clustering => "clustering",
            Stage::Resolution => "resolution",
            Stage::Classification => "classification",
            Stage::Merging => "merging",
            Stage::Confidence => "confidence",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageCompleted { stage: Stage, items: usize },
    ClusterResolved { cluster_id: usize, target: Option<IdentityId> },
}

/// Observer for coarse analysis progress.
///
/// Reporting is purely observational: an error is logged and recorded as a
/// warning, and the analysis carries on.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent) -> Result<(), CollaboratorError>;
}

/// Writes progress to the `tracing` log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: &ProgressEvent) -> Result<(), CollaboratorError> {
        match event {
            ProgressEvent::StageCompleted { stage, items } => {
                info!(stage = %stage, items, "Stage completed");
            }
            ProgressEvent::ClusterResolved { cluster_id, target } => {
                info!(cluster = cluster_id, target = ?target, "Cluster resolved");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: &ProgressEvent) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
