use serde::{Deserialize, Serialize};

use super::identity::IdentityId;

/// Target inference strategies in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PhoneMention,
    NameMention,
    Thanks,
    Elimination,
}

impl Strategy {
    pub const PRECEDENCE: [Strategy; 4] =
        [Strategy::PhoneMention, Strategy::NameMention, Strategy::Thanks, Strategy::Elimination];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PhoneMention => "phone_mention",
            Strategy::NameMention => "name_mention",
            Strategy::Thanks => "thanks",
            Strategy::Elimination => "elimination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Winner { identity: IdentityId },
    Ambiguous { candidates: Vec<IdentityId> },
    NoSignal,
    NotApplicable { reason: String },
}

impl StrategyOutcome {
    pub fn winner(&self) -> Option<IdentityId> {
        match self {
            StrategyOutcome::Winner { identity } => Some(*identity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub outcome: StrategyOutcome,
}

/// One piece of evidence about who a cluster celebrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceItem {
    PhoneMention { cluster_id: usize, identity: IdentityId, phone: String, mentions: usize },
    NameMention { cluster_id: usize, identity: IdentityId, mentions: usize },
    /// The identity sent thanks responses inside the cluster
    Thanks { cluster_id: usize, identity: IdentityId, responses: usize },
    /// The identity was named inside a thanks response, i.e. thanked as a wisher
    ThanksAddressed { cluster_id: usize, identity: IdentityId },
    Elimination { cluster_id: usize, identity: IdentityId, group_size: usize },
    /// Judgment injected by an external classifier
    Classifier {
        cluster_id: usize,
        identity: Option<IdentityId>,
        target_name: Option<String>,
        confidence: Option<f64>,
        rationale: Option<String>,
    },
}

impl EvidenceItem {
    pub fn cluster_id(&self) -> usize {
        match self {
            EvidenceItem::PhoneMention { cluster_id, .. }
            | EvidenceItem::NameMention { cluster_id, .. }
            | EvidenceItem::Thanks { cluster_id, .. }
            | EvidenceItem::ThanksAddressed { cluster_id, .. }
            | EvidenceItem::Elimination { cluster_id, .. }
            | EvidenceItem::Classifier { cluster_id, .. } => *cluster_id,
        }
    }

    pub fn identity(&self) -> Option<IdentityId> {
        match self {
            EvidenceItem::PhoneMention { identity, .. }
            | EvidenceItem::NameMention { identity, .. }
            | EvidenceItem::Thanks { identity, .. }
            | EvidenceItem::ThanksAddressed { identity, .. }
            | EvidenceItem::Elimination { identity, .. } => Some(*identity),
            EvidenceItem::Classifier { identity, .. } => *identity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceClass {
    PhoneMention,
    NameDominance,
    ThanksConfirmation,
    Elimination,
    WisherCount,
    MultiYear,
    ClassifierAgreement,
    UnresolvedTarget,
    LowEvidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub class: EvidenceClass,
    /// Signed amount added to the score (penalties are negative)
    pub value: f64,
    pub detail: String,
}

/// Every term that went into a confidence value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub base: f64,
    pub contributions: Vec<Contribution>,
    pub raw_total: f64,
    pub confidence: f64,
    pub accepted: bool,
}
