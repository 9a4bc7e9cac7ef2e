//! Evidence fusion into a single confidence value.
//!
//! Each evidence class is scored on its own, from what the strategies and
//! clusters observed, regardless of which strategy decided the target.
//! Adding evidence therefore never lowers a score. For a multi-year entity a
//! class counts when any occurrence shows it, at its strongest occurrence.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::config::{ClassifierConfig, ConfidenceConfig};
use crate::models::{
    ConfidenceBreakdown, Contribution, EvidenceClass, EvidenceItem, IdentityId, Occurrence,
    Strategy,
};

/// Years beyond the first that still add to the multi-year bonus
const MAX_EXTRA_YEARS: usize = 3;

pub struct ConfidenceScorer<'a> {
    config: &'a ConfidenceConfig,
    name_margin: usize,
    classifier: &'a ClassifierConfig,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a ConfidenceConfig, name_margin: usize, classifier: &'a ClassifierConfig) -> Self {
        Self { config, name_margin: name_margin.max(1), classifier }
    }

    /// Score an entity from its occurrences and the evidence they produced
    pub fn score(
        &self,
        target: Option<IdentityId>,
        occurrences: &[Occurrence],
        evidence: &[EvidenceItem],
    ) -> ConfidenceBreakdown {
        let weights = &self.config.weights;
        let mut contributions = Vec::new();
        let mut add = |class: EvidenceClass, value: f64, detail: String| {
            if value != 0.0 {
                contributions.push(Contribution { class, value, detail });
            }
        };

        let phones: BTreeSet<&str> = evidence
            .iter()
            .filter_map(|e| match e {
                EvidenceItem::PhoneMention { phone, .. } => Some(phone.as_str()),
                _ => None,
            })
            .collect();
        if !phones.is_empty() {
            add(
                EvidenceClass::PhoneMention,
                weights.phone_mention,
                format!("{} phone number(s) mentioned", phones.len()),
            );
        }

        let lead = best_name_lead(evidence);
        if lead > 0 {
            let share = (lead as f64 / self.name_margin as f64).min(1.0);
            add(
                EvidenceClass::NameDominance,
                weights.name_dominance * share,
                noting_disagreement(
                    format!("top name leads by {lead} mention(s)"),
                    &name_leaders(evidence),
                    target,
                ),
            );
        }

        let thankers: BTreeSet<IdentityId> = occurrences
            .iter()
            .flat_map(|o| o.strategies.iter())
            .filter(|r| r.strategy == Strategy::Thanks)
            .filter_map(|r| r.outcome.winner())
            .collect();
        if !thankers.is_empty() {
            add(
                EvidenceClass::ThanksConfirmation,
                weights.thanks_confirmation,
                noting_disagreement(
                    "a single participant answered the wishes".to_string(),
                    &thankers,
                    target,
                ),
            );
        }

        let eliminated: BTreeMap<IdentityId, usize> = evidence
            .iter()
            .filter_map(|e| match e {
                EvidenceItem::Elimination { identity, group_size, .. } => Some((*identity, *group_size)),
                _ => None,
            })
            .collect();
        if let Some(&group_size) = eliminated.values().max() {
            let eliminated: BTreeSet<IdentityId> = eliminated.keys().copied().collect();
            add(
                EvidenceClass::Elimination,
                weights.elimination,
                noting_disagreement(
                    format!("only non-wisher among {group_size} participants"),
                    &eliminated,
                    target,
                ),
            );
        }

        let wishers = occurrences.iter().map(|o| o.cluster.wisher_count()).max().unwrap_or(0);
        if wishers >= self.config.wisher_full_threshold {
            add(EvidenceClass::WisherCount, weights.wisher_count, format!("{wishers} wishers"));
        } else if wishers >= self.config.wisher_size_threshold {
            add(EvidenceClass::WisherCount, weights.wisher_count / 2.0, format!("{wishers} wishers"));
        }

        let years: BTreeSet<i32> = occurrences.iter().map(|o| o.cluster.year()).collect();
        if years.len() > 1 {
            let extra = (years.len() - 1).min(MAX_EXTRA_YEARS);
            add(
                EvidenceClass::MultiYear,
                weights.multi_year * extra as f64 / MAX_EXTRA_YEARS as f64,
                format!("celebrated in {} different years", years.len()),
            );
        }

        if let Some(target) = target
            && evidence.iter().any(|e| self.classifier_agrees(e, target))
        {
            add(
                EvidenceClass::ClassifierAgreement,
                weights.classifier_agreement,
                "classifier named the same person".to_string(),
            );
        }

        if target.is_none() {
            add(
                EvidenceClass::UnresolvedTarget,
                -self.config.unresolved_penalty,
                "no strategy identified the honoree".to_string(),
            );
        }

        if years.len() <= 1 && wishers < self.config.wisher_size_threshold {
            add(
                EvidenceClass::LowEvidence,
                -self.config.low_evidence_penalty,
                format!("single occurrence with {wishers} wisher(s)"),
            );
        }

        let raw_total =
            self.config.base_score + contributions.iter().map(|c| c.value).sum::<f64>();
        let confidence = raw_total.clamp(0.0, 1.0);
        let accepted = confidence >= self.config.min_threshold;
        trace!(raw_total, confidence, accepted, "Scored entity");

        ConfidenceBreakdown {
            base: self.config.base_score,
            contributions,
            raw_total,
            confidence,
            accepted,
        }
    }

    fn classifier_agrees(&self, item: &EvidenceItem, target: IdentityId) -> bool {
        match item {
            EvidenceItem::Classifier { identity: Some(id), confidence, .. } => {
                *id == target && confidence.unwrap_or(0.0) >= self.classifier.min_confidence
            }
            _ => false,
        }
    }
}

/// Append which identities a bonus pointed at when none of them is the target.
///
/// The bonus itself stands either way; only the explanation changes.
fn noting_disagreement(
    detail: String,
    pointed_at: &BTreeSet<IdentityId>,
    target: Option<IdentityId>,
) -> String {
    match target {
        Some(target) if !pointed_at.is_empty() && !pointed_at.contains(&target) => {
            let others: Vec<String> = pointed_at.iter().map(|id| id.to_string()).collect();
            format!("{detail}; pointed at {}, not the target {target}", others.join(", "))
        }
        _ => detail,
    }
}

/// The most mentioned identity of each cluster, lowest handle on ties
fn name_leaders(evidence: &[EvidenceItem]) -> BTreeSet<IdentityId> {
    let mut per_cluster: BTreeMap<usize, (IdentityId, usize)> = BTreeMap::new();
    for item in evidence {
        if let EvidenceItem::NameMention { cluster_id, identity, mentions } = item {
            let best = per_cluster.entry(*cluster_id).or_insert((*identity, *mentions));
            if *mentions > best.1 || (*mentions == best.1 && *identity < best.0) {
                *best = (*identity, *mentions);
            }
        }
    }
    per_cluster.into_values().map(|(identity, _)| identity).collect()
}

/// Largest lead of a top-mentioned name over its runner-up in any cluster
fn best_name_lead(evidence: &[EvidenceItem]) -> usize {
    let mut per_cluster: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for item in evidence {
        if let EvidenceItem::NameMention { cluster_id, mentions, .. } = item {
            per_cluster.entry(*cluster_id).or_default().push(*mentions);
        }
    }
    per_cluster
        .into_values()
        .map(|mut counts| {
            counts.sort_unstable_by(|a, b| b.cmp(a));
            match counts.as_slice() {
                [] => 0,
                [top] => *top,
                [top, second, ..] => top - second,
            }
        })
        .max()
        .unwrap_or(0)
}
