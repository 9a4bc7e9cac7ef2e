//! The four target inference strategies.
//!
//! Each strategy looks at one kind of evidence, reports an outcome and the
//! evidence items it saw. None of them consult another strategy's result.
//!
//! Thanks responses are read for their sender only. Whoever a thanks reply
//! names is a wisher being thanked, so an addressee becomes
//! `ThanksAddressed` evidence and is never chosen as the honoree.

use std::collections::{BTreeMap, BTreeSet};

use crate::clustering::ScoredTranscript;
use crate::identity::ParticipantRegistry;
use crate::models::{BirthdayCluster, EvidenceItem, IdentityId, StrategyOutcome};

/// A cluster's members split by role, with canonical senders resolved
pub struct ClusterView<'a> {
    pub cluster: &'a BirthdayCluster,
    pub scored: ScoredTranscript<'a>,
    pub registry: &'a ParticipantRegistry,
}

impl<'a> ClusterView<'a> {
    fn wishes(&self) -> impl Iterator<Item = usize> + '_ {
        self.cluster.message_indices.iter().copied().filter(|&i| !self.scored.signals[i].is_thanks)
    }

    fn thanks(&self) -> impl Iterator<Item = usize> + '_ {
        self.cluster.message_indices.iter().copied().filter(|&i| self.scored.signals[i].is_thanks)
    }

    fn sender(&self, index: usize) -> Option<IdentityId> {
        self.scored.senders[index].map(|id| self.registry.canonical(id))
    }

    fn wishers(&self) -> BTreeSet<IdentityId> {
        self.wishes().filter_map(|i| self.sender(i)).collect()
    }
}

fn outcome_from(candidates: Vec<IdentityId>) -> StrategyOutcome {
    match candidates.as_slice() {
        [] => StrategyOutcome::NoSignal,
        [only] => StrategyOutcome::Winner { identity: *only },
        _ => StrategyOutcome::Ambiguous { candidates },
    }
}

/// Exactly one distinct phone-bearing identity mentioned in the wishes wins
pub fn phone_mention(view: &ClusterView<'_>) -> (StrategyOutcome, Vec<EvidenceItem>) {
    let mut tally: BTreeMap<IdentityId, (String, usize)> = BTreeMap::new();
    for i in view.wishes() {
        for phone in &view.scored.signals[i].phone_mentions {
            if let Some(id) = view.registry.find_by_phone(phone) {
                tally.entry(id).or_insert_with(|| (phone.clone(), 0)).1 += 1;
            }
        }
    }

    let evidence = tally
        .iter()
        .map(|(&identity, (phone, mentions))| EvidenceItem::PhoneMention {
            cluster_id: view.cluster.id,
            identity,
            phone: phone.clone(),
            mentions: *mentions,
        })
        .collect();
    (outcome_from(tally.into_keys().collect()), evidence)
}

/// Mention counts per named identity across the wishes, most mentioned first
pub fn name_tally(view: &ClusterView<'_>) -> Vec<(IdentityId, usize)> {
    let mut tally: BTreeMap<IdentityId, usize> = BTreeMap::new();
    for i in view.wishes() {
        for &id in &view.scored.signals[i].name_mentions {
            *tally.entry(view.registry.canonical(id)).or_default() += 1;
        }
    }
    let mut ranked: Vec<(IdentityId, usize)> = tally.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
}

/// How far the most mentioned name leads the runner-up
pub fn name_lead(ranked: &[(IdentityId, usize)]) -> usize {
    match ranked {
        [] => 0,
        [(_, top)] => *top,
        [(_, top), (_, second), ..] => top - second,
    }
}

/// The most mentioned name wins when it leads the runner-up by `margin`
pub fn name_mention(view: &ClusterView<'_>, margin: usize) -> (StrategyOutcome, Vec<EvidenceItem>) {
    let ranked = name_tally(view);
    let evidence = ranked
        .iter()
        .map(|&(identity, mentions)| EvidenceItem::NameMention {
            cluster_id: view.cluster.id,
            identity,
            mentions,
        })
        .collect();

    let outcome = match ranked.first() {
        None => StrategyOutcome::NoSignal,
        Some(&(top, _)) if name_lead(&ranked) >= margin.max(1) => {
            StrategyOutcome::Winner { identity: top }
        }
        Some(_) => StrategyOutcome::Ambiguous {
            candidates: ranked.iter().map(|&(id, _)| id).collect(),
        },
    };
    (outcome, evidence)
}

/// The sole thanker who did not also wish is the honoree.
///
/// People named inside thanks responses are the wishers being thanked; they
/// are recorded but never win.
pub fn thanks(view: &ClusterView<'_>) -> (StrategyOutcome, Vec<EvidenceItem>) {
    let wishers = view.wishers();
    let mut responses: BTreeMap<IdentityId, usize> = BTreeMap::new();
    let mut addressed: BTreeSet<IdentityId> = BTreeSet::new();

    for i in view.thanks() {
        let signal = &view.scored.signals[i];
        if let Some(sender) = view.sender(i)
            && !wishers.contains(&sender)
        {
            *responses.entry(sender).or_default() += 1;
        }
        addressed.extend(signal.name_mentions.iter().map(|&id| view.registry.canonical(id)));
        addressed.extend(signal.phone_mentions.iter().filter_map(|p| view.registry.find_by_phone(p)));
    }

    let mut evidence: Vec<EvidenceItem> = responses
        .iter()
        .map(|(&identity, &count)| EvidenceItem::Thanks {
            cluster_id: view.cluster.id,
            identity,
            responses: count,
        })
        .collect();
    evidence.extend(addressed.into_iter().map(|identity| EvidenceItem::ThanksAddressed {
        cluster_id: view.cluster.id,
        identity,
    }));

    (outcome_from(responses.into_keys().collect()), evidence)
}

/// In a small group, the one participant who sent no wish is the honoree
pub fn elimination(view: &ClusterView<'_>, ceiling: usize) -> (StrategyOutcome, Vec<EvidenceItem>) {
    let participants: BTreeSet<IdentityId> = view.registry.senders().into_iter().collect();
    let group_size = participants.len();
    if group_size >= ceiling {
        let reason = format!("{group_size} participants, elimination needs fewer than {ceiling}");
        return (StrategyOutcome::NotApplicable { reason }, Vec::new());
    }
    if group_size < 2 {
        let reason = format!("{group_size} participant(s)");
        return (StrategyOutcome::NotApplicable { reason }, Vec::new());
    }

    let wishers = view.wishers();
    let silent: Vec<IdentityId> = participants.difference(&wishers).copied().collect();
    let outcome = outcome_from(silent);
    let evidence = outcome
        .winner()
        .map(|identity| EvidenceItem::Elimination { cluster_id: view.cluster.id, identity, group_size })
        .into_iter()
        .collect();
    (outcome, evidence)
}
