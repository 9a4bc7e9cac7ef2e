//! Honoree inference for a single cluster.
//!
//! Strategies run in the fixed order of [`Strategy::PRECEDENCE`]. Every
//! strategy runs and reports, the first one with a single winner decides, and
//! a later strategy naming a different winner is surfaced as an
//! [`AnalysisWarning::AmbiguousIdentity`] rather than overriding it.

pub mod strategies;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clustering::ScoredTranscript;
use crate::config::ResolverConfig;
use crate::identity::ParticipantRegistry;
use crate::models::{
    AnalysisWarning, BirthdayCluster, EvidenceItem, IdentityId, Strategy, StrategyOutcome,
    StrategyReport,
};

pub use strategies::{ClusterView, name_lead, name_tally};

/// Outcome of resolving one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResolution {
    pub cluster_id: usize,
    pub target: Option<IdentityId>,
    pub decided_by: Option<Strategy>,
    pub strategies: Vec<StrategyReport>,
    pub evidence: Vec<EvidenceItem>,
    pub warnings: Vec<AnalysisWarning>,
}

impl ClusterResolution {
    pub fn outcome(&self, strategy: Strategy) -> Option<&StrategyOutcome> {
        self.strategies.iter().find(|r| r.strategy == strategy).map(|r| &r.outcome)
    }
}

pub struct TargetResolver<'a> {
    registry: &'a ParticipantRegistry,
    config: &'a ResolverConfig,
}

impl<'a> TargetResolver<'a> {
    pub fn new(registry: &'a ParticipantRegistry, config: &'a ResolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn resolve(&self, cluster: &BirthdayCluster, scored: ScoredTranscript<'_>) -> ClusterResolution {
        let view = ClusterView { cluster, scored, registry: self.registry };

        let mut reports = Vec::with_capacity(Strategy::PRECEDENCE.len());
        let mut evidence = Vec::new();
        for strategy in Strategy::PRECEDENCE {
            let (outcome, items) = match strategy {
                Strategy::PhoneMention => strategies::phone_mention(&view),
                Strategy::NameMention => {
                    strategies::name_mention(&view, self.config.name_dominance_margin)
                }
                Strategy::Thanks => strategies::thanks(&view),
                Strategy::Elimination => {
                    strategies::elimination(&view, self.config.elimination_group_ceiling)
                }
            };
            evidence.extend(items);
            reports.push(StrategyReport { strategy, outcome });
        }

        let mut target = None;
        let mut decided_by = None;
        let mut warnings = Vec::new();
        for report in &reports {
            let Some(winner) = report.outcome.winner() else {
                continue;
            };
            match (target, decided_by) {
                (None, _) => {
                    target = Some(winner);
                    decided_by = Some(report.strategy);
                }
                (Some(chosen), Some(first)) if chosen != winner => {
                    warnings.push(AnalysisWarning::AmbiguousIdentity {
                        detail: format!(
                            "cluster {}: {} chose {} but {} chose {}",
                            cluster.id,
                            first.as_str(),
                            chosen,
                            report.strategy.as_str(),
                            winner
                        ),
                        identities: sorted_pair(chosen, winner),
                    });
                }
                _ => {}
            }
        }

        if target.is_none() {
            warnings.push(AnalysisWarning::UnresolvedTarget {
                cluster_id: cluster.id,
                date: cluster.birthday_date,
            });
        }

        debug!(
            cluster = cluster.id,
            target = ?target,
            decided_by = ?decided_by.map(|s| s.as_str()),
            "Resolved cluster"
        );

        ClusterResolution {
            cluster_id: cluster.id,
            target,
            decided_by,
            strategies: reports,
            evidence,
            warnings,
        }
    }
}

fn sorted_pair(a: IdentityId, b: IdentityId) -> Vec<IdentityId> {
    if a <= b { vec![a, b] } else { vec![b, a] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, MessageKind, SignalSummary, WishSignal};
    use chrono::{NaiveDate, NaiveDateTime};

    struct Chat {
        registry: ParticipantRegistry,
        messages: Vec<Message>,
        signals: Vec<WishSignal>,
        senders: Vec<Option<IdentityId>>,
    }

    impl Chat {
        fn new(participants: &[&str]) -> Self {
            let registry = ParticipantRegistry::default();
            for (i, name) in participants.iter().enumerate() {
                let id = registry.resolve_or_create(name, None);
                registry.record_sighting(id, i, true);
            }
            Self { registry, messages: Vec::new(), signals: Vec::new(), senders: Vec::new() }
        }

        fn id(&self, name: &str) -> IdentityId {
            self.registry.resolve_or_create(name, None)
        }

        fn add(&mut self, sender: &str, thanks: bool, names: &[&str], phones: &[&str]) {
            let index = self.messages.len();
            let ts: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 4, 26)
                .unwrap()
                .and_hms_opt(15, index as u32, 0)
                .unwrap();
            self.messages.push(Message {
                index,
                timestamp: ts,
                sender: sender.to_string(),
                body: String::new(),
                kind: MessageKind::Text,
            });
            let mut signal = WishSignal::empty(index);
            signal.is_wish = !thanks;
            signal.is_thanks = thanks;
            signal.name_mentions = names.iter().map(|n| self.id(n)).collect();
            for phone in phones {
                self.registry.resolve_phone(phone);
                signal.phone_mentions.insert(crate::identity::normalize_phone(phone).unwrap());
            }
            self.signals.push(signal);
            let sender = self.id(sender);
            self.senders.push(Some(sender));
        }

        fn resolve(&self, config: &ResolverConfig) -> ClusterResolution {
            let date = NaiveDate::from_ymd_opt(2024, 4, 26).unwrap();
            let cluster = BirthdayCluster {
                id: 0,
                message_indices: (0..self.messages.len()).collect(),
                start: self.messages[0].timestamp,
                end: self.messages[self.messages.len() - 1].timestamp,
                anchor_date: date,
                birthday_date: date,
                wishers: Vec::new(),
                summary: SignalSummary::default(),
            };
            let scored = ScoredTranscript {
                messages: &self.messages,
                signals: &self.signals,
                senders: &self.senders,
            };
            TargetResolver::new(&self.registry, config).resolve(&cluster, scored)
        }
    }

    fn many(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_sole_thanker_wins_by_thanks() {
        let mut chat = Chat::new(&["Alice", "Bob", "Carol", "Sarah", "Dan", "Eve", "Fay", "Gus", "Hal"]);
        chat.add("Alice", false, &[], &[]);
        chat.add("Bob", false, &["Sarah"], &[]);
        chat.add("Carol", false, &[], &[]);
        chat.add("Sarah", true, &[], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        assert_eq!(resolution.target, Some(chat.id("Sarah")));
        assert_eq!(resolution.decided_by, Some(Strategy::Thanks));
        assert!(matches!(
            resolution.outcome(Strategy::NameMention),
            Some(StrategyOutcome::Ambiguous { .. })
        ));
        assert!(matches!(
            resolution.outcome(Strategy::Elimination),
            Some(StrategyOutcome::NotApplicable { .. })
        ));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_phone_beats_name_counts() {
        let mut chat = Chat::new(&["Alice", "Bob", "Rohan", "Meera", "Kiran"]);
        chat.add("Alice", false, &["Rohan", "Meera", "Kiran"], &["@919545598844"]);
        chat.add("Bob", false, &["Rohan"], &[]);
        chat.add("Alice", false, &["Rohan"], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        let phone_id = chat.registry.find_by_phone("9545598844").unwrap();
        assert_eq!(resolution.target, Some(phone_id));
        assert_eq!(resolution.decided_by, Some(Strategy::PhoneMention));
        // Rohan leads by two, so name-mention disagrees
        assert_eq!(resolution.outcome(Strategy::NameMention).unwrap().winner(), Some(chat.id("Rohan")));
        assert!(matches!(
            resolution.warnings.as_slice(),
            [AnalysisWarning::AmbiguousIdentity { .. }]
        ));
    }

    #[test]
    fn test_name_dominance_margin() {
        let mut chat = Chat::new(&["Alice", "Bob", "Carol", "Sarah"]);
        chat.add("Alice", false, &["Sarah"], &[]);
        chat.add("Bob", false, &["Sarah"], &[]);
        chat.add("Carol", false, &[], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        assert_eq!(resolution.decided_by, Some(Strategy::NameMention));
        assert_eq!(resolution.target, Some(chat.id("Sarah")));
    }

    #[test]
    fn test_elimination_in_small_group() {
        let mut chat = Chat::new(&["Alice", "Bob", "Carol", "Sarah"]);
        chat.add("Alice", false, &[], &[]);
        chat.add("Bob", false, &[], &[]);
        chat.add("Carol", false, &[], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        assert_eq!(resolution.decided_by, Some(Strategy::Elimination));
        assert_eq!(resolution.target, Some(chat.id("Sarah")));
        assert!(resolution.evidence.iter().any(|e| matches!(e, EvidenceItem::Elimination { group_size: 4, .. })));
    }

    #[test]
    fn test_unresolved_in_large_group() {
        let names = many("person", 12);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut chat = Chat::new(&refs);
        for name in &refs[..5] {
            chat.add(name, false, &[], &[]);
        }

        let resolution = chat.resolve(&ResolverConfig::default());
        assert_eq!(resolution.target, None);
        assert!(resolution.evidence.is_empty());
        assert!(matches!(
            resolution.warnings.as_slice(),
            [AnalysisWarning::UnresolvedTarget { cluster_id: 0, .. }]
        ));
    }

    #[test]
    fn test_thanker_who_also_wished_is_ignored() {
        let mut chat = Chat::new(&["Alice", "Bob", "Carol", "Dan", "Eve", "Fay", "Gus", "Hal"]);
        chat.add("Alice", false, &[], &[]);
        chat.add("Bob", false, &[], &[]);
        chat.add("Alice", true, &["Bob"], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        assert_eq!(resolution.outcome(Strategy::Thanks), Some(&StrategyOutcome::NoSignal));
        assert!(resolution.evidence.iter().any(|e| matches!(e, EvidenceItem::ThanksAddressed { .. })));
    }

    #[test]
    fn test_person_named_in_thanks_reply_never_wins() {
        let mut chat = Chat::new(&["Alice", "Bob", "Carol", "Dan", "Eve", "Fay", "Gus", "Sarah"]);
        chat.add("Alice", false, &[], &[]);
        chat.add("Carol", false, &[], &[]);
        chat.add("Sarah", true, &["Bob"], &[]);

        let resolution = chat.resolve(&ResolverConfig::default());
        let (sarah, bob) = (chat.id("Sarah"), chat.id("Bob"));
        assert_eq!(
            resolution.outcome(Strategy::Thanks),
            Some(&StrategyOutcome::Winner { identity: sarah })
        );
        assert_eq!(resolution.target, Some(sarah));
        let addressed = EvidenceItem::ThanksAddressed { cluster_id: 0, identity: bob };
        assert!(resolution.evidence.contains(&addressed));
    }

    #[test]
    fn test_all_strategies_reported_in_order() {
        let mut chat = Chat::new(&["Alice", "Bob"]);
        chat.add("Alice", false, &[], &[]);
        let resolution = chat.resolve(&ResolverConfig::default());
        let order: Vec<Strategy> = resolution.strategies.iter().map(|r| r.strategy).collect();
        assert_eq!(order, Strategy::PRECEDENCE.to_vec());
    }
}
