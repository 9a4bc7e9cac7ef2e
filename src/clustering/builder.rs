use std::collections::BTreeSet;

use chrono::{Days, Duration, NaiveDate};
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::models::{
    BirthdayCluster, IdentityId, Message, SignalSummary, TimingModifier, WishSignal,
};

/// Parsed messages with their signals and canonical senders, index-aligned
#[derive(Debug, Clone, Copy)]
pub struct ScoredTranscript<'a> {
    pub messages: &'a [Message],
    pub signals: &'a [WishSignal],
    pub senders: &'a [Option<IdentityId>],
}

impl<'a> ScoredTranscript<'a> {
    /// Wish and thanks messages ordered by timestamp, then transcript index
    pub fn candidates(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .signals
            .iter()
            .filter(|s| s.is_cluster_candidate())
            .map(|s| s.message_index)
            .collect();
        indices.sort_by_key(|&i| (self.messages[i].timestamp, i));
        indices
    }
}

/// Group wish and thanks messages into celebration bursts.
///
/// A single pass over candidates in time order: a candidate joins the open
/// cluster when it follows the cluster's latest message by at most
/// `window_hours`, otherwise the open cluster is closed and a new one starts.
/// Closed clusters with fewer than `min_wishers` distinct wish senders are
/// dropped; in a chat with at most two participants one wisher is enough.
pub fn build_clusters(
    scored: &ScoredTranscript<'_>,
    config: &ClusteringConfig,
    participant_count: usize,
) -> Vec<BirthdayCluster> {
    let window = Duration::hours(i64::from(config.window_hours));
    let min_wishers = if participant_count <= 2 {
        config.min_wishers.min(1)
    } else {
        config.min_wishers
    };

    let mut clusters = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut dropped = 0usize;

    let mut close = |members: Vec<usize>, clusters: &mut Vec<BirthdayCluster>| {
        if members.is_empty() {
            return;
        }
        let cluster = assemble(clusters.len(), members, scored);
        if cluster.wisher_count() >= min_wishers {
            clusters.push(cluster);
        } else {
            dropped += 1;
        }
    };

    for index in scored.candidates() {
        if let Some(&last) = open.last()
            && scored.messages[index].timestamp - scored.messages[last].timestamp > window
        {
            close(std::mem::take(&mut open), &mut clusters);
        }
        open.push(index);
    }
    close(open, &mut clusters);

    debug!(clusters = clusters.len(), dropped, min_wishers, "Built clusters");
    clusters
}

fn assemble(id: usize, members: Vec<usize>, scored: &ScoredTranscript<'_>) -> BirthdayCluster {
    let mut summary = SignalSummary::default();
    let mut wishers = BTreeSet::new();

    for &i in &members {
        let signal = &scored.signals[i];
        summary.phone_mentions += signal.phone_mentions.len();
        summary.name_mentions += signal.name_mentions.len();
        if signal.is_thanks {
            summary.thanks_count += 1;
            continue;
        }
        summary.wish_count += 1;
        summary.total_relevance += signal.relevance;
        if signal.has(TimingModifier::Belated) {
            summary.belated_count += 1;
        }
        if signal.has(TimingModifier::Advance) {
            summary.advance_count += 1;
        }
        if let Some(sender) = scored.senders[i] {
            wishers.insert(sender);
        }
    }

    // `members` is non-empty and time-ordered
    let start = scored.messages[members[0]].timestamp;
    let end = scored.messages[members[members.len() - 1]].timestamp;
    let anchor_date = start.date();

    BirthdayCluster {
        id,
        message_indices: members,
        start,
        end,
        anchor_date,
        birthday_date: corrected_date(anchor_date, &summary),
        wishers: wishers.into_iter().collect(),
        summary,
    }
}

/// Shift the anchor a day back when most wishes are belated, a day forward
/// when most are early
fn corrected_date(anchor: NaiveDate, summary: &SignalSummary) -> NaiveDate {
    let majority = |count: usize| count * 2 > summary.wish_count;
    if majority(summary.belated_count) {
        anchor.checked_sub_days(Days::new(1)).unwrap_or(anchor)
    } else if majority(summary.advance_count) {
        anchor.checked_add_days(Days::new(1)).unwrap_or(anchor)
    } else {
        anchor
    }
}
