use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::identity::IdentityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingModifier {
    Belated,
    Advance,
}

/// Birthday evidence extracted from a single message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishSignal {
    pub message_index: usize,
    pub relevance: f64,
    /// Relevance reached the configured wish floor
    pub is_wish: bool,
    pub matched_patterns: Vec<String>,
    /// Normalized phone numbers referenced in the body
    pub phone_mentions: BTreeSet<String>,
    /// Registry identities whose names appear in the body
    pub name_mentions: BTreeSet<IdentityId>,
    /// Body matches a gratitude phrase
    pub gratitude: bool,
    /// Gratitude sent shortly after someone else's wish
    pub is_thanks: bool,
    pub modifiers: Vec<TimingModifier>,
}

impl WishSignal {
    pub fn empty(message_index: usize) -> Self {
        Self {
            message_index,
            relevance: 0.0,
            is_wish: false,
            matched_patterns: Vec::new(),
            phone_mentions: BTreeSet::new(),
            name_mentions: BTreeSet::new(),
            gratitude: false,
            is_thanks: false,
            modifiers: Vec::new(),
        }
    }

    /// Wishes and thanks responses both feed the cluster builder
    pub fn is_cluster_candidate(&self) -> bool {
        self.is_wish || self.is_thanks
    }

    pub fn has(&self, modifier: TimingModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}
