use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle into the participant registry.
///
/// Handles stay valid after merges: the registry redirects a merged handle to
/// its canonical identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IdentityId(pub usize);

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    Phone(String),
    Name(String),
}

impl IdentityKey {
    pub fn is_phone(&self) -> bool {
        matches!(self, IdentityKey::Phone(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Phone(phone) => write!(f, "phone:{}", phone),
            IdentityKey::Name(name) => write!(f, "name:{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    pub id: IdentityId,
    pub key: IdentityKey,
    /// First raw display name observed for this person
    pub display_name: String,
    /// Normalized aliases
    pub aliases: BTreeSet<String>,
    /// Normalized phone numbers
    pub phones: BTreeSet<String>,
    pub first_seen: Option<usize>,
    pub last_seen: Option<usize>,
    /// Number of transcript messages this person sent
    pub sent_messages: usize,
}

impl ParticipantIdentity {
    pub fn is_sender(&self) -> bool {
        self.sent_messages > 0
    }
}
