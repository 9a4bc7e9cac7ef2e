use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::matching::name_matches;
use super::normalize::{NameNormalizer, looks_like_phone, normalize_phone};
use crate::config::AnalysisConfig;
use crate::error::ConfigError;
use crate::models::{IdentityId, IdentityKey, ParticipantIdentity};

/// A merge the registry declined because more than one identity fit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityNote {
    pub detail: String,
    pub identities: Vec<IdentityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasOutcome {
    Added,
    AlreadyKnown,
    /// The alias already belongs to this other identity; nothing changed
    Conflict(IdentityId),
}

#[derive(Debug)]
struct Entry {
    identity: ParticipantIdentity,
    merged_into: Option<IdentityId>,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: Vec<Entry>,
    alias_index: BTreeMap<String, IdentityId>,
    phone_index: BTreeMap<String, IdentityId>,
    notes: Vec<AmbiguityNote>,
}

impl RegistryState {
    fn canonical(&self, mut id: IdentityId) -> IdentityId {
        while let Some(next) = self.entries.get(id.0).and_then(|e| e.merged_into) {
            id = next;
        }
        id
    }

    fn identity(&self, id: IdentityId) -> &ParticipantIdentity {
        &self.entries[self.canonical(id).0].identity
    }

    fn identity_mut(&mut self, id: IdentityId) -> &mut ParticipantIdentity {
        let id = self.canonical(id);
        &mut self.entries[id.0].identity
    }

    fn create(&mut self, key: IdentityKey, display_name: &str, alias: Option<&str>) -> IdentityId {
        let id = IdentityId(self.entries.len());
        let mut identity = ParticipantIdentity {
            id,
            key: key.clone(),
            display_name: display_name.trim().to_string(),
            aliases: BTreeSet::new(),
            phones: BTreeSet::new(),
            first_seen: None,
            last_seen: None,
            sent_messages: 0,
        };
        if let IdentityKey::Phone(phone) = &key {
            identity.phones.insert(phone.clone());
            self.phone_index.insert(phone.clone(), id);
        }
        if let Some(alias) = alias {
            identity.aliases.insert(alias.to_string());
            self.alias_index.insert(alias.to_string(), id);
        }
        self.entries.push(Entry { identity, merged_into: None });
        debug!(id = %id, key = %key, "Created identity");
        id
    }

    fn add_alias(&mut self, id: IdentityId, alias: &str) -> AliasOutcome {
        let id = self.canonical(id);
        match self.alias_index.get(alias).map(|&owner| self.canonical(owner)) {
            Some(owner) if owner == id => AliasOutcome::AlreadyKnown,
            Some(owner) => {
                self.note(
                    format!("alias '{alias}' already belongs to {owner}, not added to {id}"),
                    vec![owner, id],
                );
                AliasOutcome::Conflict(owner)
            }
            None => {
                self.alias_index.insert(alias.to_string(), id);
                self.identity_mut(id).aliases.insert(alias.to_string());
                AliasOutcome::Added
            }
        }
    }

    /// Fold `from` into `into`. Callers check that `from` is name-only.
    fn merge(&mut self, from: IdentityId, into: IdentityId) {
        let absorbed = self.entries[from.0].identity.clone();
        self.entries[from.0].merged_into = Some(into);

        for alias in &absorbed.aliases {
            self.alias_index.insert(alias.clone(), into);
        }
        for phone in &absorbed.phones {
            self.phone_index.insert(phone.clone(), into);
        }

        let target = &mut self.entries[into.0].identity;
        // Phone-keyed identities created from a bare mention only know the number
        if looks_like_phone(&target.display_name) && !absorbed.display_name.is_empty() {
            target.display_name = absorbed.display_name.clone();
        }
        target.aliases.extend(absorbed.aliases);
        target.phones.extend(absorbed.phones);
        target.first_seen = min_opt(target.first_seen, absorbed.first_seen);
        target.last_seen = target.last_seen.max(absorbed.last_seen);
        target.sent_messages += absorbed.sent_messages;

        debug!(from = %from, into = %into, "Merged name identity into phone identity");
    }

    fn note(&mut self, detail: String, mut identities: Vec<IdentityId>) {
        identities.sort();
        identities.dedup();
        warn!(detail = %detail, "Identity ambiguity");
        self.notes.push(AmbiguityNote { detail, identities });
    }
}

fn min_opt(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Canonical participant identities for one transcript.
///
/// Handles returned by the registry stay valid for its whole lifetime; after a
/// merge, [`canonical`](Self::canonical) maps an absorbed handle to the
/// identity that absorbed it. All mutation goes through a single write lock
/// so two first sightings of the same phone cannot create two identities.
#[derive(Debug)]
pub struct ParticipantRegistry {
    normalizer: NameNormalizer,
    state: RwLock<RegistryState>,
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new(NameNormalizer::default())
    }
}

impl ParticipantRegistry {
    pub fn new(normalizer: NameNormalizer) -> Self {
        Self { normalizer, state: RwLock::new(RegistryState::default()) }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(NameNormalizer::from_config(config)?))
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the identity for a display name, creating it on first sight.
    ///
    /// With a phone (from `phone_hint`, or because the name itself is a phone
    /// number) the result is phone-keyed, and a name-only identity already
    /// holding this alias is merged into it. Without one, the normalized
    /// name is the key.
    pub fn resolve_or_create(&self, raw_name: &str, phone_hint: Option<&str>) -> IdentityId {
        let phone = phone_hint
            .and_then(normalize_phone)
            .or_else(|| looks_like_phone(raw_name).then(|| normalize_phone(raw_name)).flatten());
        let alias = self.normalizer.normalize(raw_name);

        let mut state = self.write();
        let alias_owner = state.alias_index.get(&alias).map(|&id| state.canonical(id));

        let Some(phone) = phone else {
            return match alias_owner {
                Some(id) => id,
                None => state.create(IdentityKey::Name(alias.clone()), raw_name, Some(&alias)),
            };
        };

        let phone_owner = state.phone_index.get(&phone).map(|&id| state.canonical(id));
        let id = match phone_owner {
            Some(id) => id,
            None => state.create(IdentityKey::Phone(phone.clone()), raw_name, None),
        };

        match alias_owner {
            None => {
                state.add_alias(id, &alias);
            }
            Some(owner) if owner == id => {}
            Some(owner) if !state.identity(owner).key.is_phone() => state.merge(owner, id),
            Some(owner) => state.note(
                format!("'{raw_name}' is known under {owner} but phone {phone} belongs to {id}"),
                vec![owner, id],
            ),
        }
        id
    }

    /// Find or create the phone-keyed identity for a mentioned number
    pub fn resolve_phone(&self, raw_phone: &str) -> Option<IdentityId> {
        let phone = normalize_phone(raw_phone)?;
        let mut state = self.write();
        if let Some(&id) = state.phone_index.get(&phone) {
            return Some(state.canonical(id));
        }
        Some(state.create(IdentityKey::Phone(phone), raw_phone.trim_start_matches('@'), None))
    }

    pub fn record_alias(&self, id: IdentityId, alias: &str) -> AliasOutcome {
        let alias = self.normalizer.normalize(alias);
        self.write().add_alias(id, &alias)
    }

    /// Merge a name-only identity into a phone-keyed one seen in the same
    /// message. Declines (with a note) when `name_id` already carries a
    /// different phone.
    pub fn merge_into_phone(&self, name_id: IdentityId, phone_id: IdentityId) -> bool {
        let mut state = self.write();
        let from = state.canonical(name_id);
        let into = state.canonical(phone_id);
        if from == into || !state.identity(into).key.is_phone() {
            return false;
        }
        if state.identity(from).key.is_phone() {
            state.note(
                format!("{from} and {into} are both phone-keyed; not merged"),
                vec![from, into],
            );
            return false;
        }
        state.merge(from, into);
        true
    }

    /// Record that `id` appeared at `message_index`, as sender or mention
    pub fn record_sighting(&self, id: IdentityId, message_index: usize, sent: bool) {
        let mut state = self.write();
        let identity = state.identity_mut(id);
        identity.first_seen = min_opt(identity.first_seen, Some(message_index));
        identity.last_seen = identity.last_seen.max(Some(message_index));
        if sent {
            identity.sent_messages += 1;
        }
    }

    pub fn find_by_phone(&self, number: &str) -> Option<IdentityId> {
        let phone = normalize_phone(number)?;
        let state = self.read();
        state.phone_index.get(&phone).map(|&id| state.canonical(id))
    }

    /// Identities with an alias matching `text`, in handle order.
    ///
    /// Purely numeric fragments never match; phones go through
    /// [`find_by_phone`](Self::find_by_phone).
    pub fn find_by_name_fragment(&self, text: &str) -> Vec<IdentityId> {
        let fragment = self.normalizer.normalize(text);
        if fragment.is_empty() || fragment.chars().all(|c| c.is_ascii_digit() || c == ' ') {
            return Vec::new();
        }

        let state = self.read();
        let found: BTreeSet<IdentityId> = state
            .alias_index
            .iter()
            .filter(|(alias, _)| name_matches(&fragment, alias))
            .map(|(_, &id)| state.canonical(id))
            .collect();
        found.into_iter().collect()
    }

    pub fn canonical(&self, id: IdentityId) -> IdentityId {
        self.read().canonical(id)
    }

    /// Snapshot of the canonical identity behind `id`
    pub fn identity(&self, id: IdentityId) -> Option<ParticipantIdentity> {
        let state = self.read();
        let canonical = state.canonical(id);
        state.entries.get(canonical.0).map(|e| e.identity.clone())
    }

    /// All canonical identities in handle order
    pub fn identities(&self) -> Vec<ParticipantIdentity> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.merged_into.is_none())
            .map(|e| e.identity.clone())
            .collect()
    }

    /// Canonical identities that sent at least one message
    pub fn senders(&self) -> Vec<IdentityId> {
        self.read()
            .entries
            .iter()
            .filter(|e| e.merged_into.is_none() && e.identity.is_sender())
            .map(|e| e.identity.id)
            .collect()
    }

    pub fn notes(&self) -> Vec<AmbiguityNote> {
        self.read().notes.clone()
    }

    /// Number of canonical identities
    pub fn len(&self) -> usize {
        self.read().entries.iter().filter(|e| e.merged_into.is_none()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_resolve_is_stable() {
        let registry = ParticipantRegistry::default();
        let a = registry.resolve_or_create("Sarah", None);
        let b = registry.resolve_or_create("  sarah ", None);
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_prefixed_name_resolves_to_same_identity() {
        let registry = ParticipantRegistry::default();
        let a = registry.resolve_or_create("Priya K", None);
        let b = registry.resolve_or_create("Ms - Priya K", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_phone_sender_is_phone_keyed() {
        let registry = ParticipantRegistry::default();
        let id = registry.resolve_or_create("+91 95455 98844", None);
        let identity = registry.identity(id).unwrap();
        assert_eq!(identity.key, IdentityKey::Phone("9545598844".to_string()));
        assert_eq!(registry.find_by_phone("9545598844"), Some(id));
        assert_eq!(registry.find_by_phone("+919545598844"), Some(id));
    }

    #[test]
    fn test_phone_hint_merges_existing_name_identity() {
        let registry = ParticipantRegistry::default();
        let name_id = registry.resolve_or_create("Sarah", None);
        registry.record_sighting(name_id, 3, true);

        let phone_id = registry.resolve_or_create("Sarah", Some("+91 95455 98844"));
        assert_ne!(name_id, phone_id);
        assert_eq!(registry.canonical(name_id), phone_id);

        let merged = registry.identity(name_id).unwrap();
        assert!(merged.key.is_phone());
        assert_eq!(merged.sent_messages, 1);
        assert_eq!(merged.display_name, "Sarah");
        assert_eq!(registry.resolve_or_create("Sarah", None), phone_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_merge_into_phone_takes_display_name() {
        let registry = ParticipantRegistry::default();
        let phone_id = registry.resolve_phone("@919545598844").unwrap();
        let name_id = registry.resolve_or_create("Sarah", None);

        assert!(registry.merge_into_phone(name_id, phone_id));
        let merged = registry.identity(phone_id).unwrap();
        assert_eq!(merged.display_name, "Sarah");
        assert!(merged.aliases.contains("sarah"));
        assert_eq!(registry.find_by_name_fragment("sarah"), vec![phone_id]);
    }

    #[test]
    fn test_two_phone_identities_never_merge() {
        let registry = ParticipantRegistry::default();
        let a = registry.resolve_phone("9545598844").unwrap();
        let b = registry.resolve_phone("9876543210").unwrap();
        assert!(!registry.merge_into_phone(a, b));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.notes().len(), 1);
        assert_eq!(registry.notes()[0].identities, vec![a, b]);
    }

    #[test]
    fn test_alias_conflict_is_noted() {
        let registry = ParticipantRegistry::default();
        let sarah = registry.resolve_or_create("Sarah", None);
        let other = registry.resolve_or_create("Sally", None);

        assert_eq!(registry.record_alias(other, "Sarah"), AliasOutcome::Conflict(sarah));
        assert_eq!(registry.record_alias(sarah, "sarah"), AliasOutcome::AlreadyKnown);
        assert_eq!(registry.record_alias(sarah, "Sarah K"), AliasOutcome::Added);
        assert_eq!(registry.resolve_or_create("Sarah", None), sarah);
        assert_eq!(registry.notes().len(), 1);
    }

    #[test]
    fn test_name_known_under_other_phone_is_not_merged() {
        let registry = ParticipantRegistry::default();
        let first = registry.resolve_or_create("Sarah", Some("9545598844"));
        let second = registry.resolve_or_create("Sarah", Some("9876543210"));
        assert_ne!(first, second);
        assert_eq!(registry.resolve_or_create("Sarah", None), first);
        assert_eq!(registry.notes().len(), 1);
    }

    #[test]
    fn test_find_by_name_fragment() {
        let registry = ParticipantRegistry::default();
        let sarah = registry.resolve_or_create("Sarah Khan", None);
        let sam = registry.resolve_or_create("Sam", None);

        assert_eq!(registry.find_by_name_fragment("Sarah"), vec![sarah]);
        assert_eq!(registry.find_by_name_fragment("SAM"), vec![sam]);
        assert!(registry.find_by_name_fragment("bob").is_empty());
        assert!(registry.find_by_name_fragment("12345").is_empty());
    }

    #[test]
    fn test_sightings_track_first_last_and_sent() {
        let registry = ParticipantRegistry::default();
        let id = registry.resolve_or_create("Sarah", None);
        registry.record_sighting(id, 5, true);
        registry.record_sighting(id, 2, false);
        registry.record_sighting(id, 9, true);

        let identity = registry.identity(id).unwrap();
        assert_eq!(identity.first_seen, Some(2));
        assert_eq!(identity.last_seen, Some(9));
        assert_eq!(identity.sent_messages, 2);
        assert_eq!(registry.senders(), vec![id]);
    }

    #[test]
    fn test_concurrent_first_sightings_create_one_identity() {
        let registry = Arc::new(ParticipantRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let name = if i % 2 == 0 { "+91 95455 98844" } else { "919545598844" };
                thread::spawn(move || registry.resolve_or_create(name, None))
            })
            .collect();

        let ids: BTreeSet<IdentityId> =
            handles.into_iter().map(|h| registry.canonical(h.join().unwrap())).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
