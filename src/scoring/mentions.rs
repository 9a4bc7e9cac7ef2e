use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::{ScoringConfig, vocabulary};
use crate::identity::{ParticipantRegistry, normalize_phone};
use crate::models::{IdentityId, Message, WishSignal};

const MIN_NAME_TOKEN_CHARS: usize = 3;

fn at_phone_pattern() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"@\+?\d{7,15}").expect("valid @phone pattern"))
}

fn spaced_phone_pattern() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\+\d{1,3}[\s-]?\d{5}[\s-]?\d{5}").expect("valid spaced phone pattern")
    })
}

/// Phone numbers referenced in `body`, as `(raw, normalized)` pairs in order
/// of first appearance
pub fn phone_references(body: &str) -> Vec<(String, String)> {
    let mut seen = BTreeSet::new();
    let mut found: Vec<(usize, String, String)> = Vec::new();
    for pattern in [at_phone_pattern(), spaced_phone_pattern()] {
        for m in pattern.find_iter(body) {
            if let Some(phone) = normalize_phone(m.as_str())
                && seen.insert(phone.clone())
            {
                found.push((m.start(), m.as_str().to_string(), phone));
            }
        }
    }
    found.sort_by_key(|(start, _, _)| *start);
    found.into_iter().map(|(_, raw, phone)| (raw, phone)).collect()
}

/// Finds phone and name mentions in wish and thanks messages
pub struct MentionExtractor<'a> {
    registry: &'a ParticipantRegistry,
    excluded: BTreeSet<String>,
}

impl<'a> MentionExtractor<'a> {
    pub fn new(registry: &'a ParticipantRegistry, scoring: &ScoringConfig) -> Self {
        let phrase_words = scoring
            .strong_phrases
            .iter()
            .chain(&scoring.weak_phrases)
            .chain(&scoring.thanks_phrases)
            .chain(&scoring.belated_markers)
            .chain(&scoring.advance_markers)
            .flat_map(|phrase| {
                phrase
                    .split(|c: char| !c.is_alphanumeric())
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            });
        let excluded = vocabulary::MENTION_STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(phrase_words)
            .filter(|w| !w.is_empty())
            .collect();
        Self { registry, excluded }
    }

    fn name_tokens(&self, body: &str) -> BTreeSet<String> {
        body.split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|t| t.chars().count() >= MIN_NAME_TOKEN_CHARS)
            .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
            .filter(|t| !self.excluded.contains(t))
            .collect()
    }

    /// Fill `signal`'s phone and name mentions for `message`.
    ///
    /// Unknown phones become phone-keyed identities. When the message names
    /// exactly one phone and exactly one name-only identity, the name is
    /// merged into the phone identity. The sender is never a name mention of
    /// their own message.
    pub fn extract(&self, message: &Message, sender: Option<IdentityId>, signal: &mut WishSignal) {
        let sender = sender.map(|id| self.registry.canonical(id));

        let mut phone_ids = BTreeSet::new();
        let mut without_phones = message.body.clone();
        for (raw, phone) in phone_references(&message.body) {
            if let Some(id) = self.registry.resolve_phone(&raw) {
                self.registry.record_sighting(id, message.index, false);
                phone_ids.insert(id);
            }
            signal.phone_mentions.insert(phone);
            without_phones = without_phones.replace(&raw, " ");
        }

        let mut names: BTreeSet<IdentityId> = BTreeSet::new();
        for token in self.name_tokens(&without_phones) {
            for id in self.registry.find_by_name_fragment(&token) {
                if Some(id) != sender {
                    names.insert(id);
                }
            }
        }

        if let [phone_id] = phone_ids.iter().copied().collect::<Vec<_>>()[..] {
            let name_only: Vec<IdentityId> = names
                .iter()
                .copied()
                .filter(|&id| id != phone_id)
                .filter(|&id| {
                    self.registry.identity(id).is_some_and(|identity| !identity.key.is_phone())
                })
                .collect();
            if let [name_id] = name_only[..]
                && self.registry.merge_into_phone(name_id, phone_id)
            {
                debug!(
                    message = message.index,
                    name = %name_id,
                    phone = %phone_id,
                    "Merged co-mentioned name into phone identity"
                );
            }
        }

        for id in names {
            let id = self.registry.canonical(id);
            self.registry.record_sighting(id, message.index, false);
            signal.name_mentions.insert(id);
        }
    }
}
