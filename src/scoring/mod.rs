//! Wish detection.
//!
//! Text scoring ([`WishScorer`]) is pure and runs in parallel across
//! messages. Mention extraction and thanks marking consult the registry and
//! neighbouring messages, so they run afterwards in message order.

pub mod mentions;
pub mod thanks;
pub mod wish;

use rayon::prelude::*;

use crate::models::{Message, WishSignal};

pub use mentions::{MentionExtractor, phone_references};
pub use thanks::mark_thanks_responses;
pub use wish::WishScorer;

/// Score every message, returning signals in message order
pub fn score_messages(scorer: &WishScorer, messages: &[Message]) -> Vec<WishSignal> {
    messages.par_iter().map(|message| scorer.score(message)).collect()
}
