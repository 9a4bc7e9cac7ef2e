//! Name fragment matching by normalized token overlap.
//!
//! Both sides are expected to be normalized already (see
//! [`NameNormalizer`](super::NameNormalizer)). A fragment token matches an
//! alias token when they are equal, or when the shorter is a prefix of the
//! longer and has at least [`MIN_PREFIX_CHARS`] characters ("sara" matches
//! "sarah", "sa" does not).

/// Fraction of fragment tokens that must match for a name match
pub const OVERLAP_THRESHOLD: f64 = 0.5;

pub const MIN_PREFIX_CHARS: usize = 4;

fn tokens_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
    short.chars().count() >= MIN_PREFIX_CHARS && long.starts_with(short)
}

/// Fraction (0-1) of `fragment` tokens matching some token of `alias`
pub fn token_overlap(fragment: &str, alias: &str) -> f64 {
    let fragment_tokens: Vec<&str> = fragment.split_whitespace().collect();
    if fragment_tokens.is_empty() {
        return 0.0;
    }
    let alias_tokens: Vec<&str> = alias.split_whitespace().collect();
    let matched = fragment_tokens
        .iter()
        .filter(|f| alias_tokens.iter().any(|a| tokens_match(f, a)))
        .count();
    matched as f64 / fragment_tokens.len() as f64
}

/// Whether a normalized fragment refers to a normalized alias
pub fn name_matches(fragment: &str, alias: &str) -> bool {
    if fragment.is_empty() || alias.is_empty() {
        return false;
    }
    if token_overlap(fragment, alias) >= OVERLAP_THRESHOLD {
        return true;
    }
    fragment.chars().count() >= MIN_PREFIX_CHARS && alias.contains(fragment)
}
