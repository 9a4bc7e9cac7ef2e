use regex::Regex;

use crate::config::AnalysisConfig;
use crate::error::ConfigError;

const MIN_PHONE_DIGITS: usize = 7;
const LOCAL_PHONE_DIGITS: usize = 10;

/// Reduce a phone number to its comparable form.
///
/// Separators are dropped and anything longer than a local ten-digit number
/// keeps only its last ten digits, so `+91 95455 98844` and `9545598844`
/// normalize to the same value. Fewer than seven digits is not a phone.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return None;
    }
    if digits.len() > LOCAL_PHONE_DIGITS {
        return Some(digits[digits.len() - LOCAL_PHONE_DIGITS..].to_string());
    }
    Some(digits)
}

/// True when a display name is nothing but a phone number, as exports show
/// for senders missing from the exporter's contacts.
pub fn looks_like_phone(raw: &str) -> bool {
    let trimmed = raw.trim().trim_start_matches('\u{202a}').trim_end_matches('\u{202c}');
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '\u{a0}'))
        && normalize_phone(trimmed).is_some()
}

/// Display-name normalization with configurable prefix stripping
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    prefixes: Vec<Regex>,
}

impl NameNormalizer {
    pub fn new(prefixes: Vec<Regex>) -> Self {
        Self { prefixes }
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.compiled_name_prefixes()?))
    }

    /// Lowercase, trim, strip the first matching prefix, turn punctuation
    /// into spaces and collapse whitespace.
    ///
    /// A name made only of symbols keeps its lowercased text so it still has
    /// a usable key.
    pub fn normalize(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();

        let mut stripped = lowered.as_str();
        for prefix in &self.prefixes {
            if let Some(m) = prefix.find(stripped)
                && m.start() == 0
                && m.end() < stripped.len()
            {
                stripped = &stripped[m.end()..];
                break;
            }
        }

        let cleaned: String = stripped
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

        if collapsed.is_empty() { lowered } else { collapsed }
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        // Built-in patterns are validated by the config tests
        Self::from_config(&AnalysisConfig::default()).unwrap_or_else(|_| Self::new(Vec::new()))
    }
}
