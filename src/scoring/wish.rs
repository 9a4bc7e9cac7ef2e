use regex::{Regex, RegexBuilder};

use crate::config::{ScoringConfig, ScoringWeights};
use crate::error::ConfigError;
use crate::models::{Message, TimingModifier, WishSignal};

/// Exclamation marks beyond this many add nothing
const MAX_ENTHUSIASM_MARKS: usize = 4;
const SHORT_MESSAGE_WORDS: usize = 3;

#[derive(Debug, Clone)]
struct Phrase {
    text: String,
    pattern: Regex,
}

impl Phrase {
    /// Case-insensitive match on word boundaries where the phrase has word
    /// characters at its ends
    fn compile(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim().to_lowercase();
        let mut source = regex::escape(&text);
        if text.chars().next().is_some_and(char::is_alphanumeric) {
            source.insert_str(0, r"\b");
        }
        if text.chars().last().is_some_and(char::is_alphanumeric) {
            source.push_str(r"\b");
        }
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::Pattern { pattern: text.clone(), source })?;
        Ok(Self { text, pattern })
    }

    fn compile_all(list: &[String]) -> Result<Vec<Self>, ConfigError> {
        list.iter().filter(|p| !p.trim().is_empty()).map(|p| Phrase::compile(p)).collect()
    }
}

fn matching<'a>(phrases: &'a [Phrase], body: &str) -> Vec<&'a str> {
    phrases.iter().filter(|p| p.pattern.is_match(body)).map(|p| p.text.as_str()).collect()
}

/// Relevance scoring of message text.
///
/// Pure over the message body and the configured vocabulary, so it can run on
/// any thread. Mention extraction and thanks marking need the registry and
/// neighbouring messages and happen afterwards.
#[derive(Debug, Clone)]
pub struct WishScorer {
    strong: Vec<Phrase>,
    weak: Vec<Phrase>,
    negative: Vec<Phrase>,
    thanks: Vec<Phrase>,
    belated: Vec<Phrase>,
    advance: Vec<Phrase>,
    emojis: Vec<String>,
    weights: ScoringWeights,
    base_score: f64,
    min_score: f64,
    short_message_factor: f64,
}

impl WishScorer {
    pub fn new(config: &ScoringConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            strong: Phrase::compile_all(&config.strong_phrases)?,
            weak: Phrase::compile_all(&config.weak_phrases)?,
            negative: Phrase::compile_all(&config.negative_phrases)?,
            thanks: Phrase::compile_all(&config.thanks_phrases)?,
            belated: Phrase::compile_all(&config.belated_markers)?,
            advance: Phrase::compile_all(&config.advance_markers)?,
            emojis: config.emojis.iter().filter(|e| !e.is_empty()).cloned().collect(),
            weights: config.weights.clone(),
            base_score: config.base_score,
            min_score: config.min_score,
            short_message_factor: config.short_message_factor,
        })
    }

    /// Score one message. Media and system messages get an empty signal.
    pub fn score(&self, message: &Message) -> WishSignal {
        let mut signal = WishSignal::empty(message.index);
        if !message.is_text() {
            return signal;
        }
        let body = message.body.as_str();

        let strong = matching(&self.strong, body);
        // A wish that also says thanks is still a wish, not a reply to one
        signal.gratitude = strong.is_empty() && !matching(&self.thanks, body).is_empty();

        if !matching(&self.advance, body).is_empty() {
            signal.modifiers.push(TimingModifier::Advance);
        }
        if !matching(&self.belated, body).is_empty() {
            signal.modifiers.push(TimingModifier::Belated);
        }
        signal.modifiers.sort();

        if !matching(&self.negative, body).is_empty() {
            return signal;
        }

        let weak = matching(&self.weak, body);
        let emojis: Vec<&str> =
            self.emojis.iter().map(String::as_str).filter(|e| body.contains(*e)).collect();
        let marks = body.chars().filter(|&c| c == '!').count().min(MAX_ENTHUSIASM_MARKS);

        let mut score = self.base_score
            + self.weights.strong_phrase * strong.len() as f64
            + self.weights.weak_phrase * weak.len() as f64
            + self.weights.emoji * emojis.len() as f64
            + self.weights.enthusiasm * marks as f64;
        if strong.len() + weak.len() >= 2 {
            score += self.weights.multi_phrase_bonus;
        }
        if strong.is_empty() && body.split_whitespace().count() < SHORT_MESSAGE_WORDS {
            score *= self.short_message_factor;
        }

        signal.relevance = score.clamp(0.0, 1.0);
        signal.is_wish = signal.relevance >= self.min_score;
        signal.matched_patterns = strong
            .into_iter()
            .chain(weak)
            .chain(emojis)
            .map(str::to_string)
            .collect();
        signal
    }
}
