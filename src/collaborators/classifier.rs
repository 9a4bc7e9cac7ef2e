//! Optional secondary judgment from an external (typically LLM) classifier.
//!
//! The analysis only depends on the [`WishClassifier`] contract. This module
//! builds the request, validates free-text responses into a
//! [`ClassifierJudgment`] and wraps calls in bounded retries. No network
//! client ships with the crate.

use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clustering::ScoredTranscript;
use crate::config::ClassifierConfig;
use crate::error::CollaboratorError;
use crate::models::BirthdayCluster;
use crate::pipeline::CancellationToken;

/// Messages per request; larger clusters send their most informative ones
pub const MAX_PROMPT_MESSAGES: usize = 10;

const EMPTY_NAMES: &[&str] = &["", "null", "none", "unknown", "n/a"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLine {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierRequest {
    pub cluster_id: usize,
    pub date: NaiveDate,
    pub messages: Vec<PromptLine>,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierJudgment {
    pub is_wish: bool,
    pub target_name: Option<String>,
    /// Normalized to 0-1
    pub confidence: Option<f64>,
    pub rationale: Option<String>,
}

pub trait WishClassifier: Send + Sync {
    fn name(&self) -> &str {
        "classifier"
    }

    fn classify(&self, request: &ClassifierRequest) -> Result<ClassifierJudgment, CollaboratorError>;
}

/// Rank messages for the prompt: wish relevance first, then mentions and
/// length, keeping the chosen ones in time order
fn select_lines(cluster: &BirthdayCluster, scored: &ScoredTranscript<'_>) -> Vec<usize> {
    let mut ranked: Vec<(usize, usize)> = cluster
        .message_indices
        .iter()
        .map(|&i| {
            let signal = &scored.signals[i];
            let body = &scored.messages[i].body;
            let score = (signal.relevance * 10.0) as usize
                + 5 * (signal.phone_mentions.len() + signal.name_mentions.len())
                + if signal.is_thanks { 8 } else { 0 }
                + (body.chars().count() / 10).min(5);
            (score, i)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.truncate(MAX_PROMPT_MESSAGES);

    let mut chosen: Vec<usize> = ranked.into_iter().map(|(_, i)| i).collect();
    chosen.sort_by_key(|&i| (scored.messages[i].timestamp, i));
    chosen
}

pub fn build_request(cluster: &BirthdayCluster, scored: &ScoredTranscript<'_>) -> ClassifierRequest {
    let messages: Vec<PromptLine> = select_lines(cluster, scored)
        .into_iter()
        .map(|i| {
            let message = &scored.messages[i];
            PromptLine {
                timestamp: message.timestamp,
                sender: message.sender.clone(),
                body: message.body.clone(),
            }
        })
        .collect();
    let prompt = build_prompt(cluster.birthday_date, &messages);
    ClassifierRequest { cluster_id: cluster.id, date: cluster.birthday_date, messages, prompt }
}

pub fn build_prompt(date: NaiveDate, messages: &[PromptLine]) -> String {
    let transcript = messages
        .iter()
        .map(|m| format!("[{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M"), m.sender, m.body))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are reviewing group chat messages sent around {date}.\n\
         Decide whether they are birthday wishes and, if so, whose birthday it is.\n\n\
         MESSAGES:\n{transcript}\n\n\
         Respond with a single JSON object and nothing else:\n\
         {{\"is_wish\": true, \"target_name\": \"name or null\", \"confidence\": 0.0, \"rationale\": \"one sentence\"}}\n\n\
         Guidelines:\n\
         - The honoree is usually named in the wishes or is the person replying with thanks.\n\
         - Use null for target_name when the messages do not identify anyone.\n\
         - confidence is between 0 and 1."
    )
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    #[serde(default)]
    is_wish: Option<Value>,
    #[serde(default, alias = "person", alias = "name")]
    target_name: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default, alias = "analysis", alias = "reason")]
    rationale: Option<Value>,
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!EMPTY_NAMES.contains(&trimmed.to_lowercase().as_str())).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Confidence as 0-1; values above 1 are read as percentages
fn confidence_field(value: Option<Value>) -> Option<f64> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
    Some(scaled.clamp(0.0, 1.0))
}

/// Validate a free-text classifier response.
///
/// The JSON object between the first `{` and the last `}` is used, so
/// surrounding prose or code fences are tolerated.
pub fn parse_judgment(text: &str) -> Result<ClassifierJudgment, CollaboratorError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(CollaboratorError::Malformed("no JSON object in response".to_string()));
    };
    if end < start {
        return Err(CollaboratorError::Malformed("no JSON object in response".to_string()));
    }

    let raw: RawJudgment = serde_json::from_str(&text[start..=end])
        .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

    let target_name = text_field(raw.target_name);
    let is_wish = match raw.is_wish {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
        _ => target_name.is_some(),
    };

    Ok(ClassifierJudgment {
        is_wish,
        target_name,
        confidence: confidence_field(raw.confidence),
        rationale: text_field(raw.rationale),
    })
}

/// Call the classifier with bounded retries.
///
/// Retryable errors back off exponentially from `backoff_ms`; cancellation is
/// checked before every attempt.
pub fn classify_with_retry(
    classifier: &dyn WishClassifier,
    request: &ClassifierRequest,
    config: &ClassifierConfig,
    cancel: &CancellationToken,
) -> Result<ClassifierJudgment, CollaboratorError> {
    let attempts = config.max_attempts.max(1);
    let mut last_error = CollaboratorError::Unavailable("no attempt made".to_string());

    for attempt in 0..attempts {
        if cancel.is_cancelled() {
            return Err(CollaboratorError::Unavailable("analysis cancelled".to_string()));
        }
        if attempt > 0 {
            let delay = Duration::from_millis(config.backoff_ms.saturating_mul(1 << (attempt - 1).min(16)));
            warn!(
                classifier = classifier.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Classifier call failed, retrying"
            );
            thread::sleep(delay);
        }

        match classifier.classify(request) {
            Ok(judgment) => {
                debug!(cluster = request.cluster_id, attempt, "Classifier judgment received");
                return Ok(judgment);
            }
            Err(e) if e.is_retryable() => last_error = e,
            Err(e) => return Err(e),
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        error: CollaboratorError,
    }

    impl WishClassifier for Flaky {
        fn classify(&self, _request: &ClassifierRequest) -> Result<ClassifierJudgment, CollaboratorError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            parse_judgment(r#"{"is_wish": true, "target_name": "Sarah", "confidence": 90}"#)
        }
    }

    fn request() -> ClassifierRequest {
        ClassifierRequest {
            cluster_id: 0,
            date: NaiveDate::from_ymd_opt(2024, 4, 26).unwrap(),
            messages: Vec::new(),
            prompt: String::new(),
        }
    }

    fn fast() -> ClassifierConfig {
        ClassifierConfig { max_attempts: 3, backoff_ms: 0, min_confidence: 0.5 }
    }

    #[test]
    fn test_parse_judgment_with_surrounding_prose() {
        let text = "Sure! Here you go:\n```json\n{\"is_wish\": true, \"target_name\": \"Sarah\", \"confidence\": 0.85, \"rationale\": \"She thanked everyone\"}\n```";
        let judgment = parse_judgment(text).unwrap();
        assert!(judgment.is_wish);
        assert_eq!(judgment.target_name.as_deref(), Some("Sarah"));
        assert_eq!(judgment.confidence, Some(0.85));
        assert_eq!(judgment.rationale.as_deref(), Some("She thanked everyone"));
    }

    #[test]
    fn test_parse_judgment_percent_confidence_and_aliases() {
        let judgment = parse_judgment(r#"{"person": "Rohan", "confidence": "85%", "analysis": "named"}"#).unwrap();
        assert!(judgment.is_wish);
        assert_eq!(judgment.target_name.as_deref(), Some("Rohan"));
        assert_eq!(judgment.confidence, Some(0.85));
        assert_eq!(judgment.rationale.as_deref(), Some("named"));
    }

    #[test]
    fn test_parse_judgment_drops_placeholder_names_and_clamps() {
        let judgment = parse_judgment(r#"{"is_wish": false, "target_name": "Unknown", "confidence": 250}"#).unwrap();
        assert!(!judgment.is_wish);
        assert_eq!(judgment.target_name, None);
        assert_eq!(judgment.confidence, Some(1.0));
    }

    #[test]
    fn test_parse_judgment_rejects_garbage() {
        assert!(matches!(parse_judgment("no json here"), Err(CollaboratorError::Malformed(_))));
        assert!(matches!(parse_judgment("} backwards {"), Err(CollaboratorError::Malformed(_))));
        assert!(matches!(parse_judgment("{not json}"), Err(CollaboratorError::Malformed(_))));
    }

    #[test]
    fn test_retry_recovers_from_rate_limit() {
        let classifier = Flaky { calls: AtomicU32::new(0), failures: 2, error: CollaboratorError::RateLimited };
        let judgment = classify_with_retry(&classifier, &request(), &fast(), &CancellationToken::new()).unwrap();
        assert_eq!(judgment.target_name.as_deref(), Some("Sarah"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let classifier = Flaky { calls: AtomicU32::new(0), failures: 10, error: CollaboratorError::Timeout(30) };
        let result = classify_with_retry(&classifier, &request(), &fast(), &CancellationToken::new());
        assert!(matches!(result, Err(CollaboratorError::Timeout(30))));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_malformed_is_not_retried() {
        let classifier = Flaky {
            calls: AtomicU32::new(0),
            failures: 10,
            error: CollaboratorError::Malformed("bad".to_string()),
        };
        let result = classify_with_retry(&classifier, &request(), &fast(), &CancellationToken::new());
        assert!(result.is_err());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let classifier = Flaky { calls: AtomicU32::new(0), failures: 0, error: CollaboratorError::RateLimited };
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(classify_with_retry(&classifier, &request(), &fast(), &cancel).is_err());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prompt_contains_messages_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 26).unwrap();
        let lines = vec![PromptLine {
            timestamp: date.and_hms_opt(15, 0, 0).unwrap(),
            sender: "Alice".to_string(),
            body: "HBD Sarah".to_string(),
        }];
        let prompt = build_prompt(date, &lines);
        assert!(prompt.contains("2024-04-26"));
        assert!(prompt.contains("[2024-04-26 15:00] Alice: HBD Sarah"));
        assert!(prompt.contains("\"target_name\""));
    }
}
