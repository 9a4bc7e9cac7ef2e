//! Analysis configuration.
//!
//! Every option has a built-in default so an empty TOML document is a valid
//! configuration. Lookup order for the CLI is: explicit `--config` path, the
//! `CHAT_BIRTHDAYS_CONFIG` environment variable, then
//! `<config_dir>/chat-birthdays/config.toml`.
//!
//! ```toml
//! [confidence]
//! min_threshold = 0.4
//!
//! [clustering]
//! window_hours = 48
//! min_wishers = 3
//!
//! [identity]
//! name_prefix_patterns = ['^team\s*-\s*']
//! ```

pub mod vocabulary;

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_ENV_VAR: &str = "CHAT_BIRTHDAYS_CONFIG";
const CONFIG_DIR_NAME: &str = "chat-birthdays";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parser: ParserConfig,
    pub identity: IdentityConfig,
    pub scoring: ScoringConfig,
    pub clustering: ClusteringConfig,
    pub resolver: ResolverConfig,
    pub confidence: ConfidenceConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Non-empty lines inspected when choosing a line format
    pub sample_lines: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { sample_lines: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Regexes applied (first match only) to lowercased display names
    pub name_prefix_patterns: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { name_prefix_patterns: vocabulary::owned(vocabulary::NAME_PREFIX_PATTERNS) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub strong_phrase: f64,
    pub weak_phrase: f64,
    pub emoji: f64,
    pub enthusiasm: f64,
    pub multi_phrase_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            strong_phrase: 0.8,
            weak_phrase: 0.4,
            emoji: 0.1,
            enthusiasm: 0.05,
            multi_phrase_bonus: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_score: f64,
    /// Messages scoring below this are not wishes
    pub min_score: f64,
    pub weights: ScoringWeights,
    /// Multiplier for messages under three words without a strong phrase
    pub short_message_factor: f64,
    pub thanks_window_hours: u32,
    pub strong_phrases: Vec<String>,
    pub weak_phrases: Vec<String>,
    pub emojis: Vec<String>,
    pub negative_phrases: Vec<String>,
    pub thanks_phrases: Vec<String>,
    pub belated_markers: Vec<String>,
    pub advance_markers: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 0.0,
            min_score: 0.3,
            weights: ScoringWeights::default(),
            short_message_factor: 0.5,
            thanks_window_hours: 24,
            strong_phrases: vocabulary::owned(vocabulary::STRONG_PHRASES),
            weak_phrases: vocabulary::owned(vocabulary::WEAK_PHRASES),
            emojis: vocabulary::owned(vocabulary::EMOJIS),
            negative_phrases: vocabulary::owned(vocabulary::NEGATIVE_PHRASES),
            thanks_phrases: vocabulary::owned(vocabulary::THANKS_PHRASES),
            belated_markers: vocabulary::owned(vocabulary::BELATED_MARKERS),
            advance_markers: vocabulary::owned(vocabulary::ADVANCE_MARKERS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub window_hours: u32,
    pub min_wishers: usize,
    /// Month/day tolerance when merging clusters across years
    pub date_tolerance_days: i64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self { window_hours: 36, min_wishers: 2, date_tolerance_days: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub name_dominance_margin: usize,
    /// Elimination only runs when the participant count is below this
    pub elimination_group_ceiling: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { name_dominance_margin: 2, elimination_group_ceiling: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub phone_mention: f64,
    pub name_dominance: f64,
    pub thanks_confirmation: f64,
    pub elimination: f64,
    pub wisher_count: f64,
    pub multi_year: f64,
    pub classifier_agreement: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            phone_mention: 0.2,
            name_dominance: 0.1,
            thanks_confirmation: 0.15,
            elimination: 0.1,
            wisher_count: 0.1,
            multi_year: 0.2,
            classifier_agreement: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub min_threshold: f64,
    pub base_score: f64,
    pub weights: ConfidenceWeights,
    /// Wisher count earning half of the wisher weight
    pub wisher_size_threshold: usize,
    /// Wisher count earning the full wisher weight
    pub wisher_full_threshold: usize,
    pub unresolved_penalty: f64,
    pub low_evidence_penalty: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            min_threshold: 0.3,
            base_score: 0.3,
            weights: ConfidenceWeights::default(),
            wisher_size_threshold: 3,
            wisher_full_threshold: 5,
            unresolved_penalty: 0.3,
            low_evidence_penalty: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    /// Judgments below this confidence never earn the agreement bonus
    pub min_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 500, min_confidence: 0.5 }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// Check ranges and make sure every pattern compiles
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("confidence.min_threshold", self.confidence.min_threshold),
            ("confidence.base_score", self.confidence.base_score),
            ("scoring.base_score", self.scoring.base_score),
            ("scoring.min_score", self.scoring.min_score),
            ("scoring.short_message_factor", self.scoring.short_message_factor),
            ("classifier.min_confidence", self.classifier.min_confidence),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and 1 (got {})",
                    name, value
                )));
            }
        }

        if self.clustering.window_hours == 0 {
            return Err(ConfigError::Invalid("clustering.window_hours must be positive".into()));
        }
        if self.clustering.min_wishers == 0 {
            return Err(ConfigError::Invalid("clustering.min_wishers must be at least 1".into()));
        }
        if self.clustering.date_tolerance_days < 0 {
            return Err(ConfigError::Invalid(
                "clustering.date_tolerance_days cannot be negative".into(),
            ));
        }
        if self.resolver.name_dominance_margin == 0 {
            return Err(ConfigError::Invalid(
                "resolver.name_dominance_margin must be at least 1".into(),
            ));
        }
        if self.parser.sample_lines == 0 {
            return Err(ConfigError::Invalid("parser.sample_lines must be at least 1".into()));
        }
        if self.classifier.max_attempts == 0 {
            return Err(ConfigError::Invalid("classifier.max_attempts must be at least 1".into()));
        }

        self.compiled_name_prefixes()?;
        Ok(())
    }

    pub fn compiled_name_prefixes(&self) -> Result<Vec<Regex>, ConfigError> {
        self.identity
            .name_prefix_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Find the configuration file to use, if any.
///
/// Priority: explicit path, `CHAT_BIRTHDAYS_CONFIG`, platform config directory.
/// An explicit path is returned even when it does not exist so the caller
/// reports the missing file instead of silently using defaults.
pub fn locate_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}
