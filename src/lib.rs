//! Chat Birthdays - find birthdays in exported group chat transcripts
//!
//! Reads a plain-text chat export and reports whose birthday the group
//! celebrated, and when. Each result carries the messages it was derived
//! from, the strategy that picked the honoree, and an itemized confidence
//! score. The pipeline runs in these stages:
//!
//! - Parsing the export into messages ([`parsers`])
//! - Merging names and phone numbers into identities ([`identity`])
//! - Scoring messages as birthday wishes ([`scoring`])
//! - Grouping wishes into celebrations and years into entities ([`clustering`])
//! - Choosing the honoree of each celebration ([`resolver`])
//! - Weighting the evidence ([`confidence`])
//!
//! # Example
//!
//! ```no_run
//! use chat_birthdays::{AnalysisConfig, analyze};
//!
//! let text = std::fs::read_to_string("chat.txt")?;
//! for entity in analyze(&text, &AnalysisConfig::default())? {
//!     println!("{} {:.2}", entity.date, entity.confidence);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod clustering;
pub mod collaborators;
pub mod confidence;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod resolver;
pub mod scoring;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use error::{AnalysisError, CollaboratorError, ConfigError, ParseError};
pub use models::{BirthdayEntity, MonthDay};
pub use parsers::parse_transcript;
pub use pipeline::{AnalysisReport, CancellationToken, Collaborators, analyze, analyze_with};
pub use utils::paths::format_path_with_tilde;
