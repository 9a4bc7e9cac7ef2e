//! Chat export parsing.
//!
//! # Error Handling Strategy
//!
//! Parsing is tolerant line by line and strict about the format as a whole:
//!
//! - **Format selection**: a sample of the first non-empty lines decides which
//!   [`LineFormat`] is used for the entire transcript. If no sampled line
//!   matches any recognizer the export is rejected with
//!   [`ParseError::UnrecognizedFormat`](crate::error::ParseError) before any
//!   other stage runs.
//!
//! - **Individual lines**: lines without a leading timestamp are continuation
//!   text and are appended to the previous message. Lines before the first
//!   message are counted as orphans and skipped.
//!
//! - **Sender names** are passed through untouched; normalization belongs to
//!   the participant registry.

pub mod classify;
pub mod datetime;
pub mod formats;
pub mod transcript;

pub use formats::LineFormat;
pub use transcript::{Transcript, parse_transcript, read_transcript_file};
