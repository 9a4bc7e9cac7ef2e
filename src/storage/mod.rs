//! Saved analysis results
//!
//! A results file is a single pretty-printed JSON document carrying a schema
//! version, the time it was written, and one [`AnalysisReport`] per analyzed
//! transcript. Writes go to a sibling temp file first and are renamed into
//! place, so readers never see a half-written document.
//!
//! [`AnalysisReport`]: crate::pipeline::AnalysisReport

pub mod document;
pub mod persistence;

pub use document::{RESULTS_VERSION, ResultsDocument, SourceReport};
pub use persistence::{load_results, save_results};
