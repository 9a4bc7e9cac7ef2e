//! Contracts for the optional services an analysis run talks to.

pub mod classifier;
pub mod progress;

pub use classifier::{
    ClassifierJudgment, ClassifierRequest, PromptLine, WishClassifier, build_prompt,
    build_request, classify_with_retry, parse_judgment,
};
pub use progress::{NoProgress, ProgressEvent, ProgressReporter, Stage, TracingProgress};
