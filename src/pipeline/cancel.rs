use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::AnalysisError;

/// Cooperative cancellation shared between a caller and a running analysis.
///
/// The analysis checks the token between stages and between classifier
/// calls; a cancelled run returns [`AnalysisError::Cancelled`] and discards
/// everything it computed.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.is_cancelled() { Err(AnalysisError::Cancelled) } else { Ok(()) }
    }
}
