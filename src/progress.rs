//! Progress and cancellation capabilities for the build driver.
//!
//! The analyzer never owns a UI; it reports through a sink the host passes
//! in and checks a shared token between files and between phases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ProgressSink {
    fn report(&self, message: &str, increment: usize);
}

/// Discards progress. The default for library callers.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _message: &str, _increment: usize) {}
}

/// Logs progress to stderr; stdout stays reserved for command output.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn report(&self, message: &str, _increment: usize) {
        eprintln!("jsgraph: {message}");
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_flips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        let clone = token.clone();
        assert!(clone.is_cancelled());
    }
}
