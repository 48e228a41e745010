//! Retry budget and pacing.

use std::fmt;
use std::sync::Arc;

use sqltx_backoff::{BackoffStrategy, NoBackoff};

/// How many extra attempts a run gets and how they are paced.
///
/// `max_retries` counts the attempts *after* the first, so the total
/// attempt ceiling is `1 + max_retries`.
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    backoff: Arc<dyn BackoffStrategy>,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Arc<dyn BackoffStrategy>) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// One attempt, no pacing. This is the manager's default.
    pub fn no_retries() -> Self {
        Self::new(0, Arc::new(NoBackoff))
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn backoff(&self) -> &dyn BackoffStrategy {
        self.backoff.as_ref()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retries()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}
