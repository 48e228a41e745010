//! The pluggable wait primitive.

use async_trait::async_trait;

use crate::time::Delay;

/// Consumes the wait intervals produced by a backoff strategy.
///
/// Substituting the sleeper is how tests make retry pacing instantaneous and
/// how embeddings route waits through their own scheduler.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for at least `delay`.
    ///
    /// Implementations must return immediately for a non-positive delay
    /// without touching the underlying timer.
    async fn sleep(&self, delay: Delay);
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Delay) {
        if !delay.is_positive() {
            return;
        }
        tokio::time::sleep(delay.to_std()).await;
    }
}
