use rand::Rng;

use sqltx_core::{Delay, Error};

use crate::BackoffStrategy;

/// Exponential backoff with a cap and uniform jitter.
///
/// The deterministic term grows as `base * multiplier^attempt` and is capped
/// at `max`; jitter is drawn from `[0, jitter]` and added *after* capping,
/// so an observed delay may exceed the cap by up to the jitter width.
#[derive(Clone, Debug)]
pub struct ExponentialJitter {
    base_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
    jitter_ms: u64,
}

impl ExponentialJitter {
    /// Builds the strategy, rejecting `max_delay_ms < base_delay_ms` and
    /// multipliers that are not strictly greater than one.
    pub fn new(
        base_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        jitter_ms: u64,
    ) -> Result<Self, Error> {
        if max_delay_ms < base_delay_ms {
            return Err(Error::InvalidArgument(format!(
                "max delay ({max_delay_ms}ms) must be at least the base delay ({base_delay_ms}ms)"
            )));
        }
        if !(multiplier > 1.0) {
            return Err(Error::InvalidArgument(format!(
                "multiplier must be greater than 1.0, got {multiplier}"
            )));
        }
        Ok(Self {
            base_delay_ms,
            max_delay_ms,
            multiplier,
            jitter_ms,
        })
    }

    fn capped_ms(&self, attempt: usize) -> u64 {
        let grown = self.base_delay_ms as f64 * self.multiplier.powf(attempt as f64);
        if grown >= self.max_delay_ms as f64 {
            self.max_delay_ms
        } else {
            grown as u64
        }
    }
}

impl BackoffStrategy for ExponentialJitter {
    fn delay(&self, attempt: usize) -> Delay {
        let mut millis = self.capped_ms(attempt);
        if self.jitter_ms > 0 {
            millis = millis.saturating_add(rand::rng().random_range(0..=self.jitter_ms));
        }
        Delay::from_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}
