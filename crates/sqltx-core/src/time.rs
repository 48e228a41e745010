//! Wait intervals with microsecond resolution.
//!
//! [`Delay`] is a signed quantity of time. Backoff strategies produce it and
//! sleepers consume it; a negative amount is legal data and every sleeper
//! treats it as zero. `std::time::Duration` cannot represent that, which is
//! why the type exists.

use std::cmp::Ordering;
use std::time::Duration;

/// Unit tag for a [`Delay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Microseconds per unit.
    pub const fn in_micros(self) -> i64 {
        match self {
            TimeUnit::Microseconds => 1,
            TimeUnit::Milliseconds => 1_000,
            TimeUnit::Seconds => 1_000_000,
            TimeUnit::Minutes => 60_000_000,
        }
    }
}

/// A wait interval: a signed amount paired with a [`TimeUnit`].
///
/// Equality and ordering compare the microsecond value, so
/// `Delay::from_millis(1) == Delay::new(1_000, TimeUnit::Microseconds)`.
#[derive(Clone, Copy, Debug)]
pub struct Delay {
    amount: i64,
    unit: TimeUnit,
}

impl Delay {
    pub const fn new(amount: i64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self::new(micros, TimeUnit::Microseconds)
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self::new(millis, TimeUnit::Milliseconds)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self::new(secs, TimeUnit::Seconds)
    }

    pub const fn zero() -> Self {
        Self::new(0, TimeUnit::Microseconds)
    }

    pub const fn amount(self) -> i64 {
        self.amount
    }

    pub const fn unit(self) -> TimeUnit {
        self.unit
    }

    /// The interval in microseconds, saturating at the `i64` bounds.
    pub const fn as_micros(self) -> i64 {
        self.amount.saturating_mul(self.unit.in_micros())
    }

    pub const fn is_positive(self) -> bool {
        self.as_micros() > 0
    }

    /// Converts to a [`std::time::Duration`]; non-positive delays become zero.
    pub fn to_std(self) -> Duration {
        let micros = self.as_micros();
        if micros <= 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(micros as u64)
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Delay {
    fn eq(&self, other: &Self) -> bool {
        self.as_micros() == other.as_micros()
    }
}

impl Eq for Delay {}

impl PartialOrd for Delay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Delay {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_micros().cmp(&other.as_micros())
    }
}
