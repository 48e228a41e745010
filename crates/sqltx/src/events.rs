//! Events emitted by the transaction manager.

use std::time::Instant;

use sqltx_classify::ErrorKind;
use sqltx_core::events::Event;
use sqltx_core::Delay;

/// Observability events for one manager. Strictly informational: no
/// listener can influence the retry state machine.
#[derive(Clone, Debug)]
pub enum TxEvent {
    /// An attempt failed with a retryable error; the next one starts after
    /// `delay`.
    Retry {
        manager: String,
        timestamp: Instant,
        /// 0-based index of the attempt that just failed.
        attempt: usize,
        kind: ErrorKind,
        delay: Delay,
    },
    /// The run committed.
    Success {
        manager: String,
        timestamp: Instant,
        attempts: usize,
        affected_rows: u64,
    },
    /// The retry budget ran out; the last error is being raised.
    Exhausted {
        manager: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// A fatal classification ended the run without retrying.
    Fatal {
        manager: String,
        timestamp: Instant,
    },
    /// Commit failed on a non-idempotent plan; the outcome is unknown and
    /// the run is aborting without retry.
    UnknownCommit {
        manager: String,
        timestamp: Instant,
    },
    /// The first-attempt free reconnect fired while beginning the
    /// transaction.
    Reconnect {
        manager: String,
        timestamp: Instant,
    },
}

impl Event for TxEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TxEvent::Retry { .. } => "Retry",
            TxEvent::Success { .. } => "Success",
            TxEvent::Exhausted { .. } => "Exhausted",
            TxEvent::Fatal { .. } => "Fatal",
            TxEvent::UnknownCommit { .. } => "UnknownCommit",
            TxEvent::Reconnect { .. } => "Reconnect",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TxEvent::Retry { timestamp, .. }
            | TxEvent::Success { timestamp, .. }
            | TxEvent::Exhausted { timestamp, .. }
            | TxEvent::Fatal { timestamp, .. }
            | TxEvent::UnknownCommit { timestamp, .. }
            | TxEvent::Reconnect { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            TxEvent::Retry { manager, .. }
            | TxEvent::Success { manager, .. }
            | TxEvent::Exhausted { manager, .. }
            | TxEvent::Fatal { manager, .. }
            | TxEvent::UnknownCommit { manager, .. }
            | TxEvent::Reconnect { manager, .. } => manager,
        }
    }
}
