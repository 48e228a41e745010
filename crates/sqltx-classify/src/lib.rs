//! Error classification: reducing a driver failure to a retry decision.
//!
//! The [`Classifier`] walks an error's causal chain, extracts the
//! `(sqlstate, driver code, message)` diagnostics of each frame, and asks a
//! pluggable [`Heuristics`] implementation whether the failure looks like a
//! broken session or a transient conflict. Anything neither recognizes is
//! fatal.
//!
//! The deepest cause is inspected first: vendor layers routinely re-wrap a
//! driver error, and the driver's own SQLSTATE outranks anything an outer
//! wrapper reports.
//!
//! # Example
//!
//! ```
//! use sqltx_classify::{Classifier, ErrorKind};
//! use sqltx_core::{DbError, Error};
//!
//! let classifier = Classifier::default();
//! let error = Error::from(DbError::new("Deadlock found when trying to get lock")
//!     .with_sql_state("40001"));
//!
//! assert_eq!(classifier.classify(&error), ErrorKind::Transient);
//! ```

mod classifier;
mod diagnostics;
mod heuristics;

pub use classifier::Classifier;
pub use diagnostics::Diagnostics;
pub use heuristics::{Heuristics, SqlStateHeuristics};

/// What a failure means for the retry state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deterministic failure; retrying cannot help.
    Fatal,
    /// Contention-shaped failure expected to clear on retry.
    Transient,
    /// The session itself is broken; the connection must be re-established
    /// before the next attempt.
    Connection,
}
