//! Core primitives shared by the sqltx crates.
//!
//! This crate carries the vocabulary the rest of the workspace speaks:
//!
//! - [`Delay`] and [`TimeUnit`]: wait intervals with microsecond resolution
//! - [`Sleeper`] and [`TokioSleeper`]: the pluggable wait primitive
//! - [`Error`] and [`DbError`]: the error surface, including the driver
//!   diagnostics the classifier reads
//! - [`Query`]: an immutable SQL statement plus positional parameters
//! - [`events`]: listener infrastructure for observability hooks
//!
//! Nothing in here talks to a database; concrete drivers live behind the
//! `Connection` trait in the `sqltx` crate.

pub mod error;
pub mod events;
pub mod query;
pub mod sleep;
pub mod time;

pub use error::{BoxError, DbError, Error, ErrorCode, ErrorInfo};
pub use query::{Query, ReuseHint, TypeTag, Value};
pub use sleep::{Sleeper, TokioSleeper};
pub use time::{Delay, TimeUnit};
