//! The error surface of the workspace.
//!
//! Every fallible operation returns [`Error`]. Driver failures travel as
//! [`Error::Db`] wrapping a [`DbError`], which carries the diagnostics the
//! classifier reads: an optional structured info triple, an optional vendor
//! status code, an optional SQLSTATE accessor, and an optional wrapped
//! source for vendor layers that re-wrap the real driver error.

use std::error::Error as StdError;
use std::fmt;

/// Boxed error used for arbitrary host and driver sources.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by the transaction orchestrator and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied value was rejected up front: an empty operation
    /// batch or out-of-range backoff parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A commit call failed and the plan is not idempotent, so the engine
    /// cannot tell whether the transaction landed and must not replay it.
    #[error(
        "commit failed in unknown state; manual reconciliation required \
         because the operation is not idempotent"
    )]
    UnknownCommitState(#[source] Box<Error>),

    /// A failure reported by the database driver.
    #[error("{0}")]
    Db(#[from] DbError),

    /// Any other host-side failure, propagated unchanged.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl Error {
    /// Convenience constructor for [`Error::Other`].
    pub fn other(error: impl Into<BoxError>) -> Self {
        Error::Other(error.into())
    }
}

/// Structured driver diagnostics of the `[sqlstate, code, message]` shape
/// many drivers expose alongside the thrown error.
///
/// Fields are optional because drivers routinely omit or mistype entries;
/// an absent entry simply contributes nothing during extraction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub sql_state: Option<String>,
    pub driver_code: Option<i64>,
    pub driver_message: Option<String>,
}

/// A driver's own status code, which vendors report either as a number or
/// as text (often a SQLSTATE followed by prose).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Numeric(i64),
    Text(String),
}

/// A failure reported by the database layer.
#[derive(Debug)]
pub struct DbError {
    message: String,
    error_info: Option<ErrorInfo>,
    code: Option<ErrorCode>,
    sql_state: Option<String>,
    source: Option<BoxError>,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_info: None,
            code: None,
            sql_state: None,
            source: None,
        }
    }

    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    /// Wraps the underlying driver error this one was built from.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_info(&self) -> Option<&ErrorInfo> {
        self.error_info.as_ref()
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for DbError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
