//! Per-run options.

use crate::policy::RetryPolicy;

/// Isolation override applied when the transaction begins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Keep the session default; no isolation clause is issued.
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// The SQL spelling of the level, or `None` when the session default
    /// should prevail. Drivers splice this into their vendor-specific
    /// `SET TRANSACTION ISOLATION LEVEL` form.
    pub fn as_sql(self) -> Option<&'static str> {
        match self {
            IsolationLevel::Default => None,
            IsolationLevel::ReadUncommitted => Some("READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => Some("READ COMMITTED"),
            IsolationLevel::RepeatableRead => Some("REPEATABLE READ"),
            IsolationLevel::Serializable => Some("SERIALIZABLE"),
        }
    }
}

/// Options for one `run` call. The zero value is meaningful: session
/// default isolation and the manager's configured retry policy.
#[derive(Clone, Debug, Default)]
pub struct TxOptions {
    isolation: IsolationLevel,
    retry_policy: Option<RetryPolicy>,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    /// Overrides the manager's default retry policy for this run.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }
}
