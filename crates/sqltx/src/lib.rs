//! Driver-agnostic SQL transaction orchestration.
//!
//! `sqltx` executes an ordered batch of data-modifying operations as one
//! logical database transaction, with retries on transient failures,
//! recovery of broken sessions, and explicit unknown-commit handling when a
//! lost commit acknowledgement makes a retry unsafe.
//!
//! The engine never builds SQL and never talks to a socket; the host
//! supplies a [`Connection`] over its driver of choice and [`Operation`]s
//! that produce [`Query`] values. Everything else — classification
//! ([`Classifier`], [`Heuristics`]), pacing ([`BackoffStrategy`]), waiting
//! ([`Sleeper`]) — is substitutable.
//!
//! # Guarantees
//!
//! - the batch is frozen into an [`ExecutionPlan`] once per run; retries
//!   replay the same plan in the same order;
//! - with `max_retries = k` there are at most `k + 1` attempts, plus one
//!   extra `begin` when the first-attempt free reconnect fires;
//! - an error thrown by `commit` on a non-idempotent plan always surfaces
//!   as [`Error::UnknownCommitState`], budget notwithstanding;
//! - the reported [`RunResult`] counts rows from the committed attempt
//!   only.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use sqltx::{
//!     Connection, Error, Operation, Query, TransactionManager, TxOptions,
//! };
//!
//! struct InMemory {
//!     rows: u64,
//! }
//!
//! #[async_trait]
//! impl Connection for InMemory {
//!     async fn begin_with_options(&mut self, _options: &TxOptions) -> Result<(), Error> {
//!         Ok(())
//!     }
//!
//!     async fn execute(&mut self, _query: &Query) -> Result<u64, Error> {
//!         self.rows += 1;
//!         Ok(1)
//!     }
//!
//!     async fn commit(&mut self) -> Result<(), Error> {
//!         Ok(())
//!     }
//!
//!     async fn rollback(&mut self) -> Result<(), Error> {
//!         Ok(())
//!     }
//!
//!     async fn close(&mut self) -> Result<(), Error> {
//!         Ok(())
//!     }
//! }
//!
//! struct InsertAudit;
//!
//! impl Operation for InsertAudit {
//!     fn build(&self) -> Result<Query, Error> {
//!         Ok(Query::new("INSERT INTO audit (actor) VALUES (?)").param("ada"))
//!     }
//!
//!     fn is_idempotent(&self) -> bool {
//!         false
//!     }
//! }
//!
//! # async fn example() -> Result<(), Error> {
//! let mut manager = TransactionManager::builder(InMemory { rows: 0 })
//!     .name("audit")
//!     .build();
//!
//! let result = manager
//!     .run(vec![Arc::new(InsertAudit) as Arc<dyn Operation>])
//!     .await?;
//! assert_eq!(result.affected_rows(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Deferred build
//!
//! An operation whose SQL depends on reads performed earlier in the same
//! transaction opts into deferred build by returning `true` from
//! [`Operation::deferred_build`]. Its query is then rebuilt inside every
//! attempt's transaction instead of being frozen into the plan.

pub mod connection;
pub mod events;
pub mod manager;
pub mod operation;
pub mod options;
pub mod plan;
pub mod policy;

pub use connection::Connection;
pub use events::TxEvent;
pub use manager::{RunResult, TransactionManager, TransactionManagerBuilder};
pub use operation::{CachingResolver, DeferredResolver, Operation};
pub use options::{IsolationLevel, TxOptions};
pub use plan::{ExecutionPlan, PlanBuilder, PlanStep};
pub use policy::RetryPolicy;

pub use sqltx_backoff::{BackoffStrategy, ExponentialJitter, NoBackoff};
pub use sqltx_classify::{Classifier, Diagnostics, ErrorKind, Heuristics, SqlStateHeuristics};
pub use sqltx_core::events::{Event, EventListener, EventListeners, FnListener};
pub use sqltx_core::{
    BoxError, DbError, Delay, Error, ErrorCode, ErrorInfo, Query, ReuseHint, Sleeper, TimeUnit,
    TokioSleeper, TypeTag, Value,
};
