//! The session contract a host driver implements.

use async_trait::async_trait;

use sqltx_core::{Error, Query};

use crate::options::TxOptions;

/// A database session driven exclusively by the transaction manager for the
/// duration of a run.
///
/// Contract:
///
/// - [`begin_with_options`](Connection::begin_with_options) opens a
///   transaction; when the options carry a non-default isolation level it
///   applies to this transaction only (vendor-specific, e.g.
///   `START TRANSACTION ISOLATION LEVEL …`). It must not implicitly
///   reconnect while a transaction is already active.
/// - [`execute`](Connection::execute) runs one query inside the open
///   transaction and returns the affected-row count.
/// - [`close`](Connection::close) drops the physical session so the next
///   call establishes a fresh one. The manager may close an already-closed
///   session on its recovery paths, so `close` should be idempotent.
///
/// Errors should be [`Error::Db`] carrying whatever diagnostics the driver
/// has; the classifier reads them to decide whether an attempt is worth
/// retrying.
#[async_trait]
pub trait Connection: Send {
    async fn begin_with_options(&mut self, options: &TxOptions) -> Result<(), Error>;

    async fn execute(&mut self, query: &Query) -> Result<u64, Error>;

    async fn commit(&mut self) -> Result<(), Error>;

    async fn rollback(&mut self) -> Result<(), Error>;

    async fn close(&mut self) -> Result<(), Error>;
}
