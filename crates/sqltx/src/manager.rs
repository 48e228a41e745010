//! The retry state machine.

use std::sync::Arc;
use std::time::Instant;

use sqltx_classify::{Classifier, ErrorKind};
use sqltx_core::events::{EventListener, EventListeners, FnListener};
use sqltx_core::{Delay, Error, Sleeper, TokioSleeper};

use crate::connection::Connection;
use crate::events::TxEvent;
use crate::operation::{DeferredResolver, Operation};
use crate::options::TxOptions;
use crate::plan::{ExecutionPlan, PlanBuilder};
use crate::policy::RetryPolicy;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Outcome of a successful run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunResult {
    affected_rows: u64,
}

impl RunResult {
    /// Rows affected summed over the queries of the successful attempt.
    /// Partial sums from failed attempts are discarded.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }
}

/// Executes an ordered batch of operations as one logical transaction,
/// retrying transient failures, recovering broken sessions, and refusing to
/// silently replay a commit whose outcome is unknown.
///
/// One call to [`run`](TransactionManager::run) freezes the batch into an
/// [`ExecutionPlan`], then loops: begin, execute every step in order,
/// commit. A failure rolls back (rollback errors are discarded) and then:
///
/// 1. if the failure hit during commit and the plan is not idempotent, the
///    run aborts with [`Error::UnknownCommitState`] — no classification, no
///    retry — because replaying could apply the batch twice;
/// 2. a [`Fatal`](ErrorKind::Fatal) classification re-raises immediately;
/// 3. an exhausted retry budget re-raises the last error;
/// 4. otherwise the manager closes the connection when the session is the
///    problem, sleeps per the backoff strategy, and tries again.
///
/// On the first attempt only, a failure to *begin* is absorbed once by
/// closing the (possibly stale) session and beginning again; this free
/// reconnect exists for long-lived pools whose idle sessions die
/// server-side, and is not charged to the retry budget.
///
/// The manager owns the connection exclusively for the duration of a run;
/// it never opens nested transactions and never spawns internal tasks.
pub struct TransactionManager<C> {
    connection: C,
    classifier: Classifier,
    default_policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    plan_builder: PlanBuilder,
    listeners: EventListeners<TxEvent>,
    name: String,
}

impl<C> TransactionManager<C> {
    /// Creates a manager with the default configuration: SQLSTATE-based
    /// classification, no retries, tokio sleeping.
    pub fn new(connection: C) -> Self {
        Self::builder(connection).build()
    }

    pub fn builder(connection: C) -> TransactionManagerBuilder<C> {
        TransactionManagerBuilder::new(connection)
    }

    /// Consumes the manager and hands the connection back.
    pub fn into_connection(self) -> C {
        self.connection
    }
}

impl<C: Connection> TransactionManager<C> {
    /// Runs the batch with default [`TxOptions`].
    pub async fn run(&mut self, operations: Vec<Arc<dyn Operation>>) -> Result<RunResult, Error> {
        self.run_with(operations, TxOptions::default()).await
    }

    /// Runs the batch as one logical transaction, retrying per the options'
    /// policy (or the manager default when the options carry none).
    pub async fn run_with(
        &mut self,
        operations: Vec<Arc<dyn Operation>>,
        options: TxOptions,
    ) -> Result<RunResult, Error> {
        let plan = self.plan_builder.build(operations)?;
        let policy = options
            .retry_policy()
            .cloned()
            .unwrap_or_else(|| self.default_policy.clone());

        let mut attempt = 0usize;
        loop {
            match self.run_attempt(&plan, &options, attempt == 0).await {
                Ok(total) => {
                    #[cfg(feature = "tracing")]
                    debug!(
                        manager = %self.name,
                        attempts = attempt + 1,
                        affected_rows = total,
                        "transaction committed"
                    );
                    self.emit(TxEvent::Success {
                        manager: self.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                        affected_rows: total,
                    });
                    return Ok(RunResult {
                        affected_rows: total,
                    });
                }
                Err(failure) => {
                    self.safe_rollback().await;

                    let AttemptFailure { error, committing } = failure;

                    // A lost commit acknowledgement on a non-idempotent
                    // plan must surface as-is: replaying could apply the
                    // batch twice. Checked before classification and
                    // before the budget.
                    if committing && !plan.is_idempotent() {
                        #[cfg(feature = "tracing")]
                        warn!(
                            manager = %self.name,
                            "commit outcome unknown on a non-idempotent plan"
                        );
                        self.emit(TxEvent::UnknownCommit {
                            manager: self.name.clone(),
                            timestamp: Instant::now(),
                        });
                        return Err(Error::UnknownCommitState(Box::new(error)));
                    }

                    let kind = self.classifier.classify(&error);
                    if kind == ErrorKind::Fatal {
                        self.emit(TxEvent::Fatal {
                            manager: self.name.clone(),
                            timestamp: Instant::now(),
                        });
                        return Err(error);
                    }

                    if attempt >= policy.max_retries() {
                        #[cfg(feature = "tracing")]
                        warn!(
                            manager = %self.name,
                            attempts = attempt + 1,
                            "retry budget exhausted"
                        );
                        self.emit(TxEvent::Exhausted {
                            manager: self.name.clone(),
                            timestamp: Instant::now(),
                            attempts: attempt + 1,
                        });
                        return Err(error);
                    }

                    if kind == ErrorKind::Connection {
                        // The session is broken; force a fresh one for the
                        // next attempt.
                        self.close_discarding_errors().await;
                    }

                    let delay = policy.backoff().delay(attempt);
                    #[cfg(feature = "tracing")]
                    debug!(
                        manager = %self.name,
                        attempt,
                        ?kind,
                        delay_micros = delay.as_micros(),
                        "retrying after delay"
                    );
                    self.emit(TxEvent::Retry {
                        manager: self.name.clone(),
                        timestamp: Instant::now(),
                        attempt,
                        kind,
                        delay,
                    });
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn run_attempt(
        &mut self,
        plan: &ExecutionPlan,
        options: &TxOptions,
        first_attempt: bool,
    ) -> Result<u64, AttemptFailure> {
        self.begin_transaction(options, first_attempt)
            .await
            .map_err(AttemptFailure::before_commit)?;

        // The sum restarts every attempt; only the attempt that commits
        // reports its rows.
        let mut total = 0u64;
        for step in plan.steps() {
            let query = step.query().map_err(AttemptFailure::before_commit)?;
            total += self
                .connection
                .execute(&query)
                .await
                .map_err(AttemptFailure::before_commit)?;
        }

        self.connection
            .commit()
            .await
            .map_err(AttemptFailure::committing)?;
        Ok(total)
    }

    /// Opens the transaction. On the first attempt a begin failure is
    /// absorbed once: close the possibly-stale session and begin again,
    /// propagating only the second error. Later attempts get no such
    /// grace; their begin failures are classified like any other error.
    async fn begin_transaction(
        &mut self,
        options: &TxOptions,
        allow_reconnect: bool,
    ) -> Result<(), Error> {
        match self.connection.begin_with_options(options).await {
            Ok(()) => Ok(()),
            Err(_stale) if allow_reconnect => {
                #[cfg(feature = "tracing")]
                debug!(
                    manager = %self.name,
                    error = %_stale,
                    "begin failed on a possibly stale session; reconnecting"
                );
                self.emit(TxEvent::Reconnect {
                    manager: self.name.clone(),
                    timestamp: Instant::now(),
                });
                self.close_discarding_errors().await;
                self.connection.begin_with_options(options).await
            }
            Err(error) => Err(error),
        }
    }

    /// Rolls back and discards any rollback error. The error that put us
    /// here is the one worth reporting; a failed rollback on a dying
    /// session must not replace it.
    async fn safe_rollback(&mut self) {
        if let Err(_rollback) = self.connection.rollback().await {
            #[cfg(feature = "tracing")]
            debug!(
                manager = %self.name,
                error = %_rollback,
                "discarding rollback failure"
            );
        }
    }

    async fn close_discarding_errors(&mut self) {
        if let Err(_close) = self.connection.close().await {
            #[cfg(feature = "tracing")]
            debug!(
                manager = %self.name,
                error = %_close,
                "discarding close failure on a dead session"
            );
        }
    }

    fn emit(&self, event: TxEvent) {
        self.listeners.emit(&event);
    }
}

struct AttemptFailure {
    error: Error,
    committing: bool,
}

impl AttemptFailure {
    fn before_commit(error: Error) -> Self {
        Self {
            error,
            committing: false,
        }
    }

    fn committing(error: Error) -> Self {
        Self {
            error,
            committing: true,
        }
    }
}

/// Builder for [`TransactionManager`].
pub struct TransactionManagerBuilder<C> {
    connection: C,
    classifier: Classifier,
    default_policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    resolver: Option<Arc<dyn DeferredResolver>>,
    listeners: EventListeners<TxEvent>,
    name: String,
}

impl<C> TransactionManagerBuilder<C> {
    fn new(connection: C) -> Self {
        Self {
            connection,
            classifier: Classifier::default(),
            default_policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            resolver: None,
            listeners: EventListeners::new(),
            name: "<unnamed>".to_owned(),
        }
    }

    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The policy used when a run's options carry none.
    pub fn default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Overrides how the plan builder decides eager vs deferred build.
    pub fn deferred_resolver(mut self, resolver: Arc<dyn DeferredResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Name used in events and diagnostics.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked before each retry sleep with the
    /// 0-based failed-attempt index and the chosen delay.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Delay) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &TxEvent| {
            if let TxEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked on commit with the attempt count and
    /// the affected-row sum.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, u64) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &TxEvent| {
            if let TxEvent::Success {
                attempts,
                affected_rows,
                ..
            } = event
            {
                f(*attempts, *affected_rows);
            }
        }));
        self
    }

    /// Registers a callback invoked when the retry budget runs out.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &TxEvent| {
            if let TxEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when a commit failure leaves the
    /// transaction in an unknown state.
    pub fn on_unknown_commit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &TxEvent| {
            if matches!(event, TxEvent::UnknownCommit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers an arbitrary event listener.
    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<TxEvent> + 'static,
    {
        self.listeners.add(listener);
        self
    }

    pub fn build(self) -> TransactionManager<C> {
        TransactionManager {
            connection: self.connection,
            classifier: self.classifier,
            default_policy: self.default_policy,
            sleeper: self.sleeper,
            plan_builder: self
                .resolver
                .map(PlanBuilder::with_resolver)
                .unwrap_or_default(),
            listeners: self.listeners,
            name: self.name,
        }
    }
}
