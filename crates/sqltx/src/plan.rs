//! Freezing a batch of operations into a replayable plan.

use std::fmt;
use std::sync::Arc;

use sqltx_core::{Error, Query};

use crate::operation::{CachingResolver, DeferredResolver, Operation};

/// One step of an [`ExecutionPlan`].
pub enum PlanStep {
    /// Query frozen at plan-build time and replayed verbatim every attempt.
    Eager(Query),
    /// Operation whose query is rebuilt inside every attempt's transaction.
    Deferred(Arc<dyn Operation>),
}

impl PlanStep {
    /// The query to execute for this step on the current attempt.
    ///
    /// For a deferred step this invokes the operation's `build`, so it must
    /// only be called inside the attempt's open transaction.
    pub fn query(&self) -> Result<Query, Error> {
        match self {
            PlanStep::Eager(query) => Ok(query.clone()),
            PlanStep::Deferred(operation) => operation.build(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, PlanStep::Deferred(_))
    }
}

impl fmt::Debug for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::Eager(query) => f.debug_tuple("Eager").field(query).finish(),
            PlanStep::Deferred(_) => f.debug_tuple("Deferred").finish_non_exhaustive(),
        }
    }
}

/// An ordered, immutable sequence of steps plus the aggregate idempotency
/// flag. Built exactly once per run and replayed on every retry.
#[derive(Debug)]
pub struct ExecutionPlan {
    steps: Vec<PlanStep>,
    idempotent: bool,
}

impl ExecutionPlan {
    /// True iff every operation in the plan reported itself idempotent.
    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Freezes caller operations into an [`ExecutionPlan`].
pub struct PlanBuilder {
    resolver: Arc<dyn DeferredResolver>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(CachingResolver::new()))
    }

    pub fn with_resolver(resolver: Arc<dyn DeferredResolver>) -> Self {
        Self { resolver }
    }

    /// Builds a plan from an ordered batch.
    ///
    /// Per operation, in input order: the resolver decides eager vs
    /// deferred; eager operations are built exactly once here, deferred
    /// ones are stored untouched; idempotency is consulted once per
    /// operation. A build failure propagates immediately and later
    /// operations are not touched at all.
    pub fn build(&self, operations: Vec<Arc<dyn Operation>>) -> Result<ExecutionPlan, Error> {
        if operations.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one operation is required".to_owned(),
            ));
        }

        let mut steps = Vec::with_capacity(operations.len());
        let mut idempotent = true;
        for operation in operations {
            let step = if self.resolver.is_deferred(operation.as_ref()) {
                PlanStep::Deferred(Arc::clone(&operation))
            } else {
                PlanStep::Eager(operation.build()?)
            };
            idempotent &= operation.is_idempotent();
            steps.push(step);
        }

        Ok(ExecutionPlan { steps, idempotent })
    }

    /// Convenience for the single-operation case.
    pub fn build_one(&self, operation: Arc<dyn Operation>) -> Result<ExecutionPlan, Error> {
        self.build(vec![operation])
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlanBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanBuilder").finish_non_exhaustive()
    }
}
