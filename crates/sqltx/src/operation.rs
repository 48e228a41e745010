//! The caller-supplied unit of work and the deferred-build decision.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use sqltx_core::{Error, Query};

/// One data-modifying statement in a batch.
///
/// `build` must be pure and deterministic — the plan freezes its result once
/// and replays it on every retry — unless the type opts into
/// [`deferred_build`](Operation::deferred_build), in which case it is called
/// once per attempt inside the open transaction and may reflect
/// in-transaction reads.
pub trait Operation: Any + Send + Sync {
    /// Produces the query this operation executes.
    fn build(&self) -> Result<Query, Error>;

    /// Whether executing the built query twice in sequence leaves the
    /// database in the same final state as executing it once. This
    /// describes the effect on the database, not this method call.
    fn is_idempotent(&self) -> bool;

    /// Type-level marker for deferred build. The answer must be the same
    /// for every instance of an implementing type; resolvers are allowed
    /// to cache it per type.
    fn deferred_build(&self) -> bool {
        false
    }
}

/// Decides whether an operation's query is rebuilt on every attempt.
///
/// Must not fail for well-formed inputs — the signature is infallible.
pub trait DeferredResolver: Send + Sync {
    fn is_deferred(&self, operation: &dyn Operation) -> bool;
}

/// Resolver that caches the deferred-build answer per concrete operation
/// type. Sound because the marker is type-level.
#[derive(Debug, Default)]
pub struct CachingResolver {
    cache: RwLock<HashMap<TypeId, bool>>,
}

impl CachingResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeferredResolver for CachingResolver {
    fn is_deferred(&self, operation: &dyn Operation) -> bool {
        let any: &dyn Any = operation;
        let key = any.type_id();

        let cache = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(deferred) = cache.get(&key) {
            return *deferred;
        }
        drop(cache);

        let deferred = operation.deferred_build();
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, deferred);
        deferred
    }
}
