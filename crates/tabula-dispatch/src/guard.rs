use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::dao::TableDao;
use crate::error::DataError;
use crate::operation::Operation;

/// Capability check for one DAO instance
pub struct CapabilityGuard<'a> {
    dao: &'a dyn TableDao,
}

impl<'a> CapabilityGuard<'a> {
    pub fn new(dao: &'a dyn TableDao) -> Self {
        Self { dao }
    }

    /// Operations the DAO advertises
    pub fn operations(&self) -> Vec<Operation> {
        self.dao.operations()
    }

    /// Presence check only
    pub fn has_method(&self, operation: Operation) -> bool {
        self.dao.supports(operation)
    }

    /// Calls `on_missing` once and returns `true` when `operation` is absent,
    /// so the caller can stop there. Returns `false` otherwise.
    pub fn verify<F>(&self, operation: Operation, on_missing: F) -> bool
    where
        F: FnOnce(Operation),
    {
        if self.has_method(operation) {
            return false;
        }

        warn!("DAO does not implement {}", operation);
        on_missing(operation);
        true
    }
}

type HookFn = dyn Fn(Operation) -> DataError + Send + Sync;

/// Builds the error reported when a DAO lacks an operation
#[derive(Clone)]
pub struct MissingOperationHook(Arc<HookFn>);

impl MissingOperationHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(Operation) -> DataError + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn error_for(&self, operation: Operation) -> DataError {
        (self.0)(operation)
    }
}

impl Default for MissingOperationHook {
    fn default() -> Self {
        Self::new(method_not_available)
    }
}

impl fmt::Debug for MissingOperationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MissingOperationHook").finish()
    }
}

/// `NotFound("Method {operation} not available.")`
pub fn method_not_available(operation: Operation) -> DataError {
    DataError::not_found(format!("Method {} not available.", operation))
}
