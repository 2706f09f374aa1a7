//! The capability every backend provides.

use dexec_primitives::{ExecResult, ExecutionResult, KvStore, Step};

/// Run one transaction against a store.
///
/// On success the returned mutations have already been applied to `store`.
/// On failure `store` is left exactly as it was.
pub trait Execution: Send + Sync {
    fn execute(&self, store: &mut dyn KvStore, step: &Step) -> ExecResult<ExecutionResult>;
}

impl<E: Execution + ?Sized> Execution for Box<E> {
    fn execute(&self, store: &mut dyn KvStore, step: &Step) -> ExecResult<ExecutionResult> {
        (**self).execute(store, step)
    }
}
