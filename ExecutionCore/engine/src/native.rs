//! Native-local backend: the computation runs in-process.

use dexec_primitives::{Computation, ExecResult, ExecutionResult, KvStore, Step};

use crate::delegation::commit;
use crate::execution::Execution;

/// Runs a fixed computation directly against the caller's store.
///
/// Transaction arguments are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NativeExecution {
    computation: Computation,
}

impl NativeExecution {
    pub fn new(computation: Computation) -> Self {
        Self { computation }
    }

    pub fn computation(&self) -> Computation {
        self.computation
    }
}

impl Execution for NativeExecution {
    fn execute(&self, store: &mut dyn KvStore, _step: &Step) -> ExecResult<ExecutionResult> {
        let effect = self.computation.compute(store)?;
        commit(store, effect)
    }
}
