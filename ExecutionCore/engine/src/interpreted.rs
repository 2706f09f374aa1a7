//! Interpreted-local backend: named contracts run in an embedded interpreter.
//!
//! Every successful run is metered: the cumulative gas at `GAS_USAGE_KEY` and
//! the run count at `RUN_COUNT_KEY` are updated in the same atomic mutation
//! list as the contract's own writes. Failed runs are not billed.

use tracing::debug;

use dexec_primitives::types::{u64_from_le_bytes, u64_to_le_bytes, to_hex};
use dexec_primitives::{
    apply_mutations, ExecError, ExecResult, ExecutionResult, Interpreter, KvStore, Mutation,
    StateOverlay, Step, GAS_USAGE_KEY, RUN_COUNT_KEY,
};
use dexec_sandbox::{SandboxConfig, SandboxError, WasmInterpreter};

use crate::execution::Execution;
use crate::validation::contract_name;

/// Runs the contract named by the `contractName` argument.
pub struct InterpretedExecution<I: Interpreter = WasmInterpreter> {
    interpreter: I,
}

impl InterpretedExecution<WasmInterpreter> {
    /// Backend over the Wasmtime sandbox with the built-in contracts.
    pub fn wasm() -> Result<Self, SandboxError> {
        Self::wasm_with_config(SandboxConfig::default())
    }

    pub fn wasm_with_config(config: SandboxConfig) -> Result<Self, SandboxError> {
        Ok(Self::new(WasmInterpreter::new(config)?))
    }
}

impl<I: Interpreter> InterpretedExecution<I> {
    pub fn new(interpreter: I) -> Self {
        Self { interpreter }
    }

    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }
}

/// Read a meter counter. Absent reads as zero.
fn read_meter(store: &dyn KvStore, key: &[u8]) -> ExecResult<u64> {
    match store.get(key)? {
        None => Ok(0),
        Some(bytes) => u64_from_le_bytes(&bytes).ok_or_else(|| {
            ExecError::StoreIo(format!(
                "meter {} holds {} bytes, expected 8",
                to_hex(key),
                bytes.len()
            ))
        }),
    }
}

/// The meter at `key` plus `amount`. Overflow is `StoreIo`.
fn advance_meter(store: &dyn KvStore, key: &[u8], amount: u64) -> ExecResult<u64> {
    read_meter(store, key)?.checked_add(amount).ok_or_else(|| {
        ExecError::StoreIo(format!("meter {} would overflow", to_hex(key)))
    })
}

impl<I: Interpreter> Execution for InterpretedExecution<I> {
    fn execute(&self, store: &mut dyn KvStore, step: &Step) -> ExecResult<ExecutionResult> {
        let name = contract_name(&step.current)?;
        let outcome = self.interpreter.run_program(name, store)?;

        let gas_total = advance_meter(store, &GAS_USAGE_KEY, outcome.gas_used)?;
        let runs = advance_meter(store, &RUN_COUNT_KEY, 1)?;

        let mut overlay = StateOverlay::new();
        for write in outcome.writes {
            match write {
                Mutation::Set { key, value } => overlay.set(key, value),
                Mutation::Delete { key } => overlay.delete(key),
            }
        }
        overlay.set(GAS_USAGE_KEY.to_vec(), u64_to_le_bytes(gas_total).to_vec());
        overlay.set(RUN_COUNT_KEY.to_vec(), u64_to_le_bytes(runs).to_vec());
        let mutations = overlay.into_mutations();

        apply_mutations(store, &mutations)?;
        debug!(contract = name, gas_used = outcome.gas_used, runs, "interpreted run committed");

        Ok(ExecutionResult {
            output: outcome.output,
            mutations,
            gas_used: outcome.gas_used,
        })
    }
}
