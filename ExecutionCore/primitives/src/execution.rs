//! Execution results, store mutations, and the interpreter contract.
//!
//! Every backend produces an `ExecutionResult` whose mutation list is sorted
//! by key with at most one entry per key, so the final store state does not
//! depend on the order mutations are applied in. `apply_mutations` commits
//! such a list all-or-nothing.

use crate::error::{ExecError, ExecResult};
use crate::store::KvStore;

/// One store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Mutation {
    /// The key this mutation touches.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Set { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Returns true if keys are strictly increasing (sorted, no duplicates).
pub fn is_canonical(mutations: &[Mutation]) -> bool {
    mutations.windows(2).all(|w| w[0].key() < w[1].key())
}

/// Successful outcome of one `execute` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Bytes produced by the computation.
    pub output: Vec<u8>,
    /// Mutations applied to the caller's store, sorted by key.
    pub mutations: Vec<Mutation>,
    /// Gas charged for the run; 0 for unmetered backends.
    pub gas_used: u64,
}

/// What an interpreter returns for a successful program run.
///
/// `writes` are buffered, not yet applied to any store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramOutcome {
    pub output: Vec<u8>,
    pub gas_used: u64,
    pub writes: Vec<Mutation>,
}

/// An embedded interpreter that runs named programs against a store.
///
/// Implementations read through `store` but never write to it; writes come
/// back in `ProgramOutcome::writes`. Errors are `UnknownContract`,
/// `InterpreterFault`, or `StoreIo`.
pub trait Interpreter: Send + Sync {
    fn run_program(&self, name: &str, store: &dyn KvStore) -> ExecResult<ProgramOutcome>;
}

/// Apply `mutations` to `store` in order, all-or-nothing.
///
/// The prior value of every touched key is read first. If a write fails
/// part-way, the already-applied writes are reverted from that snapshot and
/// the original store error is returned.
pub fn apply_mutations(store: &mut dyn KvStore, mutations: &[Mutation]) -> ExecResult<()> {
    let mut prior = Vec::with_capacity(mutations.len());
    for mutation in mutations {
        prior.push(store.get(mutation.key())?);
    }

    for (applied, mutation) in mutations.iter().enumerate() {
        let outcome = match mutation {
            Mutation::Set { key, value } => store.set(key, value),
            Mutation::Delete { key } => store.delete(key),
        };
        if let Err(err) = outcome {
            let rollback = revert(store, &mutations[..applied], &prior[..applied]);
            return Err(match rollback {
                Ok(()) => ExecError::from(err),
                Err(rb) => ExecError::StoreIo(format!("{}; rollback failed: {}", err, rb)),
            });
        }
    }
    Ok(())
}

fn revert(
    store: &mut dyn KvStore,
    applied: &[Mutation],
    prior: &[Option<Vec<u8>>],
) -> Result<(), crate::error::StoreError> {
    for (mutation, before) in applied.iter().zip(prior).rev() {
        match before {
            Some(value) => store.set(mutation.key(), value)?,
            None => store.delete(mutation.key())?,
        }
    }
    Ok(())
}
