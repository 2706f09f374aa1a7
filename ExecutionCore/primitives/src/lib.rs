//! `dexec-primitives`: foundational types for d-exec.
//!
//! This crate provides the types shared by every execution backend, the
//! embedded interpreter, and the remote executor peer:
//!
//! - `KvStore` / `MemStore`: the store a computation reads and mutates
//! - `StateOverlay`: buffered writes, committed atomically or discarded
//! - `Transaction` / `Step`: the argument bag handed to a backend
//! - `ExecutionResult` / `Mutation`: what a backend produces
//! - `ExecError` / `ErrorCode`: the failure taxonomy and its wire codes
//! - `Computation`: the operations every backend can run
//! - `codec` / `frame`: the delegation protocol's byte layout
//! - `mailbox`: the filesystem transport's directory layout

pub mod types;
pub mod error;
pub mod gas;
pub mod store;
pub mod state;
pub mod transaction;
pub mod execution;
pub mod crypto;
pub mod computation;
pub mod protocol;
pub mod codec;
pub mod frame;
pub mod mailbox;

// Re-export commonly used types at the crate root for convenience.
pub use types::{
    Key, GAS_USAGE_KEY, MAX_KEY_LEN, MAX_VALUE_LEN, PROTOCOL_VERSION, RESULT_KEY,
    RUN_COUNT_KEY, STORE_KEY,
};
pub use error::{ErrorCode, ExecError, ExecResult, StoreError};
pub use gas::GasMeter;
pub use store::{KvStore, MemStore};
pub use state::{OverlayResult, StateOverlay};
pub use transaction::{Step, Transaction};
pub use execution::{apply_mutations, ExecutionResult, Interpreter, Mutation, ProgramOutcome};
pub use computation::{Computation, Effect};
pub use protocol::{DelegationRequest, DelegationResponse, ResponseOutcome};
pub use frame::{FrameError, DEFAULT_MAX_FRAME_LEN};
