//! `dexec-engine`: interchangeable transaction execution backends.
//!
//! Every backend implements [`Execution`]: given a store and a transaction
//! step, run one computation and apply its mutations atomically. A caller
//! cannot tell from the interface which backend ran.
//!
//! ## Backends
//!
//! - [`NativeExecution`]: in-process computation, the zero-overhead baseline
//! - [`InterpretedExecution`]: named contracts in the Wasmtime sandbox, metered
//! - [`RemoteSocketExecution`]: delegation to a peer over TCP
//! - [`RemoteFsExecution`]: delegation to a peer through a shared directory
//!
//! ## Supporting modules
//!
//! - [`validation`]: transaction arguments parsed into per-backend targets
//! - [`config`]: transport defaults
//! - [`delegation`]: request building, response correlation, commit

pub mod execution;
pub mod config;
pub mod validation;
pub mod delegation;
pub mod native;
pub mod interpreted;
pub mod remote;
pub mod remote_fs;

// Re-export key types for convenience
pub use config::{DelegationConfig, FsConfig};
pub use execution::Execution;
pub use interpreted::InterpretedExecution;
pub use native::NativeExecution;
pub use remote::RemoteSocketExecution;
pub use remote_fs::RemoteFsExecution;
