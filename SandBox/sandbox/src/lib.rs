//! `dexec-sandbox`: Wasmtime-based embedded interpreter for d-exec.
//!
//! This crate runs named contracts inside a Wasmtime sandbox and exposes them
//! through the `Interpreter` contract from `dexec-primitives`. It enforces:
//!
//! - **Determinism:** No SIMD, no threads, NaN canonicalization
//! - **Fuel metering:** Instruction-level metering to stop runaway loops
//! - **Gas metering:** Host call costs charged against a `GasMeter`
//! - **Memory limits:** Bounded linear memory growth
//! - **Import whitelisting:** Only `dexec_host` imports allowed, no WASI
//! - **Read sets:** A contract reads only the keys it declared
//!
//! The primary entry point is [`WasmInterpreter`]; the built-in `increment`
//! and `Ed25519` contracts live in [`contracts`].

pub mod error;
pub mod config;
pub mod memory;
pub mod host_impl;
pub mod validation;
pub mod linker;
pub mod contracts;
pub mod runtime;

pub use error::{HostCallError, SandboxError};
pub use config::SandboxConfig;
pub use contracts::Contract;
pub use runtime::WasmInterpreter;
