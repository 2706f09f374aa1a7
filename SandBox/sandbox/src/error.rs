//! Sandbox error types.

use dexec_primitives::{ExecError, StoreError};

/// Top-level error type for the sandbox crate.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Wasmtime engine, compilation, or instantiation error.
    #[error("wasmtime error: {0:#}")]
    Wasmtime(#[from] anyhow::Error),

    /// Module validation failed (missing exports, bad imports, etc.).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No contract is registered under this name.
    #[error("no contract named '{0}'")]
    UnknownContract(String),

    /// Reading the contract's read set from the caller's store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Fuel exhausted during execution.
    #[error("fuel exhausted (instruction limit)")]
    FuelExhausted,

    /// A host call the contract may not recover from.
    #[error("host call aborted: {0}")]
    HostAborted(HostCallError),

    /// Guest returned non-zero from `run`.
    #[error("contract exited with status {status}{}", exit_suffix(.last_error))]
    ExitStatus {
        status: i32,
        last_error: Option<HostCallError>,
    },

    /// WASM guest trapped.
    #[error("guest trapped: {0}")]
    GuestTrapped(String),
}

fn exit_suffix(last_error: &Option<HostCallError>) -> String {
    match last_error {
        Some(e) => format!(" after {}", e),
        None => String::new(),
    }
}

impl From<SandboxError> for ExecError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::UnknownContract(name) => ExecError::UnknownContract(name),
            SandboxError::Store(e) => ExecError::StoreIo(e.0),
            other => ExecError::InterpreterFault(other.to_string()),
        }
    }
}

/// Failure of one `dexec_host` call, reported to the guest as a negative code.
///
/// Fatal variants trap the guest instead of returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HostCallError {
    #[error("pointer out of bounds")]
    BadPointer,
    #[error("read of undeclared key")]
    UndeclaredKey,
    #[error("output buffer too small")]
    BufferTooSmall,
    #[error("write to metering key")]
    MeteringKey,
    #[error("host gas exhausted")]
    OutOfGas,
    #[error("invalid Ed25519 scalar")]
    InvalidScalar,
    #[error("key or value too large")]
    TooLarge,
}

impl HostCallError {
    /// The negative status returned to the guest.
    pub fn code(self) -> i32 {
        match self {
            Self::BadPointer => -1,
            Self::UndeclaredKey => -2,
            Self::BufferTooSmall => -3,
            Self::MeteringKey => -4,
            Self::OutOfGas => -5,
            Self::InvalidScalar => -6,
            Self::TooLarge => -7,
        }
    }

    /// Returns true if the guest must not continue after this error.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::UndeclaredKey | Self::MeteringKey | Self::OutOfGas)
    }
}
