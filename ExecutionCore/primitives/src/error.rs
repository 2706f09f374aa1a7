//! Error types for d-exec.
//!
//! `ExecError` is the single failure taxonomy every backend returns.
//! `ErrorCode` is its one-byte wire form, carried in delegation responses so a
//! peer-side failure surfaces locally as the same kind.

use std::fmt;

/// Wire error codes carried in a response's status byte.
///
/// These repr values are part of the protocol and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    Ok = 0,
    InvalidArgument = 1,
    UnknownContract = 2,
    InterpreterFault = 3,
    StoreIo = 4,
    PeerUnreachable = 5,
    ProtocolViolation = 6,
}

impl ErrorCode {
    /// Convert from a status byte.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidArgument),
            2 => Some(Self::UnknownContract),
            3 => Some(Self::InterpreterFault),
            4 => Some(Self::StoreIo),
            5 => Some(Self::PeerUnreachable),
            6 => Some(Self::ProtocolViolation),
            _ => None,
        }
    }

    /// Return the status byte for this code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true if this is the `Ok` variant.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::InvalidArgument => write!(f, "ERR_INVALID_ARGUMENT"),
            Self::UnknownContract => write!(f, "ERR_UNKNOWN_CONTRACT"),
            Self::InterpreterFault => write!(f, "ERR_INTERPRETER_FAULT"),
            Self::StoreIo => write!(f, "ERR_STORE_IO"),
            Self::PeerUnreachable => write!(f, "ERR_PEER_UNREACHABLE"),
            Self::ProtocolViolation => write!(f, "ERR_PROTOCOL_VIOLATION"),
        }
    }
}

/// Execution error returned by every backend.
///
/// A failed `execute` call leaves the caller's store exactly as it was,
/// whatever the variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// The transaction is missing a required argument or carries a malformed one.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The interpreted backend does not know the requested contract.
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// The computation trapped or rejected its input.
    #[error("interpreter fault: {0}")]
    InterpreterFault(String),

    /// An underlying store operation failed.
    #[error("store I/O error: {0}")]
    StoreIo(String),

    /// Connect or response timeout, reset, or an unusable transport.
    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    /// A malformed or version-incompatible frame was received.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

impl ExecError {
    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::UnknownContract(_) => ErrorCode::UnknownContract,
            Self::InterpreterFault(_) => ErrorCode::InterpreterFault,
            Self::StoreIo(_) => ErrorCode::StoreIo,
            Self::PeerUnreachable(_) => ErrorCode::PeerUnreachable,
            Self::ProtocolViolation(_) => ErrorCode::ProtocolViolation,
        }
    }

    /// The message carried by this error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::UnknownContract(m)
            | Self::InterpreterFault(m)
            | Self::StoreIo(m)
            | Self::PeerUnreachable(m)
            | Self::ProtocolViolation(m) => m,
        }
    }

    /// Rebuild an error from a wire code and message.
    ///
    /// Returns `None` for `ErrorCode::Ok`, which is not an error.
    pub fn from_code(code: ErrorCode, message: String) -> Option<Self> {
        let err = match code {
            ErrorCode::Ok => return None,
            ErrorCode::InvalidArgument => Self::InvalidArgument(message),
            ErrorCode::UnknownContract => Self::UnknownContract(message),
            ErrorCode::InterpreterFault => Self::InterpreterFault(message),
            ErrorCode::StoreIo => Self::StoreIo(message),
            ErrorCode::PeerUnreachable => Self::PeerUnreachable(message),
            ErrorCode::ProtocolViolation => Self::ProtocolViolation(message),
        };
        Some(err)
    }
}

/// Failure reported by a `KvStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<StoreError> for ExecError {
    fn from(err: StoreError) -> Self {
        Self::StoreIo(err.0)
    }
}

/// Convenience result type for the execution layer.
pub type ExecResult<T> = Result<T, ExecError>;
