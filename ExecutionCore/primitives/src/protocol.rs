//! Delegation protocol messages.
//!
//! A remote backend sends one `DelegationRequest` per `execute` call and
//! waits for the `DelegationResponse` carrying the same correlation tag.
//! The byte layout lives in [`crate::codec`]; framing in [`crate::frame`].

use crate::computation::Effect;
use crate::error::{ErrorCode, ExecError, ExecResult};
use crate::execution::Mutation;

/// Request kind byte.
pub const KIND_REQUEST: u8 = 0x01;

/// Response kind byte.
pub const KIND_RESPONSE: u8 = 0x02;

/// A computation shipped to a peer, with the store entries it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRequest {
    /// Correlation tag, echoed by the peer.
    pub tag: u64,
    /// Which computation the peer should run.
    pub selector: String,
    /// Copies of the caller's store entries, as (key, value) pairs.
    /// Keys absent from the caller's store are not sent.
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
}

/// The peer's reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationResponse {
    pub tag: u64,
    pub outcome: ResponseOutcome,
}

/// Success payload or error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Success {
        output: Vec<u8>,
        mutations: Vec<Mutation>,
    },
    Failure {
        code: ErrorCode,
        message: String,
    },
}

impl DelegationResponse {
    /// Build the reply for a computation's result.
    pub fn from_result(tag: u64, result: ExecResult<Effect>) -> Self {
        let outcome = match result {
            Ok(effect) => ResponseOutcome::Success {
                output: effect.output,
                mutations: effect.mutations,
            },
            Err(err) => ResponseOutcome::Failure {
                code: err.code(),
                message: err.message().to_string(),
            },
        };
        Self { tag, outcome }
    }

    /// Turn the reply back into the computation's result, as seen locally.
    pub fn into_result(self) -> ExecResult<Effect> {
        match self.outcome {
            ResponseOutcome::Success { output, mutations } => Ok(Effect { output, mutations }),
            ResponseOutcome::Failure { code, message } => Err(ExecError::from_code(code, message)
                .unwrap_or_else(|| {
                    ExecError::ProtocolViolation("failure response with OK status".into())
                })),
        }
    }
}
