//! Pieces shared by the remote backends.
//!
//! A delegated call is: build a request from the computation's input keys,
//! ship it, correlate the reply to the request's tag, then commit the
//! returned mutations. Only the transport in the middle differs between the
//! socket and filesystem backends.

use std::sync::atomic::{AtomicU64, Ordering};

use dexec_primitives::codec::decode_response;
use dexec_primitives::execution::is_canonical;
use dexec_primitives::{
    apply_mutations, Computation, DelegationRequest, DelegationResponse, Effect, ExecError,
    ExecResult, ExecutionResult, KvStore,
};

/// Source of correlation tags, unique per backend instance.
#[derive(Debug)]
pub struct TagSource(AtomicU64);

impl TagSource {
    /// Start from a random tag so independent clients rarely collide.
    pub fn new() -> Self {
        Self(AtomicU64::new(rand::random()))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for TagSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy the computation's input entries out of `store`.
///
/// Absent keys are left out; the peer reads them as absent too.
pub fn build_request(
    computation: Computation,
    tag: u64,
    store: &dyn KvStore,
) -> ExecResult<DelegationRequest> {
    let mut entries = Vec::with_capacity(computation.input_keys().len());
    for key in computation.input_keys() {
        if let Some(value) = store.get(key)? {
            entries.push((key.to_vec(), value));
        }
    }
    Ok(DelegationRequest {
        tag,
        selector: computation.selector().to_string(),
        entries,
    })
}

/// Decode a response payload and check it answers request `tag`.
pub fn correlate(payload: &[u8], tag: u64) -> ExecResult<DelegationResponse> {
    let response = decode_response(payload)?;
    if response.tag != tag {
        return Err(ExecError::ProtocolViolation(format!(
            "response tag {:016x} does not match request tag {:016x}",
            response.tag, tag
        )));
    }
    Ok(response)
}

/// Apply an effect to `store` atomically and report it as the call's result.
pub fn commit(store: &mut dyn KvStore, effect: Effect) -> ExecResult<ExecutionResult> {
    if !is_canonical(&effect.mutations) {
        return Err(ExecError::ProtocolViolation(
            "mutations are not sorted by unique key".into(),
        ));
    }
    apply_mutations(store, &effect.mutations)?;
    Ok(ExecutionResult {
        output: effect.output,
        mutations: effect.mutations,
        gas_used: 0,
    })
}
