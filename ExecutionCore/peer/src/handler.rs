//! Request handling shared by every peer transport.

use tracing::{debug, warn};

use dexec_primitives::codec::{decode_request, encode_response};
use dexec_primitives::{
    Computation, DelegationRequest, DelegationResponse, Effect, ExecError, ExecResult, MemStore,
};

use crate::config::PeerConfig;

/// Decode one request payload, run it, and encode the reply.
///
/// Never fails: problems become error responses. A payload that does not
/// decode is answered with a `ProtocolViolation` carrying tag 0.
pub fn handle_request(payload: &[u8], config: &PeerConfig) -> Vec<u8> {
    handle_request_as(payload, 0, config)
}

/// Like [`handle_request`], answering undecodable payloads with `fallback_tag`.
pub fn handle_request_as(payload: &[u8], fallback_tag: u64, config: &PeerConfig) -> Vec<u8> {
    let response = match decode_request(payload) {
        Ok(request) => DelegationResponse::from_result(request.tag, run(&request, config)),
        Err(err) => {
            warn!(error = %err, "malformed request");
            DelegationResponse::from_result(fallback_tag, Err(err))
        }
    };
    encode_response(&response)
}

/// Encode an error reply for a request that could not even be read.
pub fn failure_response(tag: u64, err: ExecError) -> Vec<u8> {
    encode_response(&DelegationResponse::from_result(tag, Err(err)))
}

fn run(request: &DelegationRequest, config: &PeerConfig) -> ExecResult<Effect> {
    let computation = Computation::from_selector(&request.selector)
        .filter(|c| config.allows(*c))
        .ok_or_else(|| ExecError::UnknownContract(request.selector.clone()))?;

    let mut store = MemStore::new();
    for (key, value) in &request.entries {
        store.insert(key.clone(), value.clone());
    }

    let result = computation.compute(&store);
    debug!(
        tag = request.tag,
        selector = %computation,
        ok = result.is_ok(),
        "request handled"
    );
    result
}
