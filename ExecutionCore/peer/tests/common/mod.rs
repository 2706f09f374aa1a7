//! Shared test helpers for peer integration tests.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpStream};

use dexec_peer::{PeerConfig, TcpPeer};
use dexec_primitives::codec::{decode_response, encode_request};
use dexec_primitives::frame::{read_frame, write_frame};
use dexec_primitives::types::u64_to_le_bytes;
use dexec_primitives::{DelegationRequest, DelegationResponse, STORE_KEY};

// ── Peer Factories ──

/// Start a TCP peer on an ephemeral port.
pub fn start_tcp_peer(config: PeerConfig) -> SocketAddr {
    let peer = TcpPeer::bind("127.0.0.1:0", config).unwrap();
    let addr = peer.local_addr().unwrap();
    peer.spawn();
    addr
}

// ── Requests ──

pub fn increment_request(tag: u64, counter: u64) -> Vec<u8> {
    encode_request(&DelegationRequest {
        tag,
        selector: "increment".into(),
        entries: vec![(STORE_KEY.to_vec(), u64_to_le_bytes(counter).to_vec())],
    })
}

/// Send one frame and read one reply on an open stream.
pub fn exchange(stream: &mut TcpStream, payload: &[u8]) -> DelegationResponse {
    write_frame(stream, payload).unwrap();
    let reply = read_frame(stream, 1 << 20).unwrap();
    decode_response(&reply).unwrap()
}
