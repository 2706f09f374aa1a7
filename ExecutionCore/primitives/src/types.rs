//! Core type aliases and constants shared across d-exec.
//!
//! The well-known keys are 32 bytes, zero-padded after a one-byte tag at
//! index 2, so `STORE_KEY` is `[0, 0, 10, 0, ..]`.

/// 32-byte store key.
pub type Key = [u8; 32];

/// Current delegation protocol version. Leading byte of every payload.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum key length accepted on the wire.
pub const MAX_KEY_LEN: usize = 256;

/// Maximum value length accepted on the wire.
pub const MAX_VALUE_LEN: usize = 65_536; // 64 KiB

/// Input slot: the counter for `increment`, the scalar for `Ed25519`.
pub const STORE_KEY: Key = well_known_key(10);

/// Cumulative gas used by committed interpreted executions (LE u64).
pub const GAS_USAGE_KEY: Key = well_known_key(20);

/// Cumulative count of committed interpreted executions (LE u64).
pub const RUN_COUNT_KEY: Key = well_known_key(30);

/// Output slot for the `Ed25519` computation's point.
pub const RESULT_KEY: Key = well_known_key(40);

const fn well_known_key(tag: u8) -> Key {
    let mut key = [0u8; 32];
    key[2] = tag;
    key
}

/// Returns true for the keys the interpreted backend reserves for metering.
pub fn is_metering_key(key: &[u8]) -> bool {
    key == GAS_USAGE_KEY || key == RUN_COUNT_KEY
}

/// Encode a u64 as little-endian bytes.
pub fn u64_to_le_bytes(v: u64) -> [u8; 8] {
    v.to_le_bytes()
}

/// Decode a u64 from exactly eight little-endian bytes.
pub fn u64_from_le_bytes(bytes: &[u8]) -> Option<u64> {
    let buf: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_le_bytes(buf))
}

/// Render bytes as lower-case hex, for log fields.
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(s, "{:02x}", byte);
    }
    s
}
