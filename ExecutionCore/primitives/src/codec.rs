//! Byte layout of delegation payloads.
//!
//! All numeric values are little-endian.
//!
//! Encoding format:
//! - Every payload starts with `[version: u8][kind: u8][tag: u64]`
//! - Variable-length fields are length-prefixed (u32 LE)
//! - Repeated fields are count-prefixed (u32 LE) then concatenated
//!
//! Request: header, selector, then `entry_count` × (key, value).
//! Response: header, `status: u8`; on status 0 the output and
//! `mutation_count` × (`op: u8`, key, value if op is set); otherwise an error
//! message.
//!
//! Decoding rejects an unknown version, a wrong kind, oversized fields,
//! non-canonical mutation lists, and trailing bytes, all as
//! `ExecError::ProtocolViolation`.

use crate::error::{ErrorCode, ExecError};
use crate::execution::{is_canonical, Mutation};
use crate::protocol::{
    DelegationRequest, DelegationResponse, ResponseOutcome, KIND_REQUEST, KIND_RESPONSE,
};
use crate::types::{MAX_KEY_LEN, MAX_VALUE_LEN, PROTOCOL_VERSION};

/// Upper bound on a selector's length.
const MAX_SELECTOR_LEN: usize = 64;

/// Upper bound on an error message's length.
const MAX_MESSAGE_LEN: usize = 4096;

const OP_SET: u8 = 0;
const OP_DELETE: u8 = 1;

fn violation(msg: impl Into<String>) -> ExecError {
    ExecError::ProtocolViolation(msg.into())
}

/// A cursor for reading bytes during decoding.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ExecError> {
        if n > self.remaining() {
            return Err(violation("unexpected end of payload"));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, ExecError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, ExecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, ExecError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.read_bytes(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_var_bytes(&mut self, max: usize, what: &str) -> Result<Vec<u8>, ExecError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(violation(format!("{} too long: {} bytes", what, len)));
        }
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn read_string(&mut self, max: usize, what: &str) -> Result<String, ExecError> {
        let bytes = self.read_var_bytes(max, what)?;
        String::from_utf8(bytes).map_err(|_| violation(format!("{} is not UTF-8", what)))
    }

    /// Read an element count, refusing counts the remaining bytes cannot hold.
    fn read_count(&mut self, min_element_len: usize) -> Result<usize, ExecError> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_element_len) > self.remaining() {
            return Err(violation("element count exceeds payload"));
        }
        Ok(count)
    }

    fn finish(self) -> Result<(), ExecError> {
        if self.remaining() != 0 {
            return Err(violation(format!("{} trailing bytes", self.remaining())));
        }
        Ok(())
    }
}

// ── Encoding helpers ──

fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

fn write_header(buf: &mut Vec<u8>, kind: u8, tag: u64) {
    write_u8(buf, PROTOCOL_VERSION);
    write_u8(buf, kind);
    write_u64(buf, tag);
}

fn read_header(r: &mut Reader<'_>, expected_kind: u8) -> Result<u64, ExecError> {
    let version = r.read_u8()?;
    if version != PROTOCOL_VERSION {
        return Err(violation(format!(
            "unsupported protocol version {} (expected {})",
            version, PROTOCOL_VERSION
        )));
    }
    let kind = r.read_u8()?;
    if kind != expected_kind {
        return Err(violation(format!(
            "unexpected message kind 0x{:02x} (expected 0x{:02x})",
            kind, expected_kind
        )));
    }
    r.read_u64()
}

// ── DelegationRequest ──

/// Encode a request payload.
pub fn encode_request(req: &DelegationRequest) -> Vec<u8> {
    let body: usize = req.entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut buf = Vec::with_capacity(14 + req.selector.len() + 4 + body);

    write_header(&mut buf, KIND_REQUEST, req.tag);
    write_var_bytes(&mut buf, req.selector.as_bytes());
    write_u32(&mut buf, req.entries.len() as u32);
    for (key, value) in &req.entries {
        write_var_bytes(&mut buf, key);
        write_var_bytes(&mut buf, value);
    }
    buf
}

/// Decode a request payload.
pub fn decode_request(data: &[u8]) -> Result<DelegationRequest, ExecError> {
    let mut r = Reader::new(data);
    let tag = read_header(&mut r, KIND_REQUEST)?;
    let selector = r.read_string(MAX_SELECTOR_LEN, "selector")?;

    let count = r.read_count(8)?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let key = r.read_var_bytes(MAX_KEY_LEN, "key")?;
        let value = r.read_var_bytes(MAX_VALUE_LEN, "value")?;
        entries.push((key, value));
    }
    r.finish()?;

    Ok(DelegationRequest {
        tag,
        selector,
        entries,
    })
}

// ── DelegationResponse ──

/// Encode a response payload.
pub fn encode_response(resp: &DelegationResponse) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_header(&mut buf, KIND_RESPONSE, resp.tag);

    match &resp.outcome {
        ResponseOutcome::Success { output, mutations } => {
            write_u8(&mut buf, ErrorCode::Ok.as_u8());
            write_var_bytes(&mut buf, output);
            write_u32(&mut buf, mutations.len() as u32);
            for mutation in mutations {
                match mutation {
                    Mutation::Set { key, value } => {
                        write_u8(&mut buf, OP_SET);
                        write_var_bytes(&mut buf, key);
                        write_var_bytes(&mut buf, value);
                    }
                    Mutation::Delete { key } => {
                        write_u8(&mut buf, OP_DELETE);
                        write_var_bytes(&mut buf, key);
                    }
                }
            }
        }
        ResponseOutcome::Failure { code, message } => {
            write_u8(&mut buf, code.as_u8());
            write_var_bytes(&mut buf, message.as_bytes());
        }
    }
    buf
}

/// Decode a response payload.
pub fn decode_response(data: &[u8]) -> Result<DelegationResponse, ExecError> {
    let mut r = Reader::new(data);
    let tag = read_header(&mut r, KIND_RESPONSE)?;

    let status = r.read_u8()?;
    let code = ErrorCode::from_u8(status)
        .ok_or_else(|| violation(format!("unknown status code {}", status)))?;

    let outcome = if code.is_ok() {
        let output = r.read_var_bytes(MAX_VALUE_LEN, "output")?;
        let count = r.read_count(5)?;
        let mut mutations = Vec::with_capacity(count);
        for _ in 0..count {
            let op = r.read_u8()?;
            let key = r.read_var_bytes(MAX_KEY_LEN, "key")?;
            let mutation = match op {
                OP_SET => Mutation::Set {
                    key,
                    value: r.read_var_bytes(MAX_VALUE_LEN, "value")?,
                },
                OP_DELETE => Mutation::Delete { key },
                _ => return Err(violation(format!("unknown mutation op {}", op))),
            };
            mutations.push(mutation);
        }
        if !is_canonical(&mutations) {
            return Err(violation("mutations are not sorted by unique key"));
        }
        ResponseOutcome::Success { output, mutations }
    } else {
        let message = r.read_string(MAX_MESSAGE_LEN, "error message")?;
        ResponseOutcome::Failure { code, message }
    };
    r.finish()?;

    Ok(DelegationResponse { tag, outcome })
}
