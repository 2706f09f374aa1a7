//! Length-prefixed framing for delegation payloads.
//!
//! A frame is `[len: u32 LE][payload; len]`. The same layout is used on a
//! socket and as the whole body of a request or response file.

use std::io::{self, Read, Write};

use crate::error::ExecError;

/// Largest payload accepted unless the caller configures otherwise.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Why a frame could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended before any byte of the frame arrived.
    #[error("connection closed")]
    Closed,

    /// The stream ended part-way through the frame.
    #[error("truncated frame: got {got} of {expected} bytes")]
    Truncated { expected: usize, got: usize },

    #[error("frame of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },

    /// Bytes follow a complete frame in a file body.
    #[error("{0} trailing bytes after frame")]
    Trailing(usize),

    #[error("timed out waiting for frame")]
    Timeout,

    #[error("frame I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for FrameError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::Closed,
            _ => Self::Io(err),
        }
    }
}

impl From<FrameError> for ExecError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Closed | FrameError::Timeout | FrameError::Io(_) => {
                ExecError::PeerUnreachable(err.to_string())
            }
            FrameError::Truncated { .. } | FrameError::TooLarge { .. } | FrameError::Trailing(_) => {
                ExecError::ProtocolViolation(err.to_string())
            }
        }
    }
}

/// Read into `buf` until it is full or the stream ends. Returns bytes read.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize, FrameError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read one frame, returning its payload.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, FrameError> {
    let mut prefix = [0u8; LEN_PREFIX];
    match read_full(reader, &mut prefix)? {
        0 => return Err(FrameError::Closed),
        LEN_PREFIX => {}
        got => {
            return Err(FrameError::Truncated {
                expected: LEN_PREFIX,
                got,
            })
        }
    }

    let len = u32::from_le_bytes(prefix) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    let got = read_full(reader, &mut payload)?;
    if got != len {
        return Err(FrameError::Truncated { expected: len, got });
    }
    Ok(payload)
}

/// Write one frame and flush.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    writer.write_all(&encode_frame(payload)?)?;
    writer.flush()?;
    Ok(())
}

/// Prefix `payload` with its length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    let mut buf = Vec::with_capacity(LEN_PREFIX + payload.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Split a file body holding exactly one frame into its payload.
pub fn decode_frame(data: &[u8], max_len: usize) -> Result<&[u8], FrameError> {
    if data.is_empty() {
        return Err(FrameError::Closed);
    }
    if data.len() < LEN_PREFIX {
        return Err(FrameError::Truncated {
            expected: LEN_PREFIX,
            got: data.len(),
        });
    }
    let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if len > max_len {
        return Err(FrameError::TooLarge { len, max: max_len });
    }
    let body = &data[LEN_PREFIX..];
    if body.len() < len {
        return Err(FrameError::Truncated {
            expected: len,
            got: body.len(),
        });
    }
    if body.len() > len {
        return Err(FrameError::Trailing(body.len() - len));
    }
    Ok(body)
}
