//! Safe WASM linear memory read/write helpers with bounds checking.
//!
//! All functions validate pointer and length arguments against the guest's
//! linear memory size before accessing. Out-of-bounds access returns
//! `HostCallError::BadPointer`.

use crate::error::HostCallError;

/// Size of a WASM page in bytes.
pub const PAGE_SIZE: usize = 65536;

/// Resolve `[ptr, ptr+len)` to a slice range, or fail with `BadPointer`.
fn checked_range(mem_size: usize, ptr: i32, len: i32) -> Result<(usize, usize), HostCallError> {
    if ptr < 0 || len < 0 {
        return Err(HostCallError::BadPointer);
    }
    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .ok_or(HostCallError::BadPointer)?;
    if end > mem_size {
        return Err(HostCallError::BadPointer);
    }
    Ok((start, end))
}

/// Read `len` bytes from guest memory at `ptr`.
pub fn read_bytes(mem: &[u8], ptr: i32, len: i32) -> Result<Vec<u8>, HostCallError> {
    let (start, end) = checked_range(mem.len(), ptr, len)?;
    Ok(mem[start..end].to_vec())
}

/// Write `data` bytes to guest memory at `ptr`.
pub fn write_bytes(mem: &mut [u8], ptr: i32, data: &[u8]) -> Result<(), HostCallError> {
    let len = i32::try_from(data.len()).map_err(|_| HostCallError::TooLarge)?;
    let (start, end) = checked_range(mem.len(), ptr, len)?;
    mem[start..end].copy_from_slice(data);
    Ok(())
}

/// Validate that a pointer range `[ptr, ptr+len)` is within memory bounds.
pub fn validate_range(mem_size: usize, ptr: i32, len: i32) -> Result<(), HostCallError> {
    checked_range(mem_size, ptr, len).map(|_| ())
}
