//! Directory layout shared by the filesystem transport's two sides.
//!
//! ```text
//! <root>/requests/<tag>.req     written by the client, claimed by the peer
//! <root>/responses/<tag>.resp   written by the peer, consumed by the client
//! ```
//!
//! `<tag>` is the correlation tag as 16 lower-case hex digits. Every file is
//! written to `<name>.tmp` first and renamed into place, so a reader never
//! sees a partial body.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const REQUESTS_DIR: &str = "requests";
pub const RESPONSES_DIR: &str = "responses";
pub const REQUEST_EXT: &str = "req";
pub const RESPONSE_EXT: &str = "resp";

pub fn requests_dir(root: &Path) -> PathBuf {
    root.join(REQUESTS_DIR)
}

pub fn responses_dir(root: &Path) -> PathBuf {
    root.join(RESPONSES_DIR)
}

pub fn request_path(root: &Path, tag: u64) -> PathBuf {
    requests_dir(root).join(format!("{:016x}.{}", tag, REQUEST_EXT))
}

pub fn response_path(root: &Path, tag: u64) -> PathBuf {
    responses_dir(root).join(format!("{:016x}.{}", tag, RESPONSE_EXT))
}

/// Parse the tag out of a request file name such as `00000000000000ff.req`.
///
/// Temporary files and anything else return `None`.
pub fn parse_request_name(name: &str) -> Option<u64> {
    let hex = name.strip_suffix(REQUEST_EXT)?.strip_suffix('.')?;
    if hex.len() != 16 {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

/// Create both subdirectories if missing. `root` itself must already exist.
pub fn ensure_layout(root: &Path) -> io::Result<()> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        ));
    }
    fs::create_dir_all(requests_dir(root))?;
    fs::create_dir_all(responses_dir(root))?;
    Ok(())
}

/// Write `bytes` to `<path>.tmp`, then rename it to `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
