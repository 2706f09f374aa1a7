//! Filesystem transport for the peer.
//!
//! The peer scans `requests/` under its root, claims each complete `.req`
//! file by removing it, and writes the reply to `responses/` via a temporary
//! file and a rename. Layout helpers live in `dexec_primitives::mailbox`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use dexec_primitives::frame::{decode_frame, encode_frame};
use dexec_primitives::mailbox;
use dexec_primitives::ExecError;

use crate::config::PeerConfig;
use crate::error::PeerError;
use crate::handler::{failure_response, handle_request_as};

pub struct FsPeer {
    root: PathBuf,
    config: Arc<PeerConfig>,
}

impl FsPeer {
    /// Serve the directory at `root`, creating its subdirectories.
    pub fn new(root: impl Into<PathBuf>, config: PeerConfig) -> Result<Self, PeerError> {
        let root = root.into();
        mailbox::ensure_layout(&root)?;
        info!(root = %root.display(), "peer watching directory");
        Ok(Self {
            root,
            config: Arc::new(config),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answer every request currently waiting. Returns how many were answered.
    pub fn serve_once(&self) -> Result<usize, PeerError> {
        let mut pending: Vec<(u64, PathBuf)> = fs::read_dir(mailbox::requests_dir(&self.root))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let tag = mailbox::parse_request_name(entry.file_name().to_str()?)?;
                Some((tag, entry.path()))
            })
            .collect();
        pending.sort();

        let mut answered = 0;
        for (tag, path) in pending {
            let Some(bytes) = claim(&path)? else {
                continue;
            };
            let reply = match decode_frame(&bytes, self.config.max_frame_len) {
                Ok(payload) => handle_request_as(payload, tag, &self.config),
                Err(e) => {
                    warn!(tag, error = %e, "malformed request file");
                    failure_response(tag, ExecError::from(e))
                }
            };
            let frame = encode_frame(&reply).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            mailbox::write_atomic(&mailbox::response_path(&self.root, tag), &frame)?;
            debug!(tag, "response written");
            answered += 1;
        }
        Ok(answered)
    }

    /// Poll forever. Returns only if the directory becomes unusable.
    pub fn serve(self) -> Result<(), PeerError> {
        let interval = self.config.poll_interval();
        loop {
            self.serve_once()?;
            thread::sleep(interval);
        }
    }

    /// Serve on a background thread.
    pub fn spawn(self) -> JoinHandle<Result<(), PeerError>> {
        thread::spawn(move || self.serve())
    }
}

/// Read and remove a request file. `None` if it vanished first.
fn claim(path: &Path) -> Result<Option<Vec<u8>>, PeerError> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match fs::remove_file(path) {
        Ok(()) => Ok(Some(bytes)),
        // Withdrawn by the client or claimed by another peer.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexec_primitives::codec::{decode_response, encode_request};
    use dexec_primitives::{DelegationRequest, ErrorCode, ResponseOutcome};

    fn drop_request(root: &Path, tag: u64, body: &[u8]) {
        mailbox::write_atomic(&mailbox::request_path(root, tag), body).unwrap();
    }

    fn read_reply(root: &Path, tag: u64) -> dexec_primitives::DelegationResponse {
        let bytes = fs::read(mailbox::response_path(root, tag)).unwrap();
        decode_response(decode_frame(&bytes, 1 << 20).unwrap()).unwrap()
    }

    #[test]
    fn test_new_requires_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsPeer::new(dir.path().join("missing"), PeerConfig::default()).is_err());
        FsPeer::new(dir.path(), PeerConfig::default()).unwrap();
        assert!(mailbox::requests_dir(dir.path()).is_dir());
        assert!(mailbox::responses_dir(dir.path()).is_dir());
    }

    #[test]
    fn test_serve_once_answers_and_claims() {
        let dir = tempfile::tempdir().unwrap();
        let peer = FsPeer::new(dir.path(), PeerConfig::default()).unwrap();

        let request = encode_request(&DelegationRequest {
            tag: 5,
            selector: "increment".into(),
            entries: vec![],
        });
        drop_request(dir.path(), 5, &encode_frame(&request).unwrap());

        assert_eq!(peer.serve_once().unwrap(), 1);
        assert!(!mailbox::request_path(dir.path(), 5).exists());
        let reply = read_reply(dir.path(), 5);
        assert_eq!(reply.tag, 5);
        assert!(matches!(reply.outcome, ResponseOutcome::Success { .. }));

        // nothing left to do
        assert_eq!(peer.serve_once().unwrap(), 0);
    }

    #[test]
    fn test_malformed_file_gets_error_under_its_tag() {
        let dir = tempfile::tempdir().unwrap();
        let peer = FsPeer::new(dir.path(), PeerConfig::default()).unwrap();
        drop_request(dir.path(), 9, b"\x01\x00");

        assert_eq!(peer.serve_once().unwrap(), 1);
        let reply = read_reply(dir.path(), 9);
        assert_eq!(reply.tag, 9);
        assert!(matches!(
            reply.outcome,
            ResponseOutcome::Failure { code: ErrorCode::ProtocolViolation, .. }
        ));
    }

    #[test]
    fn test_ignores_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let peer = FsPeer::new(dir.path(), PeerConfig::default()).unwrap();
        fs::write(mailbox::requests_dir(dir.path()).join("0000000000000001.req.tmp"), b"x").unwrap();
        assert_eq!(peer.serve_once().unwrap(), 0);
    }
}
