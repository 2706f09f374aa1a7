//! Remote-filesystem backend: delegate the computation through a directory
//! shared with a peer.
//!
//! The request frame is dropped into `requests/`, and the backend polls
//! `responses/` for the file carrying the same tag. See
//! [`dexec_primitives::mailbox`] for the layout.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use dexec_primitives::codec::encode_request;
use dexec_primitives::frame::{decode_frame, encode_frame};
use dexec_primitives::mailbox;
use dexec_primitives::{
    Computation, DelegationResponse, ExecError, ExecResult, ExecutionResult, KvStore, Step,
};

use crate::config::FsConfig;
use crate::delegation::{build_request, commit, correlate, TagSource};
use crate::execution::Execution;
use crate::validation::FsTarget;

fn unreachable_io(what: &str, err: io::Error) -> ExecError {
    ExecError::PeerUnreachable(format!("{}: {}", what, err))
}

/// Remove both mailbox files for `tag`, whichever exist.
///
/// A peer that claimed the request before this runs may still write its
/// response afterwards; that file is left behind in `responses/`.
fn withdraw(root: &Path, tag: u64) {
    for path in [mailbox::request_path(root, tag), mailbox::response_path(root, tag)] {
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "withdraw failed");
            }
        }
    }
}

/// Delegates a fixed computation to the peer serving `fs:root`.
#[derive(Debug)]
pub struct RemoteFsExecution {
    computation: Computation,
    config: FsConfig,
    tags: TagSource,
}

impl RemoteFsExecution {
    pub fn new(computation: Computation) -> Self {
        Self {
            computation,
            config: FsConfig::default(),
            tags: TagSource::new(),
        }
    }

    pub fn with_config(mut self, config: FsConfig) -> Self {
        self.config = config;
        self
    }

    fn exchange(&self, target: &FsTarget, tag: u64, payload: &[u8]) -> ExecResult<DelegationResponse> {
        mailbox::ensure_layout(&target.root)
            .map_err(|e| unreachable_io("shared directory unusable", e))?;

        let frame = encode_frame(payload)?;
        let request_path = mailbox::request_path(&target.root, tag);
        mailbox::write_atomic(&request_path, &frame)
            .map_err(|e| unreachable_io("cannot write request", e))?;

        let response_path = mailbox::response_path(&target.root, tag);
        let deadline = Instant::now() + target.timeout;
        loop {
            match fs::read(&response_path) {
                Ok(bytes) => {
                    let _ = fs::remove_file(&response_path);
                    let reply = decode_frame(&bytes, target.max_frame_len)?;
                    return correlate(reply, tag);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    let _ = fs::remove_file(&request_path);
                    return Err(unreachable_io("cannot read response", e));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                withdraw(&target.root, tag);
                return Err(ExecError::PeerUnreachable(format!(
                    "no response after {:?}",
                    target.timeout
                )));
            }
            thread::sleep(target.poll_interval.min(deadline - now));
        }
    }
}

impl Execution for RemoteFsExecution {
    #[tracing::instrument(
        skip_all,
        fields(selector = self.computation.selector(), tag = tracing::field::Empty)
    )]
    fn execute(&self, store: &mut dyn KvStore, step: &Step) -> ExecResult<ExecutionResult> {
        let target = FsTarget::from_transaction(&step.current, &self.config)?;
        let tag = self.tags.next();
        tracing::Span::current().record("tag", tag);

        let request = build_request(self.computation, tag, store)?;
        let payload = encode_request(&request);

        let response = self.exchange(&target, tag, &payload).inspect_err(|e| {
            warn!(root = %target.root.display(), error = %e, "delegation failed");
        })?;
        debug!(root = %target.root.display(), "response received");

        let effect = response.into_result()?;
        commit(store, effect)
    }
}
