//! Transaction argument validation.
//!
//! Each backend parses the arguments it needs into a validated target before
//! touching the store or the network. Validation failures are
//! `InvalidArgument` and happen before any I/O other than address resolution.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use dexec_primitives::{ExecError, ExecResult, Transaction};

use crate::config::{DelegationConfig, FsConfig};

/// Contract to run on the interpreted backend.
pub const ARG_CONTRACT_NAME: &str = "contractName";
/// `host:port` of the socket peer.
pub const ARG_TCP_ADDR: &str = "tcp:addr";
pub const ARG_TCP_CONNECT_TIMEOUT: &str = "tcp:connect_timeout_ms";
pub const ARG_TCP_RESPONSE_TIMEOUT: &str = "tcp:response_timeout_ms";
/// Directory shared with the filesystem peer.
pub const ARG_FS_ROOT: &str = "fs:root";
pub const ARG_FS_TIMEOUT: &str = "fs:timeout_ms";
pub const ARG_FS_POLL_INTERVAL: &str = "fs:poll_interval_ms";

/// Read an optional UTF-8 argument.
pub fn utf8_arg<'a>(tx: &'a Transaction, name: &str) -> ExecResult<Option<&'a str>> {
    match tx.arg(name) {
        None => Ok(None),
        Some(bytes) => std::str::from_utf8(bytes)
            .map(Some)
            .map_err(|_| ExecError::InvalidArgument(format!("{} is not valid UTF-8", name))),
    }
}

/// Read a required, non-empty UTF-8 argument.
pub fn required_utf8<'a>(tx: &'a Transaction, name: &str) -> ExecResult<&'a str> {
    match utf8_arg(tx, name)? {
        Some(s) if !s.is_empty() => Ok(s),
        Some(_) => Err(ExecError::InvalidArgument(format!("{} is empty", name))),
        None => Err(ExecError::InvalidArgument(format!("missing argument {}", name))),
    }
}

/// Read an optional positive decimal millisecond count.
pub fn millis_arg(tx: &Transaction, name: &str) -> ExecResult<Option<Duration>> {
    let Some(text) = utf8_arg(tx, name)? else {
        return Ok(None);
    };
    match text.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(ExecError::InvalidArgument(format!(
            "{} must be a positive integer, got {:?}",
            name, text
        ))),
    }
}

/// The contract named by `contractName`.
pub fn contract_name(tx: &Transaction) -> ExecResult<&str> {
    required_utf8(tx, ARG_CONTRACT_NAME)
}

/// A validated socket peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTarget {
    /// Every address `tcp:addr` resolved to, tried in order.
    pub addrs: Vec<SocketAddr>,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub max_frame_len: usize,
}

impl SocketTarget {
    pub fn from_transaction(tx: &Transaction, config: &DelegationConfig) -> ExecResult<Self> {
        let addr = required_utf8(tx, ARG_TCP_ADDR)?;
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| {
                ExecError::InvalidArgument(format!("cannot resolve {} {:?}: {}", ARG_TCP_ADDR, addr, e))
            })?
            .collect();
        if addrs.is_empty() {
            return Err(ExecError::InvalidArgument(format!(
                "{} {:?} resolved to no addresses",
                ARG_TCP_ADDR, addr
            )));
        }

        Ok(Self {
            addrs,
            connect_timeout: millis_arg(tx, ARG_TCP_CONNECT_TIMEOUT)?
                .unwrap_or(config.connect_timeout),
            response_timeout: millis_arg(tx, ARG_TCP_RESPONSE_TIMEOUT)?
                .unwrap_or(config.response_timeout),
            max_frame_len: config.max_frame_len,
        })
    }
}

/// A validated filesystem peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsTarget {
    pub root: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub max_frame_len: usize,
}

impl FsTarget {
    pub fn from_transaction(tx: &Transaction, config: &FsConfig) -> ExecResult<Self> {
        let root = required_utf8(tx, ARG_FS_ROOT)?;
        Ok(Self {
            root: PathBuf::from(root),
            timeout: millis_arg(tx, ARG_FS_TIMEOUT)?.unwrap_or(config.timeout),
            poll_interval: millis_arg(tx, ARG_FS_POLL_INTERVAL)?.unwrap_or(config.poll_interval),
            max_frame_len: config.max_frame_len,
        })
    }
}
