//! Transport configuration.
//!
//! Both structs hold defaults; a transaction can override the timeouts per
//! call (see [`crate::validation`]).

use std::time::Duration;

use dexec_primitives::DEFAULT_MAX_FRAME_LEN;

/// Socket delegation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on each blocking read or write of the exchange.
    pub response_timeout: Duration,
    /// Largest response frame accepted.
    pub max_frame_len: usize,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(5),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Filesystem delegation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    /// How long to wait for the response file.
    pub timeout: Duration,
    /// Delay between checks for the response file.
    pub poll_interval: Duration,
    pub max_frame_len: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(2),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}
