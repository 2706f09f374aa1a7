//! Peer configuration.
//!
//! Loadable from JSON; every field is optional:
//!
//! ```json
//! { "allow": ["increment"], "max_frame_len": 1048576, "poll_interval_ms": 5 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use dexec_primitives::{Computation, DEFAULT_MAX_FRAME_LEN};

use crate::error::PeerError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    /// Computations this peer will run. Anything else is `UnknownContract`.
    pub allow: Vec<Computation>,
    /// Largest request frame accepted.
    pub max_frame_len: usize,
    /// Delay between scans of the requests directory.
    pub poll_interval_ms: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            allow: Computation::ALL.to_vec(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            poll_interval_ms: 2,
        }
    }
}

impl PeerConfig {
    /// Peer that runs only `allow`.
    pub fn allowing(allow: Vec<Computation>) -> Self {
        Self {
            allow,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, PeerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PeerError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PeerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn allows(&self, computation: Computation) -> bool {
        self.allow.contains(&computation)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
