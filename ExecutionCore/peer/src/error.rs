//! Peer error types.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Socket or directory I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PeerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
