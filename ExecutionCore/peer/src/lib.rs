//! `dexec-peer`: the remote side of d-exec delegation.
//!
//! A peer decodes delegation requests, runs the named computation against a
//! store seeded with the entries the caller shipped, and replies with the
//! output and mutations. It never holds the caller's store.
//!
//! - [`handler`]: one request payload in, one response payload out
//! - [`tcp::TcpPeer`]: framed requests over TCP, one thread per connection
//! - [`fs::FsPeer`]: request and response files in a shared directory

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handler;
pub mod tcp;
pub mod fs;

pub use config::PeerConfig;
pub use error::PeerError;
pub use fs::FsPeer;
pub use handler::handle_request;
pub use tcp::TcpPeer;
