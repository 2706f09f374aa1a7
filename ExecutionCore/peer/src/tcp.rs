//! TCP transport for the peer.
//!
//! Each accepted connection gets its own thread, which answers framed
//! requests in order until the client closes the connection. Clients that
//! pool connections send many requests over one stream.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use dexec_primitives::frame::{read_frame, write_frame, FrameError};

use crate::config::PeerConfig;
use crate::error::PeerError;
use crate::handler::handle_request;

pub struct TcpPeer {
    listener: TcpListener,
    config: Arc<PeerConfig>,
}

impl TcpPeer {
    pub fn bind(addr: impl ToSocketAddrs, config: PeerConfig) -> Result<Self, PeerError> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "peer listening");
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, PeerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub fn serve(self) -> Result<(), PeerError> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };
            let config = Arc::clone(&self.config);
            thread::spawn(move || serve_connection(stream, &config));
        }
        Ok(())
    }

    /// Serve on a background thread.
    pub fn spawn(self) -> JoinHandle<Result<(), PeerError>> {
        thread::spawn(move || self.serve())
    }
}

/// Answer requests on one connection until the client hangs up.
pub fn serve_connection(mut stream: TcpStream, config: &PeerConfig) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());
    info!(%peer, "connection accepted");
    let _ = stream.set_nodelay(true);

    let mut served = 0u64;
    loop {
        let payload = match read_frame(&mut stream, config.max_frame_len) {
            Ok(p) => p,
            Err(FrameError::Closed) => break,
            Err(e) => {
                warn!(%peer, error = %e, "dropping connection");
                break;
            }
        };
        let reply = handle_request(&payload, config);
        if let Err(e) = write_frame(&mut stream, &reply) {
            warn!(%peer, error = %e, "reply failed");
            break;
        }
        served += 1;
    }
    debug!(%peer, served, "connection closed");
    let _ = stream.shutdown(Shutdown::Both);
}
