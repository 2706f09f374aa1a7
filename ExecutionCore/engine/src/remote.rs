//! Remote-socket backend: delegate the computation to a peer over TCP.
//!
//! One `execute` call is one framed request and one framed response on a
//! single connection. Connecting is bounded by the connect timeout, and the
//! whole exchange after it by one response deadline. With
//! pooling enabled, a connection is reused only after an exchange that ended
//! with a correctly correlated response.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use dexec_primitives::codec::encode_request;
use dexec_primitives::frame::{read_frame, write_frame};
use dexec_primitives::{
    Computation, DelegationResponse, ExecError, ExecResult, ExecutionResult, KvStore, Step,
};

use crate::config::DelegationConfig;
use crate::delegation::{build_request, commit, correlate, TagSource};
use crate::execution::Execution;
use crate::validation::SocketTarget;

/// Idle connections kept per peer address.
const MAX_IDLE_PER_PEER: usize = 8;

/// An open connection to one peer.
#[derive(Debug)]
pub struct Session {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Session {
    /// Connect to the first reachable address of `target`.
    pub fn connect(target: &SocketTarget) -> ExecResult<Self> {
        let mut last_err = None;
        for addr in &target.addrs {
            match TcpStream::connect_timeout(addr, target.connect_timeout) {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    return Ok(Self { stream, peer: *addr });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "connect failed");
                    last_err = Some((*addr, e));
                }
            }
        }
        Err(ExecError::PeerUnreachable(match last_err {
            Some((addr, e)) => format!("connect to {} failed: {}", addr, e),
            None => "no address to connect to".into(),
        }))
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one request payload and wait for the correlated response.
    ///
    /// The write and every read share one deadline, `response_timeout`
    /// after the call starts. A peer trickling bytes cannot stretch it.
    pub fn round_trip(
        &mut self,
        target: &SocketTarget,
        tag: u64,
        payload: &[u8],
    ) -> ExecResult<DelegationResponse> {
        let mut stream = DeadlineStream {
            stream: &self.stream,
            deadline: Instant::now() + target.response_timeout,
        };
        write_frame(&mut stream, payload)?;
        let reply = read_frame(&mut stream, target.max_frame_len)?;
        correlate(&reply, tag)
    }
}

/// A stream whose reads and writes fail with `TimedOut` once `deadline`
/// passes.
struct DeadlineStream<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl DeadlineStream<'_> {
    fn remaining(&self) -> io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "response deadline passed"));
        }
        Ok(remaining)
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.read(buf)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.set_write_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stream = self.stream;
        stream.flush()
    }
}

/// Idle sessions keyed by peer address.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    idle: Mutex<HashMap<SocketAddr, Vec<TcpStream>>>,
}

impl ConnectionPool {
    /// Take an idle session to any of `addrs`, in order.
    pub fn take(&self, addrs: &[SocketAddr]) -> Option<Session> {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        addrs.iter().find_map(|addr| {
            idle.get_mut(addr)
                .and_then(Vec::pop)
                .map(|stream| Session { stream, peer: *addr })
        })
    }

    /// Return a session after a complete exchange.
    pub fn put(&self, session: Session) {
        let mut idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        let streams = idle.entry(session.peer).or_default();
        if streams.len() < MAX_IDLE_PER_PEER {
            streams.push(session.stream);
        }
    }

    /// Number of idle sessions to `addr`.
    pub fn idle_count(&self, addr: &SocketAddr) -> usize {
        let idle = self.idle.lock().unwrap_or_else(|e| e.into_inner());
        idle.get(addr).map_or(0, Vec::len)
    }
}

/// Delegates a fixed computation to the peer named by `tcp:addr`.
#[derive(Debug)]
pub struct RemoteSocketExecution {
    computation: Computation,
    config: DelegationConfig,
    tags: TagSource,
    pool: Option<ConnectionPool>,
}

impl RemoteSocketExecution {
    pub fn new(computation: Computation) -> Self {
        Self {
            computation,
            config: DelegationConfig::default(),
            tags: TagSource::new(),
            pool: None,
        }
    }

    pub fn with_config(mut self, config: DelegationConfig) -> Self {
        self.config = config;
        self
    }

    /// Keep connections open between calls.
    pub fn pooled(mut self) -> Self {
        self.pool = Some(ConnectionPool::default());
        self
    }

    pub fn pool(&self) -> Option<&ConnectionPool> {
        self.pool.as_ref()
    }

    fn exchange(
        &self,
        target: &SocketTarget,
        tag: u64,
        payload: &[u8],
    ) -> ExecResult<DelegationResponse> {
        let reused = self.pool.as_ref().and_then(|p| p.take(&target.addrs));
        let mut session = match reused {
            Some(session) => {
                debug!(peer = %session.peer(), "reusing pooled connection");
                session
            }
            None => Session::connect(target)?,
        };

        let response = session.round_trip(target, tag, payload)?;
        if let Some(pool) = &self.pool {
            pool.put(session);
        }
        Ok(response)
    }
}

impl Execution for RemoteSocketExecution {
    #[tracing::instrument(
        skip_all,
        fields(selector = self.computation.selector(), tag = tracing::field::Empty)
    )]
    fn execute(&self, store: &mut dyn KvStore, step: &Step) -> ExecResult<ExecutionResult> {
        let target = SocketTarget::from_transaction(&step.current, &self.config)?;
        let tag = self.tags.next();
        tracing::Span::current().record("tag", tag);

        let request = build_request(self.computation, tag, store)?;
        let payload = encode_request(&request);

        let response = self.exchange(&target, tag, &payload).inspect_err(|e| {
            warn!(addr = %target.addrs[0], error = %e, "delegation failed");
        })?;
        debug!(addr = %target.addrs[0], "response received");

        let effect = response.into_result()?;
        commit(store, effect)
    }
}
