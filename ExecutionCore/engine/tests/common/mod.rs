//! Shared test helpers for engine integration tests.
//!
//! Provides store builders, transaction builders for each backend, running
//! peers, and scripted fake peers for protocol failure tests.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use dexec_peer::{FsPeer, PeerConfig, TcpPeer};
use dexec_primitives::codec::decode_request;
use dexec_primitives::frame::{decode_frame, read_frame, write_frame};
use dexec_primitives::mailbox;
use dexec_primitives::types::{u64_from_le_bytes, u64_to_le_bytes};
use dexec_primitives::{
    DelegationRequest, KvStore, MemStore, Step, StoreError, Transaction, STORE_KEY,
};

// ── Stores ──

/// Store holding `value` as an LE u64 at `STORE_KEY`.
pub fn counter_store(value: u64) -> MemStore {
    let mut store = MemStore::new();
    store.insert(STORE_KEY.to_vec(), u64_to_le_bytes(value).to_vec());
    store
}

/// The LE u64 at `key`, panicking if absent or malformed.
pub fn read_u64(store: &dyn KvStore, key: &[u8]) -> u64 {
    let bytes = store.get(key).unwrap().expect("key present");
    u64_from_le_bytes(&bytes).expect("8-byte value")
}

/// Store that refuses every write after construction.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore {
    pub inner: MemStore,
}

impl KvStore for ReadOnlyStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }
    fn set(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError("store is read-only".into()))
    }
    fn delete(&mut self, _key: &[u8]) -> Result<(), StoreError> {
        Err(StoreError("store is read-only".into()))
    }
}

/// Store whose reads fail.
#[derive(Debug, Default)]
pub struct UnreadableStore;

impl KvStore for UnreadableStore {
    fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError("disk unplugged".into()))
    }
    fn set(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), StoreError> {
        Err(StoreError("disk unplugged".into()))
    }
    fn delete(&mut self, _key: &[u8]) -> Result<(), StoreError> {
        Err(StoreError("disk unplugged".into()))
    }
}

// ── Steps ──

pub fn contract_step(name: &str) -> Step {
    Step::new(Transaction::new().with_arg("contractName", name))
}

pub fn socket_step(addr: SocketAddr) -> Step {
    Step::new(Transaction::new().with_arg("tcp:addr", addr.to_string()))
}

/// Socket step with both timeouts overridden.
pub fn socket_step_with_timeouts(addr: SocketAddr, connect_ms: u64, response_ms: u64) -> Step {
    Step::new(
        Transaction::new()
            .with_arg("tcp:addr", addr.to_string())
            .with_arg("tcp:connect_timeout_ms", connect_ms.to_string())
            .with_arg("tcp:response_timeout_ms", response_ms.to_string()),
    )
}

pub fn fs_step(root: &Path) -> Step {
    Step::new(Transaction::new().with_arg("fs:root", root.to_string_lossy().into_owned()))
}

pub fn fs_step_with_timeout(root: &Path, timeout_ms: u64) -> Step {
    Step::new(
        Transaction::new()
            .with_arg("fs:root", root.to_string_lossy().into_owned())
            .with_arg("fs:timeout_ms", timeout_ms.to_string()),
    )
}

// ── Peers ──

/// Start a real TCP peer on an ephemeral port.
pub fn start_tcp_peer(config: PeerConfig) -> SocketAddr {
    let peer = TcpPeer::bind("127.0.0.1:0", config).unwrap();
    let addr = peer.local_addr().unwrap();
    peer.spawn();
    addr
}

/// Start a real filesystem peer on `root`.
pub fn start_fs_peer(root: &Path, config: PeerConfig) {
    FsPeer::new(root, config).unwrap().spawn();
}

/// An address nothing is listening on.
pub fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Accept one connection, read one request, and let `respond` write
/// whatever it wants back on the raw stream.
pub fn scripted_peer<F>(respond: F) -> SocketAddr
where
    F: FnOnce(&mut TcpStream, DelegationRequest) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let payload = read_frame(&mut stream, 1 << 20).unwrap();
        let request = decode_request(&payload).unwrap();
        respond(&mut stream, request);
    });
    addr
}

/// Scripted peer that replies with one frame holding `payload(request)`.
pub fn replying_peer<F>(payload: F) -> SocketAddr
where
    F: FnOnce(DelegationRequest) -> Vec<u8> + Send + 'static,
{
    scripted_peer(move |stream, request| {
        write_frame(stream, &payload(request)).unwrap();
    })
}

/// Accepts connections and never answers. Returns the address and a handle
/// that keeps the listener alive.
pub fn silent_peer() -> (SocketAddr, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    (addr, handle)
}

/// Wait for one request file under `root`, claim it, and write
/// `response(request)` verbatim as the response file. The bytes are not
/// framed for the caller.
pub fn scripted_fs_peer<F>(root: &Path, response: F) -> thread::JoinHandle<()>
where
    F: FnOnce(DelegationRequest) -> Vec<u8> + Send + 'static,
{
    mailbox::ensure_layout(root).unwrap();
    let root = root.to_path_buf();
    thread::spawn(move || {
        let (tag, path) = wait_for_request(&root);
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();
        let request = decode_request(decode_frame(&bytes, 1 << 20).unwrap()).unwrap();
        mailbox::write_atomic(&mailbox::response_path(&root, tag), &response(request)).unwrap();
    })
}

fn wait_for_request(root: &Path) -> (u64, PathBuf) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        let found = fs::read_dir(mailbox::requests_dir(root))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .find_map(|entry| {
                let tag = mailbox::parse_request_name(entry.file_name().to_str()?)?;
                Some((tag, entry.path()))
            });
        if let Some(found) = found {
            return found;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("no request appeared under {}", root.display());
}
