//! Shared test helpers for integration tests.
//!
//! Provides interpreter factories, store builders, and small WAT contracts
//! used across the integration test files.

#![allow(dead_code)]

use dexec_primitives::types::u64_to_le_bytes;
use dexec_primitives::{MemStore, STORE_KEY};
use dexec_sandbox::{Contract, SandboxConfig, WasmInterpreter};

// ── Interpreter Factories ──

/// Interpreter with the default config and the built-in contracts.
pub fn interpreter() -> WasmInterpreter {
    WasmInterpreter::new(SandboxConfig::default()).unwrap()
}

/// Interpreter with a custom config.
pub fn interpreter_with_config(config: SandboxConfig) -> WasmInterpreter {
    WasmInterpreter::new(config).unwrap()
}

/// Interpreter with one extra WAT contract registered.
pub fn interpreter_with(name: &str, wat: &str, read_set: Vec<Vec<u8>>) -> WasmInterpreter {
    let mut interp = interpreter();
    interp.register(Contract::new(name, wat, read_set)).unwrap();
    interp
}

// ── Store Helpers ──

/// Store holding `value` as an LE u64 at `STORE_KEY`.
pub fn counter_store(value: u64) -> MemStore {
    let mut store = MemStore::new();
    store.insert(STORE_KEY.to_vec(), u64_to_le_bytes(value).to_vec());
    store
}

/// Store holding raw bytes at `STORE_KEY`.
pub fn raw_store(value: &[u8]) -> MemStore {
    let mut store = MemStore::new();
    store.insert(STORE_KEY.to_vec(), value.to_vec());
    store
}

// ── Contracts ──

/// Loops forever without calling the host.
pub const SPIN_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "run") (result i32)
    (loop $spin (br $spin))
    (i32.const 0))
)
"#;

/// Writes `[0,0,20,..]` (the gas usage key).
pub const WRITE_GAS_KEY_WAT: &str = r#"
(module
  (import "dexec_host" "state_set" (func $state_set (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "\00\00\14")
  (func (export "run") (result i32)
    (drop (call $state_set (i32.const 0) (i32.const 32) (i32.const 64) (i32.const 8)))
    (i32.const 0))
)
"#;

/// Reads the first 3 bytes `"abc"` as a key.
pub const READ_ABC_WAT: &str = r#"
(module
  (import "dexec_host" "state_get" (func $state_get (param i32 i32 i32 i32) (result i32)))
  (import "dexec_host" "set_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "abc")
  (func (export "run") (result i32)
    (local $len i32)
    (local.set $len (call $state_get (i32.const 0) (i32.const 3) (i32.const 64) (i32.const 64)))
    (if (i32.lt_s (local.get $len) (i32.const 0))
      (then (return (i32.const 1))))
    (drop (call $set_output (i32.const 64) (local.get $len)))
    (i32.const 0))
)
"#;

/// Calls `state_get` with an out-of-bounds output pointer and returns its code.
pub const BAD_POINTER_WAT: &str = r#"
(module
  (import "dexec_host" "state_get" (func $state_get (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "run") (result i32)
    (i32.sub (i32.const 0)
      (call $state_get (i32.const 0) (i32.const 3) (i32.const 65530) (i32.const 64))))
)
"#;

/// Grows memory by 64 pages and fails if the grow was refused.
pub const GROW_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "run") (result i32)
    (if (i32.eq (memory.grow (i32.const 64)) (i32.const -1))
      (then (return (i32.const 9))))
    (i32.const 0))
)
"#;
