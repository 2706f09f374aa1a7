//! Contracts the interpreter can run.
//!
//! A contract is a WASM module (binary or WAT text) plus the keys it may
//! read. The built-in contracts compute the same thing as the shared
//! `Computation` kinds and are registered under the same names.

use dexec_primitives::Computation;

/// `increment`: LE u64 counter at `STORE_KEY` plus one.
///
/// Memory layout: key at 0, counter buffer at 64.
pub const INCREMENT_WAT: &str = r#"
(module
  (import "dexec_host" "state_get" (func $state_get (param i32 i32 i32 i32) (result i32)))
  (import "dexec_host" "state_set" (func $state_set (param i32 i32 i32 i32) (result i32)))
  (import "dexec_host" "set_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "\00\00\0a")
  (func (export "run") (result i32)
    (local $len i32)
    (local $counter i64)
    (local.set $len
      (call $state_get (i32.const 0) (i32.const 32) (i32.const 64) (i32.const 8)))
    (if (i32.lt_s (local.get $len) (i32.const 0))
      (then (return (i32.const 1))))
    (if (i32.eqz (local.get $len))
      (then (local.set $counter (i64.const 0)))
      (else
        (if (i32.ne (local.get $len) (i32.const 8))
          (then (return (i32.const 2))))
        (local.set $counter (i64.load (i32.const 64)))))
    ;; u64::MAX
    (if (i64.eq (local.get $counter) (i64.const -1))
      (then (return (i32.const 3))))
    (i64.store (i32.const 64) (i64.add (local.get $counter) (i64.const 1)))
    (if (call $state_set (i32.const 0) (i32.const 32) (i32.const 64) (i32.const 8))
      (then (return (i32.const 4))))
    (if (call $set_output (i32.const 64) (i32.const 8))
      (then (return (i32.const 5))))
    (i32.const 0))
)
"#;

/// `Ed25519`: scalar at `STORE_KEY` times the base point, stored at `RESULT_KEY`.
///
/// Memory layout: input key at 0, result key at 32, scalar at 64, point at 96.
pub const ED25519_WAT: &str = r#"
(module
  (import "dexec_host" "state_get" (func $state_get (param i32 i32 i32 i32) (result i32)))
  (import "dexec_host" "state_set" (func $state_set (param i32 i32 i32 i32) (result i32)))
  (import "dexec_host" "ec_mul_base" (func $ec_mul_base (param i32 i32) (result i32)))
  (import "dexec_host" "set_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "\00\00\0a")
  (data (i32.const 32) "\00\00\28")
  (func (export "run") (result i32)
    (if (i32.ne
          (call $state_get (i32.const 0) (i32.const 32) (i32.const 64) (i32.const 32))
          (i32.const 32))
      (then (return (i32.const 1))))
    (if (call $ec_mul_base (i32.const 64) (i32.const 96))
      (then (return (i32.const 2))))
    (if (call $state_set (i32.const 32) (i32.const 32) (i32.const 96) (i32.const 32))
      (then (return (i32.const 3))))
    (if (call $set_output (i32.const 96) (i32.const 32))
      (then (return (i32.const 4))))
    (i32.const 0))
)
"#;

/// A named program and its declared read set.
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    /// WASM binary or WAT text.
    pub code: Vec<u8>,
    pub read_set: Vec<Vec<u8>>,
}

impl Contract {
    pub fn new(name: impl Into<String>, code: impl Into<Vec<u8>>, read_set: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            read_set,
        }
    }

    /// The contract equivalent to `computation`.
    pub fn builtin(computation: Computation) -> Self {
        let wat = match computation {
            Computation::Increment => INCREMENT_WAT,
            Computation::Ed25519Mul => ED25519_WAT,
        };
        let read_set = computation.input_keys().iter().map(|k| k.to_vec()).collect();
        Self::new(computation.selector(), wat, read_set)
    }

    /// Every built-in contract.
    pub fn builtins() -> Vec<Self> {
        Computation::ALL.into_iter().map(Self::builtin).collect()
    }
}
