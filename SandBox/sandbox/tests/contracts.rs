//! Built-in contract tests.
//!
//! Run the `increment` and `Ed25519` contracts end to end through Wasmtime
//! and compare them against the shared computations.

mod common;

use dexec_primitives::crypto::{ec_mul_base, scalar_from_u64};
use dexec_primitives::types::u64_to_le_bytes;
use dexec_primitives::{
    Computation, ExecError, Interpreter, MemStore, Mutation, RESULT_KEY, STORE_KEY,
};
use dexec_sandbox::SandboxError;

use common::*;

// ── increment ──

#[test]
fn test_increment_from_1234() {
    let outcome = interpreter().run("increment", &counter_store(1234)).unwrap();

    assert_eq!(outcome.output, u64_to_le_bytes(1235).to_vec());
    assert_eq!(
        outcome.writes,
        vec![Mutation::Set {
            key: STORE_KEY.to_vec(),
            value: u64_to_le_bytes(1235).to_vec(),
        }]
    );
}

#[test]
fn test_increment_absent_counter() {
    let outcome = interpreter().run("increment", &MemStore::new()).unwrap();
    assert_eq!(outcome.output, u64_to_le_bytes(1).to_vec());
}

#[test]
fn test_increment_malformed_counter_faults() {
    let err = interpreter()
        .run_program("increment", &raw_store(&[1, 2, 3]))
        .unwrap_err();
    assert!(matches!(err, ExecError::InterpreterFault(_)));
}

#[test]
fn test_increment_oversized_counter_faults() {
    let err = interpreter().run("increment", &raw_store(&[0u8; 16])).unwrap_err();
    assert!(matches!(err, SandboxError::ExitStatus { status: 1, .. }));
}

#[test]
fn test_increment_overflow_faults() {
    let err = interpreter()
        .run_program("increment", &counter_store(u64::MAX))
        .unwrap_err();
    assert!(matches!(err, ExecError::InterpreterFault(_)));
}

#[test]
fn test_increment_matches_native_computation() {
    let store = counter_store(77);
    let outcome = interpreter().run("increment", &store).unwrap();
    let effect = Computation::Increment.compute(&store).unwrap();

    assert_eq!(outcome.output, effect.output);
    assert_eq!(outcome.writes, effect.mutations);
}

// ── Ed25519 ──

#[test]
fn test_ed25519_writes_result_point() {
    let scalar = scalar_from_u64(12345);
    let outcome = interpreter().run("Ed25519", &raw_store(&scalar)).unwrap();

    let expected = ec_mul_base(&scalar).unwrap().to_vec();
    assert_eq!(outcome.output, expected);
    assert_eq!(
        outcome.writes,
        vec![Mutation::Set {
            key: RESULT_KEY.to_vec(),
            value: expected,
        }]
    );
}

#[test]
fn test_ed25519_matches_native_computation() {
    let store = raw_store(&scalar_from_u64(3));
    let outcome = interpreter().run("Ed25519", &store).unwrap();
    let effect = Computation::Ed25519Mul.compute(&store).unwrap();

    assert_eq!(outcome.output, effect.output);
    assert_eq!(outcome.writes, effect.mutations);
}

#[test]
fn test_ed25519_missing_scalar_faults() {
    let err = interpreter()
        .run_program("Ed25519", &MemStore::new())
        .unwrap_err();
    assert!(matches!(err, ExecError::InterpreterFault(_)));
}

#[test]
fn test_ed25519_non_canonical_scalar_faults() {
    let err = interpreter().run("Ed25519", &raw_store(&[0xff; 32])).unwrap_err();
    assert!(matches!(
        err,
        SandboxError::ExitStatus {
            status: 2,
            last_error: Some(dexec_sandbox::HostCallError::InvalidScalar)
        }
    ));
}

// ── Unknown names ──

#[test]
fn test_unknown_contract_maps_to_unknown_contract() {
    let err = interpreter()
        .run_program("decrement", &MemStore::new())
        .unwrap_err();
    assert_eq!(err, ExecError::UnknownContract("decrement".into()));
}
