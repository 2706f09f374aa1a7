//! Computations every non-interpreted backend can run.
//!
//! The native backend runs these against the caller's store; the remote peer
//! runs them against a store seeded with the entries the caller shipped. Each
//! kind reads a fixed set of keys, which is exactly what a remote backend
//! sends over the wire.
//!
//! Selectors match the interpreted contract names, so `"increment"` means the
//! same thing to every backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::ec_mul_base;
use crate::error::{ExecError, ExecResult};
use crate::execution::Mutation;
use crate::store::KvStore;
use crate::types::{u64_from_le_bytes, u64_to_le_bytes, Key, RESULT_KEY, STORE_KEY};

/// A named operation with fixed inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Computation {
    /// Read an LE u64 counter at `STORE_KEY`, write back counter + 1.
    #[default]
    #[serde(rename = "increment")]
    Increment,
    /// Read a scalar at `STORE_KEY`, write `scalar·B` to `RESULT_KEY`.
    #[serde(rename = "Ed25519")]
    Ed25519Mul,
}

/// Output and mutations of one computation. Not yet applied anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effect {
    pub output: Vec<u8>,
    pub mutations: Vec<Mutation>,
}

const INPUT_KEYS: &[Key] = &[STORE_KEY];

impl Computation {
    /// Every computation kind, in selector order.
    pub const ALL: [Computation; 2] = [Computation::Increment, Computation::Ed25519Mul];

    /// Wire selector for this computation.
    pub fn selector(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Ed25519Mul => "Ed25519",
        }
    }

    /// Look up a computation by selector.
    pub fn from_selector(selector: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.selector() == selector)
    }

    /// Keys this computation reads.
    pub fn input_keys(self) -> &'static [Key] {
        INPUT_KEYS
    }

    /// Run against `store` without modifying it.
    ///
    /// Absent inputs read as empty. Malformed inputs fail with
    /// `InterpreterFault`; store failures with `StoreIo`.
    pub fn compute(self, store: &dyn KvStore) -> ExecResult<Effect> {
        let input = store.get(&STORE_KEY)?.unwrap_or_default();
        match self {
            Self::Increment => increment(&input),
            Self::Ed25519Mul => ed25519_mul(&input),
        }
    }
}

fn increment(input: &[u8]) -> ExecResult<Effect> {
    let counter = if input.is_empty() {
        0
    } else {
        u64_from_le_bytes(input).ok_or_else(|| {
            ExecError::InterpreterFault(format!(
                "counter must be 8 bytes, found {}",
                input.len()
            ))
        })?
    };
    let next = counter
        .checked_add(1)
        .ok_or_else(|| ExecError::InterpreterFault("counter overflow".into()))?;
    let bytes = u64_to_le_bytes(next).to_vec();
    Ok(Effect {
        output: bytes.clone(),
        mutations: vec![Mutation::Set {
            key: STORE_KEY.to_vec(),
            value: bytes,
        }],
    })
}

fn ed25519_mul(input: &[u8]) -> ExecResult<Effect> {
    let point = ec_mul_base(input).ok_or_else(|| {
        ExecError::InterpreterFault("stored value is not a canonical Ed25519 scalar".into())
    })?;
    Ok(Effect {
        output: point.to_vec(),
        mutations: vec![Mutation::Set {
            key: RESULT_KEY.to_vec(),
            value: point.to_vec(),
        }],
    })
}

impl fmt::Display for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for Computation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_selector(s).ok_or_else(|| format!("unknown computation: {}", s))
    }
}
