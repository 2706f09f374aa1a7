//! Gas accounting for interpreted execution.
//!
//! Gas is charged for host calls (state reads and writes, curve arithmetic,
//! output) on top of the interpreter's instruction fuel. Charges are pure
//! integer arithmetic so the same program over the same inputs always costs
//! the same.

use crate::error::ExecError;

/// Base cost for `state_get`.
pub const G_STATE_GET: u64 = 200;

/// Base cost for `state_set`.
pub const G_STATE_SET: u64 = 500;

/// Per-byte cost added to state and output operations.
pub const G_PER_BYTE: u64 = 3;

/// Base cost for `ec_mul_base`.
pub const G_EC_MUL_BASE: u64 = 3000;

/// Base cost for `set_output`.
pub const G_SET_OUTPUT: u64 = 20;

/// Compute the gas cost for a state_get operation.
pub fn gas_cost_state_get(key_len: usize) -> u64 {
    G_STATE_GET.saturating_add((key_len as u64).saturating_mul(G_PER_BYTE))
}

/// Compute the gas cost for a state_set operation.
pub fn gas_cost_state_set(key_len: usize, val_len: usize) -> u64 {
    let byte_cost = (key_len.saturating_add(val_len) as u64).saturating_mul(G_PER_BYTE);
    G_STATE_SET.saturating_add(byte_cost)
}

/// Compute the gas cost for a set_output operation.
pub fn gas_cost_set_output(len: usize) -> u64 {
    G_SET_OUTPUT.saturating_add((len as u64).saturating_mul(G_PER_BYTE))
}

/// The meter refused a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("out of gas: limit={limit}, used={used}")]
pub struct OutOfGas {
    pub limit: u64,
    pub used: u64,
}

impl From<OutOfGas> for ExecError {
    fn from(err: OutOfGas) -> Self {
        Self::InterpreterFault(err.to_string())
    }
}

/// Tracks gas consumption during one program run.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    /// Create a new gas meter with the given limit.
    pub fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Create an unlimited gas meter (for testing only).
    pub fn unlimited() -> Self {
        Self {
            limit: u64::MAX,
            consumed: 0,
        }
    }

    /// Consume gas. Returns `OutOfGas` if the limit would be exceeded.
    ///
    /// Gas consumption is checked before applying, so on error the consumed
    /// count remains unchanged.
    pub fn consume(&mut self, amount: u64) -> Result<(), OutOfGas> {
        let new_consumed = match self.consumed.checked_add(amount) {
            Some(v) if v <= self.limit => v,
            _ => {
                return Err(OutOfGas {
                    limit: self.limit,
                    used: self.consumed.saturating_add(amount),
                });
            }
        };
        self.consumed = new_consumed;
        Ok(())
    }

    /// Returns the total gas consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Returns the remaining gas before the limit is reached.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    /// Returns the gas limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns true if all gas has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.limit
    }
}
