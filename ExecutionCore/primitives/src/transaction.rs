//! Transactions and execution steps.
//!
//! A `Transaction` is an immutable bag of named byte-string arguments. Which
//! arguments it carries decides which backend can run it: `contractName` for
//! the interpreted backend, `tcp:addr` for the socket backend, `fs:root` for
//! the filesystem backend. Backends parse the bag once, at their boundary,
//! into their own validated argument structs.

use std::collections::BTreeMap;

/// Immutable named-argument bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    args: BTreeMap<String, Vec<u8>>,
}

impl Transaction {
    /// Create a transaction with no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, consuming the builder.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Get an argument by name.
    pub fn arg(&self, name: &str) -> Option<&[u8]> {
        self.args.get(name).map(Vec::as_slice)
    }

    /// Iterate arguments in name order.
    pub fn args(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.args.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// One unit of work: the current transaction plus the earlier transactions
/// of the same batch. Backends only look at `current`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub previous: Vec<Transaction>,
    pub current: Transaction,
}

impl Step {
    /// A step with no prior transactions.
    pub fn new(current: Transaction) -> Self {
        Self {
            previous: Vec::new(),
            current,
        }
    }
}
