//! Per-run mutable state held in the Wasmtime Store.
//!
//! `HostState` combines the gas meter, the write overlay, a snapshot of the
//! contract's read set, and the output buffer into a single struct that lives
//! inside `Store<HostState>` for the duration of one contract run.
//!
//! The caller's store is read once, before instantiation, for exactly the
//! keys the contract declared. The guest never sees anything else.

use std::collections::BTreeMap;

use dexec_primitives::gas::GasMeter;
use dexec_primitives::types::{is_metering_key, MAX_KEY_LEN, MAX_VALUE_LEN};
use dexec_primitives::{OverlayResult, StateOverlay};
use wasmtime::{StoreLimits, StoreLimitsBuilder};

use crate::error::HostCallError;

/// Per-run mutable state held in the Wasmtime `Store`.
///
/// Created fresh for each `run_program` call and dropped with the instance.
pub struct HostState {
    /// Host-side gas meter.
    pub gas_meter: GasMeter,
    /// Writes performed by the contract, not yet applied anywhere.
    pub overlay: StateOverlay,
    /// Values of the declared read set at the start of the run.
    pub read_set: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// Last value passed to `set_output`.
    pub output: Vec<u8>,
    /// Most recent host call failure, reported if the contract then fails.
    pub last_error: Option<HostCallError>,
    /// Memory growth limits for the instance.
    pub limits: StoreLimits,
}

impl HostState {
    /// Create host state for one run.
    pub fn new(
        read_set: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
        gas_limit: u64,
        max_memory_bytes: usize,
    ) -> Self {
        Self {
            gas_meter: GasMeter::new(gas_limit),
            overlay: StateOverlay::new(),
            read_set,
            output: Vec::new(),
            last_error: None,
            limits: StoreLimitsBuilder::new()
                .memory_size(max_memory_bytes)
                .instances(1)
                .build(),
        }
    }

    /// Charge host gas.
    pub fn charge(&mut self, amount: u64) -> Result<(), HostCallError> {
        self.gas_meter
            .consume(amount)
            .map_err(|_| HostCallError::OutOfGas)
    }

    /// Read a value: the contract's own writes first, then the read set.
    ///
    /// Absent keys read as empty.
    pub fn state_get(&self, key: &[u8]) -> Result<Vec<u8>, HostCallError> {
        match self.overlay.get(key) {
            OverlayResult::Found(v) => Ok(v),
            OverlayResult::Deleted => Ok(Vec::new()),
            OverlayResult::NotInOverlay => match self.read_set.get(key) {
                Some(value) => Ok(value.clone().unwrap_or_default()),
                None => Err(HostCallError::UndeclaredKey),
            },
        }
    }

    /// Buffer a write. Metering keys are reserved for the host.
    pub fn state_set(&mut self, key: &[u8], value: &[u8]) -> Result<(), HostCallError> {
        if is_metering_key(key) {
            return Err(HostCallError::MeteringKey);
        }
        if key.is_empty() || key.len() > MAX_KEY_LEN || value.len() > MAX_VALUE_LEN {
            return Err(HostCallError::TooLarge);
        }
        self.overlay.set(key.to_vec(), value.to_vec());
        Ok(())
    }

    /// Replace the run's output.
    pub fn set_output(&mut self, data: Vec<u8>) -> Result<(), HostCallError> {
        if data.len() > MAX_VALUE_LEN {
            return Err(HostCallError::TooLarge);
        }
        self.output = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexec_primitives::types::{GAS_USAGE_KEY, RUN_COUNT_KEY, STORE_KEY};

    fn host_with(entries: &[(&[u8], Option<&[u8]>)]) -> HostState {
        let read_set = entries
            .iter()
            .map(|(k, v)| (k.to_vec(), v.map(|v| v.to_vec())))
            .collect();
        HostState::new(read_set, 10_000, 65536)
    }

    #[test]
    fn test_state_get_from_read_set() {
        let state = host_with(&[(b"key1", Some(b"committed"))]);
        assert_eq!(state.state_get(b"key1").unwrap(), b"committed".to_vec());
    }

    #[test]
    fn test_absent_declared_key_reads_empty() {
        let state = host_with(&[(&STORE_KEY, None)]);
        assert_eq!(state.state_get(&STORE_KEY).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_undeclared_key_is_rejected() {
        let state = host_with(&[(b"key1", Some(b"v"))]);
        assert_eq!(state.state_get(b"key2"), Err(HostCallError::UndeclaredKey));
    }

    #[test]
    fn test_own_writes_are_visible() {
        let mut state = host_with(&[(b"key1", Some(b"old"))]);
        state.state_set(b"key1", b"new").unwrap();
        state.state_set(b"fresh", b"x").unwrap();
        assert_eq!(state.state_get(b"key1").unwrap(), b"new".to_vec());
        // written keys become readable even if undeclared
        assert_eq!(state.state_get(b"fresh").unwrap(), b"x".to_vec());
    }

    #[test]
    fn test_metering_keys_are_reserved() {
        let mut state = host_with(&[]);
        assert_eq!(state.state_set(&GAS_USAGE_KEY, b"0"), Err(HostCallError::MeteringKey));
        assert_eq!(state.state_set(&RUN_COUNT_KEY, b"0"), Err(HostCallError::MeteringKey));
        assert!(state.overlay.is_empty());
    }

    #[test]
    fn test_state_set_size_limits() {
        let mut state = host_with(&[]);
        assert_eq!(state.state_set(&[0u8; 257], b"v"), Err(HostCallError::TooLarge));
        assert_eq!(state.state_set(b"", b"v"), Err(HostCallError::TooLarge));
        assert_eq!(
            state.state_set(b"key", &vec![0u8; MAX_VALUE_LEN + 1]),
            Err(HostCallError::TooLarge)
        );
    }

    #[test]
    fn test_charge_until_exhausted() {
        let mut state = host_with(&[]);
        state.charge(9_000).unwrap();
        assert_eq!(state.charge(2_000), Err(HostCallError::OutOfGas));
    }
}
