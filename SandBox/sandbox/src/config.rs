//! Sandbox configuration.

/// Configuration for the WASM sandbox.
///
/// Controls memory limits, instruction fuel, and host-call gas.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum linear memory pages (1 page = 64 KiB).
    /// Default: 16 pages = 1 MiB.
    pub max_memory_pages: u32,

    /// Wasmtime fuel limit (instruction metering).
    /// Prevents infinite loops in pure guest compute.
    pub fuel_limit: u64,

    /// Gas available to host calls in one run.
    pub gas_limit: u64,
}

impl SandboxConfig {
    /// Largest linear memory a contract may grow to, in bytes.
    pub fn max_memory_bytes(&self) -> usize {
        self.max_memory_pages as usize * 65536
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: 16,        // 1 MiB
            fuel_limit: 10_000_000,
            gas_limit: 1_000_000,
        }
    }
}
