//! Sandbox runtime: Wasmtime engine, contract registry, and program runs.
//!
//! `WasmInterpreter` is the main entry point. It compiles and validates
//! contracts once, then runs each `run_program` call in a fresh Wasmtime
//! instance so no state leaks between runs.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;
use wasmtime::{Config, Engine, Linker, Module, Store, Trap};

use dexec_primitives::{ExecResult, Interpreter, KvStore, ProgramOutcome};

use crate::config::SandboxConfig;
use crate::contracts::Contract;
use crate::error::{HostCallError, SandboxError};
use crate::host_impl::HostState;
use crate::linker::register_host_functions;
use crate::validation::validate_module;

struct LoadedContract {
    module: Module,
    read_set: Vec<Vec<u8>>,
}

/// The deterministic WASM interpreter.
pub struct WasmInterpreter {
    engine: Engine,
    contracts: HashMap<String, LoadedContract>,
    config: SandboxConfig,
}

impl WasmInterpreter {
    /// Create an interpreter with the built-in contracts registered.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        let mut interpreter = Self {
            engine: create_engine(&config)?,
            contracts: HashMap::new(),
            config,
        };
        for contract in Contract::builtins() {
            interpreter.register(contract)?;
        }
        Ok(interpreter)
    }

    /// Compile, validate, and register a contract, replacing any contract
    /// of the same name.
    pub fn register(&mut self, contract: Contract) -> Result<(), SandboxError> {
        let module = Module::new(&self.engine, &contract.code)?;
        validate_module(&module)?;
        self.contracts.insert(
            contract.name,
            LoadedContract {
                module,
                read_set: contract.read_set,
            },
        );
        Ok(())
    }

    /// Returns true if a contract is registered under `name`.
    pub fn has_contract(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run a contract to completion.
    ///
    /// Reads the contract's read set from `store`, instantiates the module,
    /// calls `run`, and returns the buffered writes. `store` is never written.
    pub fn run(&self, name: &str, store: &dyn KvStore) -> Result<ProgramOutcome, SandboxError> {
        let contract = self
            .contracts
            .get(name)
            .ok_or_else(|| SandboxError::UnknownContract(name.to_string()))?;

        // 1. Snapshot the declared read set
        let mut read_set = BTreeMap::new();
        for key in &contract.read_set {
            read_set.insert(key.clone(), store.get(key)?);
        }

        // 2. Create store with fuel and memory limits
        let host_state = HostState::new(
            read_set,
            self.config.gas_limit,
            self.config.max_memory_bytes(),
        );
        let mut wasm_store = Store::new(&self.engine, host_state);
        wasm_store.limiter(|state| &mut state.limits);
        wasm_store.set_fuel(self.config.fuel_limit)?;

        // 3. Link and instantiate
        let mut linker = Linker::new(&self.engine);
        register_host_functions(&mut linker)?;
        let instance = linker.instantiate(&mut wasm_store, &contract.module)?;

        // 4. Call run
        let run_fn = instance.get_typed_func::<(), i32>(&mut wasm_store, "run")?;
        let status = handle_trap(run_fn.call(&mut wasm_store, ()))?;
        if status != 0 {
            return Err(SandboxError::ExitStatus {
                status,
                last_error: wasm_store.data().last_error,
            });
        }

        // 5. Gas = instructions + host calls
        let fuel_used = self
            .config
            .fuel_limit
            .saturating_sub(wasm_store.get_fuel()?);
        let host = wasm_store.into_data();
        let gas_used = fuel_used.saturating_add(host.gas_meter.consumed());

        debug!(
            contract = name,
            fuel_used,
            host_gas = host.gas_meter.consumed(),
            writes = host.overlay.len(),
            "contract finished"
        );

        Ok(ProgramOutcome {
            output: host.output,
            gas_used,
            writes: host.overlay.into_mutations(),
        })
    }
}

impl Interpreter for WasmInterpreter {
    fn run_program(&self, name: &str, store: &dyn KvStore) -> ExecResult<ProgramOutcome> {
        self.run(name, store).map_err(|err| {
            debug!(contract = name, error = %err, "contract failed");
            err.into()
        })
    }
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine(config: &SandboxConfig) -> Result<Engine, SandboxError> {
    let mut wasm_config = Config::new();

    // Fuel metering bounds every run
    wasm_config.consume_fuel(true);

    // Determinism enforcement
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.cranelift_nan_canonicalization(true);

    wasm_config.memory_guaranteed_dense_image_size(config.max_memory_bytes() as u64);

    Ok(Engine::new(&wasm_config)?)
}

/// Convert a guest call result into `SandboxError`.
///
/// Fuel exhaustion → `SandboxError::FuelExhausted`
/// Fatal host call → `SandboxError::HostAborted`
/// Other traps → `SandboxError::GuestTrapped`
fn handle_trap<R>(result: Result<R, anyhow::Error>) -> Result<R, SandboxError> {
    result.map_err(|e| {
        if let Some(host_err) = e.downcast_ref::<HostCallError>() {
            return SandboxError::HostAborted(*host_err);
        }
        match e.downcast_ref::<Trap>() {
            Some(Trap::OutOfFuel) => SandboxError::FuelExhausted,
            _ => SandboxError::GuestTrapped(format!("{:#}", e)),
        }
    })
}
