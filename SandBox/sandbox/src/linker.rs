//! Host function registration via Wasmtime linker.
//!
//! Registers the four `dexec_host` functions with the Wasmtime `Linker`.
//! Each function:
//! 1. Extracts memory and HostState from the Caller
//! 2. Validates pointer/length arguments against linear memory
//! 3. Charges gas via the run's `GasMeter`
//! 4. Performs the operation
//! 5. Returns a non-negative result, a negative `HostCallError` code, or
//!    traps if the error is fatal

use wasmtime::{Caller, Linker, Memory};

use dexec_primitives::crypto::ec_mul_base;
use dexec_primitives::gas::*;

use crate::error::{HostCallError, SandboxError};
use crate::host_impl::HostState;
use crate::memory;

/// Import module every contract links against.
pub const HOST_MODULE: &str = "dexec_host";

/// Every host function and its (param count, result count); all i32.
pub const HOST_FUNCTIONS: &[(&str, usize, usize)] = &[
    ("state_get", 4, 1),
    ("state_set", 4, 1),
    ("ec_mul_base", 2, 1),
    ("set_output", 2, 1),
];

/// Get the guest's exported memory from a Caller.
fn get_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    caller.get_export("memory").and_then(|e| e.into_memory())
}

/// Record a failed host call and either return its code or trap.
fn fail(caller: &mut Caller<'_, HostState>, err: HostCallError) -> wasmtime::Result<i32> {
    caller.data_mut().last_error = Some(err);
    if err.is_fatal() {
        return Err(wasmtime::Error::new(err));
    }
    Ok(err.code())
}

/// Register all `dexec_host` functions with the linker.
pub fn register_host_functions(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    register_state_get(linker)?;
    register_state_set(linker)?;
    register_ec_mul_base(linker)?;
    register_set_output(linker)?;
    Ok(())
}

// ── State Access ──

fn register_state_get(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "state_get",
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_len: i32,
         out_ptr: i32,
         out_cap: i32|
         -> wasmtime::Result<i32> {
            let Some(mem) = get_memory(&mut caller) else {
                return fail(&mut caller, HostCallError::BadPointer);
            };

            let key = match memory::read_bytes(mem.data(&caller), key_ptr, key_len) {
                Ok(k) => k,
                Err(e) => return fail(&mut caller, e),
            };
            if let Err(e) = memory::validate_range(mem.data_size(&caller), out_ptr, out_cap) {
                return fail(&mut caller, e);
            }

            if let Err(e) = caller.data_mut().charge(gas_cost_state_get(key.len())) {
                return fail(&mut caller, e);
            }

            let value = match caller.data().state_get(&key) {
                Ok(v) => v,
                Err(e) => return fail(&mut caller, e),
            };
            if value.len() > out_cap as usize {
                return fail(&mut caller, HostCallError::BufferTooSmall);
            }

            if let Err(e) = memory::write_bytes(mem.data_mut(&mut caller), out_ptr, &value) {
                return fail(&mut caller, e);
            }
            Ok(value.len() as i32)
        },
    )?;
    Ok(())
}

fn register_state_set(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "state_set",
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_len: i32,
         val_ptr: i32,
         val_len: i32|
         -> wasmtime::Result<i32> {
            let Some(mem) = get_memory(&mut caller) else {
                return fail(&mut caller, HostCallError::BadPointer);
            };

            let read = {
                let data = mem.data(&caller);
                memory::read_bytes(data, key_ptr, key_len)
                    .and_then(|k| memory::read_bytes(data, val_ptr, val_len).map(|v| (k, v)))
            };
            let (key, value) = match read {
                Ok(kv) => kv,
                Err(e) => return fail(&mut caller, e),
            };

            let cost = gas_cost_state_set(key.len(), value.len());
            if let Err(e) = caller.data_mut().charge(cost) {
                return fail(&mut caller, e);
            }

            if let Err(e) = caller.data_mut().state_set(&key, &value) {
                return fail(&mut caller, e);
            }
            Ok(0)
        },
    )?;
    Ok(())
}

// ── Curve Arithmetic ──

fn register_ec_mul_base(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "ec_mul_base",
        |mut caller: Caller<'_, HostState>,
         scalar_ptr: i32,
         out_ptr: i32|
         -> wasmtime::Result<i32> {
            let Some(mem) = get_memory(&mut caller) else {
                return fail(&mut caller, HostCallError::BadPointer);
            };

            let scalar = match memory::read_bytes(mem.data(&caller), scalar_ptr, 32) {
                Ok(s) => s,
                Err(e) => return fail(&mut caller, e),
            };
            if let Err(e) = memory::validate_range(mem.data_size(&caller), out_ptr, 32) {
                return fail(&mut caller, e);
            }

            if let Err(e) = caller.data_mut().charge(G_EC_MUL_BASE) {
                return fail(&mut caller, e);
            }

            let Some(point) = ec_mul_base(&scalar) else {
                return fail(&mut caller, HostCallError::InvalidScalar);
            };
            if let Err(e) = memory::write_bytes(mem.data_mut(&mut caller), out_ptr, &point) {
                return fail(&mut caller, e);
            }
            Ok(0)
        },
    )?;
    Ok(())
}

// ── Output ──

fn register_set_output(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "set_output",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<i32> {
            let Some(mem) = get_memory(&mut caller) else {
                return fail(&mut caller, HostCallError::BadPointer);
            };

            let data = match memory::read_bytes(mem.data(&caller), ptr, len) {
                Ok(d) => d,
                Err(e) => return fail(&mut caller, e),
            };

            if let Err(e) = caller.data_mut().charge(gas_cost_set_output(data.len())) {
                return fail(&mut caller, e);
            }

            if let Err(e) = caller.data_mut().set_output(data) {
                return fail(&mut caller, e);
            }
            Ok(0)
        },
    )?;
    Ok(())
}
