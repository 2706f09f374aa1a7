//! WASM module validation: contract ABI checks.
//!
//! Validates that a compiled WASM module meets the contract ABI before it can
//! be registered with the interpreter. Checks:
//!
//! 1. `memory` and `run: () -> i32` exported
//! 2. All imports are known `dexec_host` functions with matching signatures
//! 3. No WASI imports

use wasmtime::{ExternType, FuncType, Module, ValType};

use crate::error::SandboxError;
use crate::linker::{HOST_FUNCTIONS, HOST_MODULE};

/// Check if a ValType is i32.
fn is_i32(vt: &ValType) -> bool {
    matches!(vt, ValType::I32)
}

/// Expected export: (name, param_count_of_i32, result_count_of_i32).
const REQUIRED_EXPORTS: &[(&str, usize, usize)] = &[("run", 0, 1)];

/// Validate that a WASM module meets the contract ABI.
pub fn validate_module(module: &Module) -> Result<(), SandboxError> {
    validate_exports(module)?;
    validate_imports(module)?;
    Ok(())
}

fn check_signature(
    what: &str,
    func_ty: &FuncType,
    expected_params: usize,
    expected_results: usize,
) -> Result<(), SandboxError> {
    let params: Vec<ValType> = func_ty.params().collect();
    let results: Vec<ValType> = func_ty.results().collect();

    if params.len() != expected_params || !params.iter().all(is_i32) {
        return Err(SandboxError::ValidationError(format!(
            "{} has wrong param signature: expected {} i32 params, got {} params",
            what,
            expected_params,
            params.len()
        )));
    }
    if results.len() != expected_results || !results.iter().all(is_i32) {
        return Err(SandboxError::ValidationError(format!(
            "{} has wrong result signature: expected {} i32 results, got {} results",
            what,
            expected_results,
            results.len()
        )));
    }
    Ok(())
}

/// Check that all required exports are present with correct signatures.
fn validate_exports(module: &Module) -> Result<(), SandboxError> {
    let has_memory = module
        .exports()
        .any(|e| e.name() == "memory" && matches!(e.ty(), ExternType::Memory(_)));
    if !has_memory {
        return Err(SandboxError::ValidationError(
            "module must export 'memory'".into(),
        ));
    }

    for &(name, expected_params, expected_results) in REQUIRED_EXPORTS {
        let export = module
            .exports()
            .find(|e| e.name() == name)
            .ok_or_else(|| {
                SandboxError::ValidationError(format!("missing required export: {}", name))
            })?;

        let ExternType::Func(func_ty) = export.ty() else {
            return Err(SandboxError::ValidationError(format!(
                "export '{}' must be a function",
                name
            )));
        };
        check_signature(&format!("export '{}'", name), &func_ty, expected_params, expected_results)?;
    }

    Ok(())
}

/// Check that every import is a known `dexec_host` function.
fn validate_imports(module: &Module) -> Result<(), SandboxError> {
    for import in module.imports() {
        let module_name = import.module();

        if module_name.starts_with("wasi") {
            return Err(SandboxError::ValidationError(format!(
                "WASI import not allowed: {}::{}",
                module_name,
                import.name()
            )));
        }

        if module_name != HOST_MODULE {
            return Err(SandboxError::ValidationError(format!(
                "import from unknown module '{}' (only '{}' allowed): {}",
                module_name,
                HOST_MODULE,
                import.name()
            )));
        }

        let ExternType::Func(func_ty) = import.ty() else {
            return Err(SandboxError::ValidationError(format!(
                "non-function import not allowed: {}::{}",
                module_name,
                import.name()
            )));
        };

        let &(_, params, results) = HOST_FUNCTIONS
            .iter()
            .find(|(name, _, _)| *name == import.name())
            .ok_or_else(|| {
                SandboxError::ValidationError(format!(
                    "unknown host function: {}::{}",
                    module_name,
                    import.name()
                ))
            })?;
        check_signature(&format!("import '{}'", import.name()), &func_ty, params, results)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmtime::Engine;

    fn check(wat: &str) -> Result<(), SandboxError> {
        let engine = Engine::default();
        let module = Module::new(&engine, wat).unwrap();
        validate_module(&module)
    }

    #[test]
    fn test_validate_minimal_valid_module() {
        check(
            r#"
            (module
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap();
    }

    #[test]
    fn test_reject_missing_run() {
        let err = check(
            r#"
            (module
                (memory (export "memory") 1)
                (func (export "start") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_reject_wrong_run_signature() {
        let err = check(
            r#"
            (module
                (memory (export "memory") 1)
                (func (export "run") (param i32) (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_reject_missing_memory() {
        let err = check(
            r#"
            (module
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_reject_wasi_import() {
        let err = check(
            r#"
            (module
                (import "wasi_snapshot_preview1" "fd_write"
                    (func (param i32 i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_accept_host_import() {
        check(
            r#"
            (module
                (import "dexec_host" "state_get"
                    (func (param i32 i32 i32 i32) (result i32)))
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap();
    }

    #[test]
    fn test_reject_unknown_host_function() {
        let err = check(
            r#"
            (module
                (import "dexec_host" "state_delete" (func (param i32 i32) (result i32)))
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_reject_mismatched_host_signature() {
        let err = check(
            r#"
            (module
                (import "dexec_host" "set_output" (func (param i32) (result i32)))
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }

    #[test]
    fn test_reject_unknown_module_import() {
        let err = check(
            r#"
            (module
                (import "env" "some_func" (func (result i32)))
                (memory (export "memory") 1)
                (func (export "run") (result i32) i32.const 0)
            )
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::ValidationError(_)));
    }
}
