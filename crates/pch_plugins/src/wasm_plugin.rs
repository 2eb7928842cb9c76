use crate::converter::{Converter, ConverterBackend, ensure_input};
use crate::error::{PluginError, Result};
use crate::factory::{ConverterFactory, ConverterFamily};
use crate::registry::converter_name_from_stem;
use crate::sandbox::SandboxConfig;
use crate::shim::ShimResolver;
use async_trait::async_trait;
use pch_domain::{
    CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use wasmtime::*;

const MAX_RESULT_BYTES: usize = 10 * 1024 * 1024;

/// A text-to-text converter compiled to WebAssembly.
///
/// The module must export `memory`, `alloc(size: i32) -> i32` and
/// `convert(ptr: i32, len: i32) -> i32`. The returned pointer addresses a
/// little-endian `u32` length followed by that many UTF-8 bytes.
pub struct WasmModule {
    inner: Arc<WasmInner>,
}

struct WasmInner {
    name: String,
    engine: Engine,
    module: Module,
    config: SandboxConfig,
}

impl WasmModule {
    pub fn from_file<P: AsRef<Path>>(path: P, config: SandboxConfig) -> Result<Self> {
        let path = path.as_ref();
        let wasm_bytes = std::fs::read(path).map_err(|e| {
            PluginError::LoadFailed(format!("Failed to read WASM file {}: {}", path.display(), e))
        })?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        Self::from_bytes(&converter_name_from_stem(stem), &wasm_bytes, config)
    }

    pub fn from_bytes(name: &str, wasm_bytes: &[u8], config: SandboxConfig) -> Result<Self> {
        let mut engine_config = Config::new();
        engine_config.consume_fuel(true);
        engine_config.wasm_bulk_memory(true);

        let engine = Engine::new(&engine_config)?;
        let module = Module::from_binary(&engine, wasm_bytes)?;
        check_exports(name, &module)?;

        debug!("Loaded WASM converter: {}", name);

        Ok(Self {
            inner: Arc::new(WasmInner {
                name: name.to_string(),
                engine,
                module,
                config,
            }),
        })
    }
}

fn check_exports(name: &str, module: &Module) -> Result<()> {
    let has = |export: &str, want_func: bool| {
        module.exports().any(|e| {
            e.name() == export
                && if want_func {
                    matches!(e.ty(), ExternType::Func(_))
                } else {
                    matches!(e.ty(), ExternType::Memory(_))
                }
        })
    };

    for (export, is_func) in [("memory", false), ("alloc", true), ("convert", true)] {
        if !has(export, is_func) {
            return Err(PluginError::LoadFailed(format!(
                "{}: WASM module must export '{}'",
                name, export
            )));
        }
    }
    Ok(())
}

impl ConverterFactory for WasmModule {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn family(&self) -> ConverterFamily {
        ConverterFamily::Legacy
    }

    fn construct(
        &self,
        args: &ConstructArgs,
        _shim: &dyn ShimResolver,
    ) -> std::result::Result<Box<dyn Converter>, ConstructError> {
        if !args.is_empty() {
            return Err(ConstructError::ShapeMismatch(format!(
                "{}() takes no arguments",
                self.inner.name
            )));
        }
        Ok(Box::new(WasmConverter {
            inner: Arc::clone(&self.inner),
        }))
    }
}

/// A constructed WASM converter. Each call gets a fresh store and instance.
pub struct WasmConverter {
    inner: Arc<WasmInner>,
}

impl WasmInner {
    fn execute_convert(&self, input: &str) -> Result<String> {
        let mut store = Store::new(&self.engine, ());
        store.set_fuel(self.config.wasm_fuel).map_err(|e| {
            PluginError::ExecutionFailed(format!("Failed to set fuel limit: {}", e))
        })?;

        let linker = Linker::new(&self.engine);
        let instance = linker.instantiate(&mut store, &self.module)?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| PluginError::LoadFailed("WASM module must export 'memory'".to_string()))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .map_err(|e| PluginError::LoadFailed(format!("alloc(size: i32) -> i32: {}", e)))?;
        let convert = instance
            .get_typed_func::<(i32, i32), i32>(&mut store, "convert")
            .map_err(|e| {
                PluginError::LoadFailed(format!("convert(ptr: i32, len: i32) -> i32: {}", e))
            })?;

        let input_bytes = input.as_bytes();
        let input_len = i32::try_from(input_bytes.len())
            .map_err(|_| PluginError::ExecutionFailed("input too large".into()))?;
        let input_ptr = alloc.call(&mut store, input_len)?;

        memory
            .write(&mut store, input_ptr as usize, input_bytes)
            .map_err(|e| PluginError::ExecutionFailed(format!("Memory write failed: {}", e)))?;

        let result_ptr = convert.call(&mut store, (input_ptr, input_len))? as usize;

        let mut len_bytes = [0u8; 4];
        memory
            .read(&store, result_ptr, &mut len_bytes)
            .map_err(|e| PluginError::ExecutionFailed(format!("Memory read failed: {}", e)))?;
        let result_len = u32::from_le_bytes(len_bytes) as usize;

        if result_len > MAX_RESULT_BYTES {
            return Err(PluginError::ExecutionFailed("result too large".into()));
        }

        let mut result_bytes = vec![0u8; result_len];
        memory
            .read(&store, result_ptr + 4, &mut result_bytes)
            .map_err(|e| PluginError::ExecutionFailed(format!("Memory read failed: {}", e)))?;

        if let Ok(remaining) = store.get_fuel() {
            debug!(
                "WASM converter '{}' consumed {} fuel",
                self.name,
                self.config.wasm_fuel.saturating_sub(remaining)
            );
        }

        Ok(String::from_utf8(result_bytes)?)
    }
}

#[async_trait]
impl Converter for WasmConverter {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::text_to_text()
    }

    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> std::result::Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        let inner = Arc::clone(&self.inner);
        let prompt = prompt.to_string();
        let text = tokio::task::spawn_blocking(move || inner.execute_convert(&prompt))
            .await
            .map_err(|e| ConvertError::Panicked(e.to_string()))??;
        Ok(ConverterResult::text(text))
    }

    fn convert(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> std::result::Result<ConverterResult, ConvertError> {
        ensure_input(&self.capabilities(), input_kind)?;
        Ok(ConverterResult::text(self.inner.execute_convert(prompt)?))
    }

    fn backend(&self) -> ConverterBackend {
        ConverterBackend::Wasm
    }
}
