use async_trait::async_trait;
use pch_domain::{CapabilitySet, ConvertError, ConverterResult, DataKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterBackend {
    Lua,
    Wasm,
    Native,
}

/// Core trait that all converters implement.
///
/// `convert_async` is the entry point the harness uses. The synchronous
/// `convert` is optional.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Converter name, e.g. `Base64Converter`.
    fn name(&self) -> &str;

    /// Declared input and output kinds.
    fn capabilities(&self) -> CapabilitySet;

    /// Convert `prompt` of kind `input_kind`.
    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> Result<ConverterResult, ConvertError>;

    /// Synchronous counterpart, when the converter has one.
    fn convert(&self, _prompt: &str, _input_kind: DataKind) -> Result<ConverterResult, ConvertError> {
        Err(ConvertError::Execution(format!(
            "{} does not implement convert()",
            self.name()
        )))
    }

    /// Converters that block on a human must never be executed by the harness.
    fn requires_human_input(&self) -> bool {
        false
    }

    fn backend(&self) -> ConverterBackend {
        ConverterBackend::Native
    }
}

impl std::fmt::Debug for dyn Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name())
            .field("capabilities", &self.capabilities().label())
            .field("backend", &self.backend())
            .finish()
    }
}

/// Reject input kinds the converter does not declare.
pub fn ensure_input(caps: &CapabilitySet, kind: DataKind) -> Result<(), ConvertError> {
    if caps.supports_input(kind) {
        Ok(())
    } else {
        Err(ConvertError::UnsupportedInput(kind))
    }
}
