use crate::panic_message;
use futures::FutureExt;
use pch_domain::{ConvertError, ConverterResult, DataKind, ProbeOutcome};
use pch_plugins::Converter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PROBE_TEXT: &str = "test";
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(5);

/// Run one conversion under `deadline`.
///
/// Elapsing the deadline drops the conversion future. Work already handed to
/// a blocking thread keeps running until its own sandbox limit stops it.
/// A panic inside the converter comes back as [`ConvertError::Panicked`].
pub async fn guarded_convert(
    converter: &dyn Converter,
    prompt: &str,
    input_kind: DataKind,
    deadline: Duration,
) -> Result<ConverterResult, ConvertError> {
    let call = AssertUnwindSafe(converter.convert_async(prompt, input_kind)).catch_unwind();
    match tokio::time::timeout(deadline, call).await {
        Err(_elapsed) => Err(ConvertError::Timeout(deadline.as_secs_f64())),
        Ok(Err(payload)) => Err(ConvertError::Panicked(panic_message(payload.as_ref()))),
        Ok(Ok(result)) => result,
    }
}

/// Convert one table cell or prompt.
///
/// Converters that wait on a person at the terminal run without a deadline,
/// so at most one of their prompts is ever outstanding. Everything else goes
/// through [`guarded_convert`].
pub async fn convert_cell(
    converter: &dyn Converter,
    prompt: &str,
    input_kind: DataKind,
    deadline: Duration,
) -> Result<ConverterResult, ConvertError> {
    if !converter.requires_human_input() {
        return guarded_convert(converter, prompt, input_kind, deadline).await;
    }
    AssertUnwindSafe(converter.convert_async(prompt, input_kind))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload.as_ref()))))
}

/// Confirms an instantiated converter actually runs.
#[derive(Debug, Clone)]
pub struct ExecutionHarness {
    deadline: Duration,
    probe_text: String,
}

impl ExecutionHarness {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            probe_text: DEFAULT_PROBE_TEXT.to_string(),
        }
    }

    #[must_use]
    pub fn with_probe_text(mut self, text: impl Into<String>) -> Self {
        self.probe_text = text.into();
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn probe_text(&self) -> &str {
        &self.probe_text
    }

    /// Probe `converter` once with the probe text as a text input.
    ///
    /// Converters that wait on a human are reported as skipped without being
    /// called; there is no safe way to bound them.
    pub async fn execute(&self, converter: &dyn Converter) -> ProbeOutcome<Arc<dyn Converter>> {
        if converter.requires_human_input() {
            return ProbeOutcome::ConversionSkipped;
        }

        match guarded_convert(converter, &self.probe_text, DataKind::Text, self.deadline).await {
            Ok(result) => ProbeOutcome::ConversionOk(result.output_text),
            Err(ConvertError::Timeout(_)) => ProbeOutcome::ConversionTimeout,
            Err(e) => ProbeOutcome::ConversionError {
                kind: e.kind_name().to_string(),
                message: match e {
                    // Keep the converter's own text without the variant prefix
                    ConvertError::Execution(m)
                    | ConvertError::BackendUnavailable(m)
                    | ConvertError::Interactive(m)
                    | ConvertError::Panicked(m) => m,
                    other => other.to_string(),
                },
            },
        }
    }
}

impl Default for ExecutionHarness {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_DEADLINE)
    }
}
