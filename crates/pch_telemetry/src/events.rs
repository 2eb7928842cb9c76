use serde::Serialize;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize)]
pub enum TelemetryEvent {
    DiscoveryStarted { sources: Vec<String>, timestamp: DateTime<Utc> },
    ModuleLoadFailed { module: String, reason: String, timestamp: DateTime<Utc> },
    ConverterClassified { converter: String, verdict: String, detail: String, attempts: usize, duration_ms: u64, timestamp: DateTime<Utc> },
    DiscoveryCompleted { working: usize, text_to_text: usize, failed: usize, elapsed_secs: f64, timestamp: DateTime<Utc> },
    PromptProcessed { converter: String, status: String, duration_ms: u64, timestamp: DateTime<Utc> },
    BatchCompleted { rows: usize, processed: usize, skipped: usize, cells_ok: usize, cells_failed: usize, elapsed_secs: f64, timestamp: DateTime<Utc> },
    Warning { message: String, timestamp: DateTime<Utc> },
}

impl TelemetryEvent {
    pub fn discovery_started(sources: Vec<String>) -> Self {
        Self::DiscoveryStarted { sources, timestamp: Utc::now() }
    }
    pub fn module_load_failed(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleLoadFailed { module: module.into(), reason: reason.into(), timestamp: Utc::now() }
    }
    pub fn converter_classified(converter: impl Into<String>, verdict: impl Into<String>, detail: impl Into<String>, attempts: usize, duration_ms: u64) -> Self {
        Self::ConverterClassified { converter: converter.into(), verdict: verdict.into(), detail: detail.into(), attempts, duration_ms, timestamp: Utc::now() }
    }
    pub fn discovery_completed(working: usize, text_to_text: usize, failed: usize, elapsed_secs: f64) -> Self {
        Self::DiscoveryCompleted { working, text_to_text, failed, elapsed_secs, timestamp: Utc::now() }
    }
    pub fn prompt_processed(converter: impl Into<String>, status: impl Into<String>, duration_ms: u64) -> Self {
        Self::PromptProcessed { converter: converter.into(), status: status.into(), duration_ms, timestamp: Utc::now() }
    }
    pub fn batch_completed(rows: usize, processed: usize, skipped: usize, cells_ok: usize, cells_failed: usize, elapsed_secs: f64) -> Self {
        Self::BatchCompleted { rows, processed, skipped, cells_ok, cells_failed, elapsed_secs, timestamp: Utc::now() }
    }
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning { message: message.into(), timestamp: Utc::now() }
    }

    /// Variant name, as used in the CSV export.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DiscoveryStarted { .. } => "DiscoveryStarted",
            Self::ModuleLoadFailed { .. } => "ModuleLoadFailed",
            Self::ConverterClassified { .. } => "ConverterClassified",
            Self::DiscoveryCompleted { .. } => "DiscoveryCompleted",
            Self::PromptProcessed { .. } => "PromptProcessed",
            Self::BatchCompleted { .. } => "BatchCompleted",
            Self::Warning { .. } => "Warning",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::DiscoveryStarted { timestamp, .. }
            | Self::ModuleLoadFailed { timestamp, .. }
            | Self::ConverterClassified { timestamp, .. }
            | Self::DiscoveryCompleted { timestamp, .. }
            | Self::PromptProcessed { timestamp, .. }
            | Self::BatchCompleted { timestamp, .. }
            | Self::Warning { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_variant_tag() {
        let event = TelemetryEvent::converter_classified("UpperCaseConverter", "text_to_text", "TEST", 1, 3);
        let json = serde_json::to_value(&event).unwrap();
        let body = &json["ConverterClassified"];
        assert_eq!(body["converter"], "UpperCaseConverter");
        assert_eq!(body["attempts"], 1);
        assert_eq!(event.kind(), "ConverterClassified");
    }
}
