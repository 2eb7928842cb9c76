use crate::types::DataKind;
use thiserror::Error;

/// Why a converter refused a set of constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    /// The argument set has the wrong shape (unexpected or missing keys).
    #[error("TypeError: {0}")]
    ShapeMismatch(String),

    /// The shape was accepted but a value was rejected.
    #[error("ValueError: {0}")]
    ValidationFailed(String),

    /// Anything else. Probing stops for this converter.
    #[error("{0}")]
    Fatal(String),
}

impl ConstructError {
    /// Whether the prober may move on to the next candidate.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal(_))
    }

    /// Classify an untyped error message from a legacy plugin.
    ///
    /// Argument-shape wording wins over value wording; anything unrecognised
    /// is fatal.
    pub fn from_legacy_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        const SHAPE_MARKERS: [&str; 5] = [
            "unexpected keyword",
            "unexpected argument",
            "unknown argument",
            "takes no arguments",
            "missing",
        ];
        const VALUE_MARKERS: [&str; 3] = ["required", "empty", "valid"];

        if SHAPE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::ShapeMismatch(message)
        } else if VALUE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::ValidationFailed(message)
        } else {
            Self::Fatal(message)
        }
    }
}

/// Failure of a conversion call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("input kind '{0}' is not supported")]
    UnsupportedInput(DataKind),

    #[error("no backend available: {0}")]
    BackendUnavailable(String),

    #[error("requires interactive input: {0}")]
    Interactive(String),

    #[error("{0}")]
    Execution(String),

    #[error("conversion timed out after {0:.1}s")]
    Timeout(f64),

    #[error("converter panicked: {0}")]
    Panicked(String),
}

impl ConvertError {
    /// Short kind name used in failure reasons and status columns.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnsupportedInput(_) => "UnsupportedInput",
            Self::BackendUnavailable(_) => "BackendUnavailable",
            Self::Interactive(_) => "Interactive",
            Self::Execution(_) => "ExecutionError",
            Self::Timeout(_) => "Timeout",
            Self::Panicked(_) => "Panic",
        }
    }
}
