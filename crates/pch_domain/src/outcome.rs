use crate::types::CapabilitySet;
use serde::{Deserialize, Serialize};

/// Result of one probing step for one converter.
///
/// `I` is the instance type produced by a successful construction.
#[derive(Debug, Clone)]
pub enum ProbeOutcome<I> {
    Instantiated(I),
    InstantiationExhausted { last_error: Option<String> },
    ConversionOk(String),
    /// Marked working without running (needs a human at the keyboard).
    ConversionSkipped,
    ConversionTimeout,
    ConversionError { kind: String, message: String },
}

impl<I> ProbeOutcome<I> {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Instantiated(_) | Self::ConversionOk(_) | Self::ConversionSkipped
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Instantiated(_) => "instantiated",
            Self::InstantiationExhausted { .. } => "instantiation_exhausted",
            Self::ConversionOk(_) => "conversion_ok",
            Self::ConversionSkipped => "conversion_skipped",
            Self::ConversionTimeout => "conversion_timeout",
            Self::ConversionError { .. } => "conversion_error",
        }
    }
}

/// Final classification of a converter after probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Classification {
    TextToText,
    OtherMedia { capabilities: CapabilitySet },
    Failed { reason: String },
}

impl Classification {
    pub fn is_working(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataKind;

    #[test]
    fn test_outcome_success_flags() {
        assert!(ProbeOutcome::Instantiated(()).is_success());
        assert!(ProbeOutcome::<()>::ConversionOk("TEST".into()).is_success());
        assert!(ProbeOutcome::<()>::ConversionSkipped.is_success());
        assert!(!ProbeOutcome::<()>::ConversionTimeout.is_success());
        assert!(!ProbeOutcome::<()>::InstantiationExhausted { last_error: None }.is_success());
    }

    #[test]
    fn test_classification_serialization() {
        let c = Classification::OtherMedia {
            capabilities: CapabilitySet::new([DataKind::Text], [DataKind::Audio]),
        };
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"verdict\":\"other_media\""));
        assert!(c.is_working());

        let failed = Classification::Failed { reason: "boom".into() };
        assert!(!failed.is_working());
    }
}
