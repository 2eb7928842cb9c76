use crate::candidates::{candidates_for, fallback_candidates};
use crate::panic_message;
use pch_domain::{ConstructArgs, ConstructError, ProbeOutcome};
use pch_plugins::{Converter, ConverterFactory, ShimResolver};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;

/// Outcome of probing one factory, plus the candidate indices tried in order.
#[derive(Debug)]
pub struct ProbeAttempt {
    pub outcome: ProbeOutcome<Arc<dyn Converter>>,
    pub attempts: Vec<usize>,
}

impl ProbeAttempt {
    pub fn into_converter(self) -> Option<Arc<dyn Converter>> {
        match self.outcome {
            ProbeOutcome::Instantiated(converter) => Some(converter),
            _ => None,
        }
    }
}

/// Finds a constructor argument set a converter accepts.
///
/// Shape mismatches and validation failures move on to the next candidate;
/// a fatal error (or a panic in the factory) ends probing for that converter.
pub struct InstantiationProber {
    fallback: Vec<ConstructArgs>,
}

impl InstantiationProber {
    pub fn new() -> Self {
        Self::with_candidates(fallback_candidates())
    }

    pub fn with_candidates(fallback: Vec<ConstructArgs>) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> &[ConstructArgs] {
        &self.fallback
    }

    pub fn probe(&self, factory: &dyn ConverterFactory, shim: &dyn ShimResolver) -> ProbeAttempt {
        let name = factory.name();
        let mut attempts = Vec::new();
        let mut last_error: Option<ConstructError> = None;

        for (index, args) in candidates_for(factory, &self.fallback).iter().enumerate() {
            attempts.push(index);

            let built = std::panic::catch_unwind(AssertUnwindSafe(|| factory.construct(args, shim)))
                .unwrap_or_else(|payload| {
                    Err(ConstructError::Fatal(format!(
                        "factory panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });

            match built {
                Ok(converter) => {
                    debug!("{} instantiated with {}", name, args);
                    return ProbeAttempt {
                        outcome: ProbeOutcome::Instantiated(Arc::from(converter)),
                        attempts,
                    };
                }
                Err(e) if e.is_recoverable() => {
                    debug!("{} rejected {}: {}", name, args, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    debug!("{} failed fatally with {}: {}", name, args, e);
                    last_error = Some(e);
                    break;
                }
            }
        }

        ProbeAttempt {
            outcome: ProbeOutcome::InstantiationExhausted {
                last_error: last_error.map(|e| e.to_string()),
            },
            attempts,
        }
    }
}

impl Default for InstantiationProber {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pch_domain::{CapabilitySet, ConvertError, ConverterResult, DataKind};
    use pch_plugins::{ConverterFamily, DefaultShim, FnFactory};

    struct Stub;

    #[async_trait::async_trait]
    impl Converter for Stub {
        fn name(&self) -> &str {
            "StubConverter"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::text_to_text()
        }

        async fn convert_async(&self, prompt: &str, _: DataKind) -> Result<ConverterResult, ConvertError> {
            Ok(ConverterResult::text(prompt))
        }
    }

    type Built = Result<Box<dyn Converter>, ConstructError>;

    fn shape_always(_: &ConstructArgs, _: &dyn ShimResolver) -> Built {
        Err(ConstructError::ShapeMismatch("unexpected keyword".into()))
    }

    fn needs_font(args: &ConstructArgs, _: &dyn ShimResolver) -> Built {
        match args.get_str("font")? {
            Some("rand") => Ok(Box::new(Stub)),
            Some(_) => Err(ConstructError::ValidationFailed("font must be valid".into())),
            None => Err(ConstructError::ShapeMismatch("missing font".into())),
        }
    }

    fn fatal_on_second(args: &ConstructArgs, _: &dyn ShimResolver) -> Built {
        if args.is_empty() {
            Err(ConstructError::ShapeMismatch("missing".into()))
        } else {
            Err(ConstructError::Fatal("backend exploded".into()))
        }
    }

    fn panics(_: &ConstructArgs, _: &dyn ShimResolver) -> Built {
        panic!("constructor bug")
    }

    fn probe(factory: FnFactory) -> ProbeAttempt {
        InstantiationProber::new().probe(&factory, &DefaultShim::default())
    }

    #[test]
    fn test_exhausts_in_declared_order() {
        let attempt = probe(FnFactory::new("NopeConverter", ConverterFamily::Legacy, shape_always));
        assert_eq!(attempt.attempts, (0..21).collect::<Vec<_>>());
        match attempt.outcome {
            ProbeOutcome::InstantiationExhausted { last_error } => {
                assert!(last_error.unwrap().contains("unexpected keyword"));
            }
            other => panic!("unexpected outcome {:?}", other.label()),
        }
    }

    #[test]
    fn test_validation_failure_moves_on() {
        let attempt = probe(FnFactory::new("FontConverter", ConverterFamily::Legacy, needs_font));
        // {font: block} is index 4 and fails validation; {font: rand} is index 5
        assert_eq!(attempt.attempts, vec![0, 1, 2, 3, 4, 5]);
        let converter = attempt.into_converter().unwrap();
        assert_eq!(converter.name(), "StubConverter");
    }

    #[test]
    fn test_fatal_stops_probing() {
        let attempt = probe(FnFactory::new("FatalConverter", ConverterFamily::Legacy, fatal_on_second));
        assert_eq!(attempt.attempts, vec![0, 1]);
        assert!(!attempt.outcome.is_success());
    }

    #[test]
    fn test_panicking_factory_is_fatal() {
        let attempt = probe(FnFactory::new("PanicConverter", ConverterFamily::Legacy, panics));
        assert_eq!(attempt.attempts, vec![0]);
        match attempt.outcome {
            ProbeOutcome::InstantiationExhausted { last_error } => {
                assert!(last_error.unwrap().contains("constructor bug"));
            }
            other => panic!("unexpected outcome {:?}", other.label()),
        }
    }

    #[test]
    fn test_declared_defaults_tried_first() {
        let factory = FnFactory::new("FontConverter", ConverterFamily::Legacy, needs_font)
            .with_defaults(ConstructArgs::new().with("font", "rand"));
        let attempt = probe(factory);
        assert_eq!(attempt.attempts, vec![0]);
        assert!(attempt.outcome.is_success());
    }
}
