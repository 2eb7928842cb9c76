use crate::config::HarnessConfig;
use crate::harness::ExecutionHarness;
use crate::ledger::{
    ClassificationLedger, EXHAUSTED_REASON, TIMEOUT_REASON, WorkingConverter, testing_failed_reason,
};
use crate::prober::InstantiationProber;
use pch_domain::ProbeOutcome;
use pch_plugins::{ConverterRegistry, PluginDescriptor, ShimResolver};
use pch_telemetry::TelemetryEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Registry scan, probing and classification in one pass.
pub struct ConverterDiscovery {
    registry: ConverterRegistry,
    prober: InstantiationProber,
    harness: ExecutionHarness,
    shim: Arc<dyn ShimResolver>,
    events: Vec<TelemetryEvent>,
}

impl ConverterDiscovery {
    pub fn new(registry: ConverterRegistry, shim: Arc<dyn ShimResolver>) -> Self {
        Self {
            registry,
            prober: InstantiationProber::new(),
            harness: ExecutionHarness::default(),
            shim,
            events: Vec::new(),
        }
    }

    /// Registry, deadline and probe text taken from `config`.
    pub fn from_config(config: &HarnessConfig, shim: Arc<dyn ShimResolver>) -> Self {
        let mut registry = ConverterRegistry::with_config(config.sandbox.to_sandbox_config());
        if config.include_builtins {
            registry = registry.with_builtins();
        }
        for dir in &config.plugin_dirs {
            registry.add_plugin_directory(dir);
        }

        Self::new(registry, shim).with_harness(
            ExecutionHarness::new(config.probe_deadline()).with_probe_text(config.probe_text.clone()),
        )
    }

    #[must_use]
    pub fn with_harness(mut self, harness: ExecutionHarness) -> Self {
        self.harness = harness;
        self
    }

    #[must_use]
    pub fn with_prober(mut self, prober: InstantiationProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn shim(&self) -> &Arc<dyn ShimResolver> {
        &self.shim
    }

    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Discover, probe and classify every converter, one at a time.
    pub async fn run(&mut self) -> ClassificationLedger {
        let started = Instant::now();

        let mut sources = Vec::new();
        if self.registry.factory_count() > 0 {
            sources.push("builtin".to_string());
        }
        sources.extend(self.registry.directories().iter().map(|d| d.display().to_string()));
        self.events.push(TelemetryEvent::discovery_started(sources));

        info!("Discovering converters...");
        let discovery = self.registry.discover();
        let mut ledger = ClassificationLedger::new();

        for (module, reason) in &discovery.load_failures {
            debug!("{} - {}", module, reason);
            ledger.record_failure(module.clone(), reason.clone());
            self.events.push(TelemetryEvent::module_load_failed(module, reason));
        }

        for descriptor in &discovery.descriptors {
            self.classify(descriptor, &mut ledger).await;
        }

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            "Working text-to-text converters: {} (other working: {}, failed: {})",
            ledger.text_to_text_count(),
            ledger.working_count() - ledger.text_to_text_count(),
            ledger.failed_count()
        );
        self.events.push(TelemetryEvent::discovery_completed(
            ledger.working_count(),
            ledger.text_to_text_count(),
            ledger.failed_count(),
            elapsed,
        ));
        ledger
    }

    async fn classify(&mut self, descriptor: &PluginDescriptor, ledger: &mut ClassificationLedger) {
        if ledger.is_classified(&descriptor.name) {
            return;
        }

        let started = Instant::now();
        let name = descriptor.name.as_str();
        let attempt = self.prober.probe(descriptor.factory.as_ref(), self.shim.as_ref());
        let attempts = attempt.attempts.len();

        let Some(converter) = attempt.into_converter() else {
            debug!("{} - {}", name, EXHAUSTED_REASON);
            self.fail(ledger, name, EXHAUSTED_REASON.to_string(), attempts, started);
            return;
        };

        let capabilities = converter.capabilities();
        let probe_output = match self.harness.execute(converter.as_ref()).await {
            ProbeOutcome::ConversionOk(output) => Some(output),
            ProbeOutcome::ConversionSkipped => None,
            ProbeOutcome::ConversionTimeout => {
                debug!("{} - {}", name, TIMEOUT_REASON);
                self.fail(ledger, name, TIMEOUT_REASON.to_string(), attempts, started);
                return;
            }
            ProbeOutcome::ConversionError { kind, message } => {
                let reason = testing_failed_reason(&kind, &message);
                debug!("{} - {}", name, reason);
                self.fail(ledger, name, reason, attempts, started);
                return;
            }
            ProbeOutcome::Instantiated(_) | ProbeOutcome::InstantiationExhausted { .. } => {
                self.fail(ledger, name, EXHAUSTED_REASON.to_string(), attempts, started);
                return;
            }
        };

        let skipped = if probe_output.is_none() { " (skipped test)" } else { "" };
        let verdict = if capabilities.is_text_to_text() {
            info!("{} - Text→Text{}", name, skipped);
            "text_to_text"
        } else {
            info!("{} - {}", name, capabilities.label());
            "other_media"
        };

        self.events.push(TelemetryEvent::converter_classified(
            name,
            verdict,
            probe_output.clone().unwrap_or_default(),
            attempts,
            started.elapsed().as_millis() as u64,
        ));

        ledger.record_working(WorkingConverter {
            name: descriptor.name.clone(),
            source: descriptor.source.clone(),
            converter,
            capabilities,
            probe_output,
        });
    }

    fn fail(
        &mut self,
        ledger: &mut ClassificationLedger,
        name: &str,
        reason: String,
        attempts: usize,
        started: Instant,
    ) {
        self.events.push(TelemetryEvent::converter_classified(
            name,
            "failed",
            reason.clone(),
            attempts,
            started.elapsed().as_millis() as u64,
        ));
        ledger.record_failure(name, reason);
    }
}
