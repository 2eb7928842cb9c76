use console::style;
use pch_engine::{ClassificationLedger, ConverterDiscovery, HarnessConfig};
use pch_plugins::{DefaultShim, ShimResolver};
use pch_telemetry::TelemetryEvent;
use std::sync::Arc;

pub async fn run(config: &HarnessConfig, events: &mut Vec<TelemetryEvent>) -> ClassificationLedger {
    println!("{}", style("Discovering converters...").bold().cyan());
    let shim: Arc<dyn ShimResolver> = Arc::new(DefaultShim::new(&config.data_dir));
    let mut discovery = ConverterDiscovery::from_config(config, shim);
    let ledger = discovery.run().await;
    events.extend(discovery.take_events());
    ledger
}

pub fn print_summary(ledger: &ClassificationLedger, verbose: bool, max_failures: usize) {
    let other = ledger.working_count() - ledger.text_to_text_count();

    println!();
    println!("{}", style("═".repeat(60)).dim());
    println!(
        "{} working text-to-text converters",
        style(ledger.text_to_text_count()).green().bold()
    );
    println!("{} other working converters (non-text output)", style(other).cyan());
    println!("{} failed converters", style(ledger.failed_count()).red());
    println!("{}", style("═".repeat(60)).dim());

    for name in ledger.sorted_text_to_text_names() {
        println!("  {} {}", style("✓").green(), name);
    }

    if verbose && ledger.failed_count() > 0 {
        println!();
        println!("{}", style("Failures:").bold().red());
        for (name, reason) in ledger.failure_details(max_failures) {
            println!("  {} {}: {}", style("✗").red(), name, reason);
        }
        if ledger.failed_count() > max_failures {
            println!("  ... and {} more", ledger.failed_count() - max_failures);
        }
    }
    println!();
}
