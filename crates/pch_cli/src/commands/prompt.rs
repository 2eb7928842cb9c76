use anyhow::{Context, Result};
use console::style;
use pch_batch::{BatchConfig, SinglePromptProcessor};
use pch_domain::PromptRecord;
use pch_domain::record::records_to_table;
use pch_engine::{ClassificationLedger, HarnessConfig};
use pch_storage::{timestamped_output_path, write_table};
use pch_telemetry::TelemetryEvent;
use std::path::Path;

pub async fn run(
    ledger: &ClassificationLedger,
    config: &HarnessConfig,
    prompt: &str,
    output: Option<&Path>,
    events: &mut Vec<TelemetryEvent>,
) -> Result<()> {
    println!("{}", style("Single Prompt").bold().cyan());
    println!("Prompt: {}", prompt);
    println!();

    let mut processor = SinglePromptProcessor::from_ledger(ledger, BatchConfig::from_harness(config));
    let records = processor.run(prompt).await;
    events.extend(processor.take_events());

    print_records(&records);

    let requested = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| timestamped_output_path("prompt_variations"));
    let written = write_table(&records_to_table(&records), &requested)
        .with_context(|| format!("Failed to write {}", requested.display()))?;
    println!(
        "{} Saved {} variations to {}",
        style("✓").green().bold(),
        records.len(),
        written.display()
    );
    Ok(())
}

fn print_records(records: &[PromptRecord]) {
    let width = records
        .iter()
        .map(|r| r.converter.chars().count())
        .max()
        .unwrap_or(0)
        .max("Converter".len());

    println!("{:<width$}  {}", style("Converter").bold(), style("Output").bold());
    for record in records {
        let output = record.output.replace('\n', "\\n");
        if record.is_success() {
            println!("{:<width$}  {}", record.converter, output);
        } else {
            println!(
                "{:<width$}  {}",
                record.converter,
                style(format!("[{}] {}", record.status, output)).red()
            );
        }
    }
    println!();
}
