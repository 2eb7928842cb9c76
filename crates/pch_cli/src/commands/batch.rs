use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pch_batch::{BatchConfig, BatchProcessor};
use pch_engine::{ClassificationLedger, HarnessConfig};
use pch_storage::{read_table, timestamped_output_path, write_table};
use pch_telemetry::TelemetryEvent;
use std::path::Path;

pub async fn run(
    ledger: &ClassificationLedger,
    config: &HarnessConfig,
    input: &Path,
    output: Option<&Path>,
    max_rows: Option<usize>,
    events: &mut Vec<TelemetryEvent>,
) -> Result<()> {
    println!("{}", style("Batch Mode").bold().cyan());
    println!("Input:  {}", input.display());
    println!("Column: {}", config.prompt_column);
    if let Some(max) = max_rows {
        println!("Max rows: {}", max);
    }
    println!();

    let table = read_table(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let rows = max_rows.map_or(table.row_count(), |m| m.min(table.row_count()));

    let pb = ProgressBar::new(rows as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")?
            .progress_chars("#>-"),
    );
    let bar = pb.clone();

    let batch_config = BatchConfig::from_harness(config).with_max_rows(max_rows);
    let mut processor = BatchProcessor::from_ledger(ledger, batch_config)
        .with_progress(Box::new(move |done: usize, _: usize| bar.set_position(done as u64)));

    let result = processor.run(table, &config.prompt_column).await;
    pb.finish_and_clear();
    events.extend(processor.take_events());
    let batch = result?;

    let requested = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| timestamped_output_path("enriched_prompts"));
    let written = write_table(&batch.table, &requested)
        .with_context(|| format!("Failed to write {}", requested.display()))?;

    println!("{}", style("═".repeat(60)).dim());
    println!("{}", batch.report.to_summary());
    println!("{}", style("═".repeat(60)).dim());
    println!(
        "{} Saved {} rows to {}",
        style("✓").green().bold(),
        batch.table.row_count(),
        written.display()
    );
    Ok(())
}
