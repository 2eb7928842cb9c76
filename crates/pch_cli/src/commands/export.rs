use anyhow::{Context, Result};
use console::style;
use pch_telemetry::{ExportFormat, TelemetryEvent, export_log};
use std::fs::File;
use std::path::Path;

/// Write `events` to `path` when one was given.
pub fn write_report(path: Option<&Path>, events: &[TelemetryEvent]) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let format = ExportFormat::from_extension(path.extension().and_then(|e| e.to_str()));
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    export_log(events, format, &mut file).context("Failed to write event log")?;

    println!(
        "{} Wrote {} events to {}",
        style("✓").green().bold(),
        events.len(),
        path.display()
    );
    Ok(())
}
