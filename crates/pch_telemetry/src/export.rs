use crate::events::TelemetryEvent;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat { Csv, PlainText, Json }

impl ExportFormat {
    /// Pick a format from a file extension; anything unknown is JSON lines.
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("csv") => Self::Csv,
            Some("txt") | Some("log") => Self::PlainText,
            _ => Self::Json,
        }
    }
}

pub fn export_log(events: &[TelemetryEvent], format: ExportFormat, writer: &mut dyn Write) -> Result<(), std::io::Error> {
    match format {
        ExportFormat::Json => {
            for event in events {
                serde_json::to_writer(&mut *writer, event)?;
                writeln!(writer)?;
            }
        }
        ExportFormat::PlainText => {
            for event in events {
                writeln!(writer, "{} {:?}", event.timestamp().to_rfc3339(), event)?;
            }
        }
        ExportFormat::Csv => {
            writeln!(writer, "type,timestamp,details")?;
            for event in events {
                let json = serde_json::to_string(event)?;
                writeln!(writer, "{},{},\"{}\"", event.kind(), event.timestamp().to_rfc3339(), json.replace('"', "\"\""))?;
            }
        }
    }
    Ok(())
}
