use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks a cell as a conversion failure rather than content.
pub const ERROR_MARKER: &str = "ERROR: ";

pub fn error_marker(message: impl fmt::Display) -> String {
    format!("{}{}", ERROR_MARKER, message)
}

pub fn is_error_marker(cell: &str) -> bool {
    cell.starts_with(ERROR_MARKER)
}

/// Column that holds a converter's output in batch mode.
pub fn output_column(converter: &str) -> String {
    format!("{}_output", converter)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Success,
    Failure { kind: String },
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failure { kind } => write!(f, "Failure: {}", kind),
        }
    }
}

/// One converter's result for a single prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub converter: String,
    pub input: String,
    /// Output text on success, error message on failure.
    pub output: String,
    pub status: RecordStatus,
}

impl PromptRecord {
    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

pub const PROMPT_TABLE_COLUMNS: [&str; 4] = ["Converter", "Input", "Output", "Status"];

/// Long-form table with one row per record.
pub fn records_to_table(records: &[PromptRecord]) -> Table {
    let mut table = Table::new(PROMPT_TABLE_COLUMNS);
    for record in records {
        // Width always matches the four fixed columns.
        let _ = table.push_row(vec![
            Some(record.converter.clone()),
            Some(record.input.clone()),
            Some(record.output.clone()),
            Some(record.status.to_string()),
        ]);
    }
    table
}
