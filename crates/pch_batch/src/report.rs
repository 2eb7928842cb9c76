use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one input row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RowAction {
    /// Every converter was called on the row
    Processed,
    /// Text cell was missing or blank
    Skipped,
}

/// Counters for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Rows after `max_rows` truncation
    pub rows_total: usize,

    pub rows_processed: usize,

    pub rows_skipped: usize,

    /// Cells holding converter output
    pub cells_ok: usize,

    /// Cells holding an error marker
    pub cells_failed: usize,

    /// Converters that contributed an output column, in column order
    pub converters: Vec<String>,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,

    pub elapsed_secs: f64,
}

impl BatchReport {
    pub fn new(start_time: DateTime<Utc>, rows_total: usize, converters: Vec<String>) -> Self {
        Self {
            rows_total,
            rows_processed: 0,
            rows_skipped: 0,
            cells_ok: 0,
            cells_failed: 0,
            converters,
            start_time,
            end_time: start_time,
            elapsed_secs: 0.0,
        }
    }

    pub fn record_row(&mut self, action: RowAction) {
        match action {
            RowAction::Processed => self.rows_processed += 1,
            RowAction::Skipped => self.rows_skipped += 1,
        }
    }

    pub fn record_cell(&mut self, ok: bool) {
        if ok {
            self.cells_ok += 1;
        } else {
            self.cells_failed += 1;
        }
    }

    pub fn finalize(&mut self) {
        self.end_time = Utc::now();
        self.elapsed_secs = (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0;
    }

    /// Human-readable summary
    pub fn to_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("=== Batch Summary ===\n");
        summary.push_str(&format!("Started:    {}\n", self.start_time.format("%Y-%m-%d %H:%M:%S UTC")));
        summary.push_str(&format!("Finished:   {}\n", self.end_time.format("%Y-%m-%d %H:%M:%S UTC")));
        summary.push_str(&format!("Duration:   {:.2} seconds\n", self.elapsed_secs));
        summary.push_str(&format!("Converters: {}\n", self.converters.len()));
        summary.push_str("\n--- Rows ---\n");
        summary.push_str(&format!("Total:      {}\n", self.rows_total));
        summary.push_str(&format!("Processed:  {}\n", self.rows_processed));
        summary.push_str(&format!("Skipped:    {}\n", self.rows_skipped));
        summary.push_str("\n--- Cells ---\n");
        summary.push_str(&format!("OK:         {}\n", self.cells_ok));
        summary.push_str(&format!("Errors:     {}\n", self.cells_failed));

        let cells = self.cells_ok + self.cells_failed;
        if cells > 0 {
            let ok_rate = (self.cells_ok as f64 / cells as f64) * 100.0;
            summary.push_str(&format!("OK rate:    {:.1}%\n", ok_rate));
        }

        if self.elapsed_secs > 0.0 {
            let rows_per_sec = self.rows_processed as f64 / self.elapsed_secs;
            summary.push_str(&format!("Speed:      {:.2} rows/sec\n", rows_per_sec));
        }

        summary
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
