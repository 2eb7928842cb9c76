use crate::config::BatchConfig;
use crate::report::{BatchReport, RowAction};
use chrono::Utc;
use pch_domain::{
    ConvertError, DataKind, PromptRecord, RecordStatus, Table, error_marker,
    output_column,
};
use pch_engine::{ClassificationLedger, convert_cell};
use pch_plugins::Converter;
use pch_telemetry::TelemetryEvent;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Column '{column}' not found. Available: {available:?}")]
    MissingColumn { column: String, available: Vec<String> },
}

/// Enriched table plus counters for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub table: Table,
    pub report: BatchReport,
}

/// Called after each row with `(rows_done, rows_total)`.
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

type NamedConverter = (String, Arc<dyn Converter>);

fn ledger_converters(ledger: &ClassificationLedger) -> Vec<NamedConverter> {
    ledger
        .text_to_text()
        .map(|w| (w.name.clone(), Arc::clone(&w.converter)))
        .collect()
}

fn named(converters: Vec<Arc<dyn Converter>>) -> Vec<NamedConverter> {
    converters
        .into_iter()
        .map(|c| (c.name().to_string(), c))
        .collect()
}

/// Runs every working text-to-text converter over one column of a table.
///
/// Each converter gets its own `<Name>_output` column. Calls are made one at
/// a time, each bounded by the cell deadline, and a failure only ever
/// touches its own cell.
pub struct BatchProcessor {
    config: BatchConfig,
    converters: Vec<NamedConverter>,
    progress: Option<ProgressFn>,
    events: Vec<TelemetryEvent>,
}

impl BatchProcessor {
    pub fn new(converters: Vec<Arc<dyn Converter>>, config: BatchConfig) -> Self {
        Self {
            config,
            converters: named(converters),
            progress: None,
            events: Vec::new(),
        }
    }

    /// Text-to-text converters from `ledger`, in classification order.
    pub fn from_ledger(ledger: &ClassificationLedger, config: BatchConfig) -> Self {
        Self {
            config,
            converters: ledger_converters(ledger),
            progress: None,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn converter_names(&self) -> Vec<&str> {
        self.converters.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn take_events(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events)
    }

    pub async fn run(&mut self, mut table: Table, column: &str) -> Result<BatchOutput, BatchError> {
        let text_idx = table
            .require_column(column)
            .map_err(|_| BatchError::MissingColumn {
                column: column.to_string(),
                available: table.columns().to_vec(),
            })?;
        if let Some(max_rows) = self.config.max_rows.filter(|&n| n > 0) {
            table.truncate(max_rows);
        }

        let rows = table.row_count();
        let mut report = BatchReport::new(
            Utc::now(),
            rows,
            self.converters.iter().map(|(n, _)| n.clone()).collect(),
        );
        info!(
            "Processing {} rows with {} converters",
            rows,
            self.converters.len()
        );

        let output_cols: Vec<usize> = self
            .converters
            .iter()
            .map(|(name, _)| table.ensure_column(&output_column(name)))
            .collect();

        for row in 0..rows {
            let Some(text) = table.non_blank(row, text_idx).map(str::to_string) else {
                debug!("Skipping row {} (blank '{}')", row, column);
                report.record_row(RowAction::Skipped);
                self.tick(row + 1, rows);
                continue;
            };

            for ((name, converter), &col) in self.converters.iter().zip(&output_cols) {
                match convert_cell(converter.as_ref(), &text, DataKind::Text, self.config.cell_deadline).await {
                    Ok(result) => {
                        table.set(row, col, result.output_text);
                        report.record_cell(true);
                    }
                    Err(e) => {
                        warn!("{} failed on row {}: {}", name, row, e);
                        table.set(row, col, error_marker(&e));
                        report.record_cell(false);
                    }
                }
            }
            report.record_row(RowAction::Processed);
            self.tick(row + 1, rows);
        }

        report.finalize();
        info!(
            "Batch complete: {} rows processed, {} skipped, {} cell errors",
            report.rows_processed, report.rows_skipped, report.cells_failed
        );
        self.events.push(TelemetryEvent::batch_completed(
            rows,
            report.rows_processed,
            report.rows_skipped,
            report.cells_ok,
            report.cells_failed,
            report.elapsed_secs,
        ));

        Ok(BatchOutput { table, report })
    }

    fn tick(&self, done: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(done, total);
        }
        if self.config.log_every_n > 0 && done % self.config.log_every_n == 0 {
            info!("Progress: {}/{} rows", done, total);
        }
    }
}

/// Runs every working text-to-text converter once over a single prompt.
pub struct SinglePromptProcessor {
    config: BatchConfig,
    converters: Vec<NamedConverter>,
    events: Vec<TelemetryEvent>,
}

impl SinglePromptProcessor {
    pub fn new(converters: Vec<Arc<dyn Converter>>, config: BatchConfig) -> Self {
        Self {
            config,
            converters: named(converters),
            events: Vec::new(),
        }
    }

    pub fn from_ledger(ledger: &ClassificationLedger, config: BatchConfig) -> Self {
        Self {
            config,
            converters: ledger_converters(ledger),
            events: Vec::new(),
        }
    }

    pub fn take_events(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events)
    }

    /// One record per converter, in converter order.
    pub async fn run(&mut self, prompt: &str) -> Vec<PromptRecord> {
        let mut records = Vec::with_capacity(self.converters.len());
        for (name, converter) in &self.converters {
            let started = Instant::now();
            let (output, status) =
                match convert_cell(converter.as_ref(), prompt, DataKind::Text, self.config.cell_deadline).await {
                    Ok(result) => (result.output_text, RecordStatus::Success),
                    Err(e) => {
                        warn!("{} failed: {}", name, e);
                        let kind = e.kind_name().to_string();
                        (failure_text(e), RecordStatus::Failure { kind })
                    }
                };

            self.events.push(TelemetryEvent::prompt_processed(
                name,
                status.to_string(),
                started.elapsed().as_millis() as u64,
            ));
            records.push(PromptRecord {
                converter: name.clone(),
                input: prompt.to_string(),
                output,
                status,
            });
        }
        records
    }
}

fn failure_text(err: ConvertError) -> String {
    match err {
        ConvertError::Execution(m) => m,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pch_domain::{CapabilitySet, ConstructArgs, ConverterResult};
    use pch_plugins::DefaultShim;
    use pch_plugins::builtin::builtin_factories;

    fn builtin(name: &str) -> Arc<dyn Converter> {
        let factory = builtin_factories()
            .into_iter()
            .find(|f| f.name() == name)
            .unwrap();
        Arc::from(factory.construct(&ConstructArgs::new(), &DefaultShim::default()).unwrap())
    }

    struct Refuses;

    #[async_trait::async_trait]
    impl Converter for Refuses {
        fn name(&self) -> &str {
            "RefusesConverter"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::text_to_text()
        }

        async fn convert_async(&self, prompt: &str, _: DataKind) -> Result<ConverterResult, ConvertError> {
            if prompt == "bad" {
                return Err(ConvertError::Execution("bad input".into()));
            }
            Ok(ConverterResult::text(prompt.len().to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_column_lists_available() {
        let mut processor = BatchProcessor::new(vec![builtin("UpperCaseConverter")], BatchConfig::default());
        let table = Table::from_column("text", ["hi"]);
        let err = processor.run(table, "prompt").await.unwrap_err();
        match err {
            BatchError::MissingColumn { column, available } => {
                assert_eq!(column, "prompt");
                assert_eq!(available, vec!["text".to_string()]);
            }
        }
    }

    #[tokio::test]
    async fn test_max_rows_truncates_first() {
        let config = BatchConfig::default().with_max_rows(Some(2));
        let mut processor = BatchProcessor::new(vec![builtin("UpperCaseConverter")], config);
        let output = processor
            .run(Table::from_column("prompt", ["a", "b", "c"]), "prompt")
            .await
            .unwrap();
        assert_eq!(output.table.row_count(), 2);
        assert_eq!(output.report.rows_total, 2);
        assert_eq!(output.report.rows_processed, 2);
    }

    #[tokio::test]
    async fn test_error_stays_in_its_cell() {
        let mut processor = BatchProcessor::new(
            vec![builtin("UpperCaseConverter"), Arc::new(Refuses)],
            BatchConfig::default(),
        );
        let output = processor
            .run(Table::from_column("prompt", ["ok", "bad"]), "prompt")
            .await
            .unwrap();
        let table = &output.table;
        assert_eq!(table.get(0, 1), Some("OK"));
        assert_eq!(table.get(0, 2), Some("2"));
        assert_eq!(table.get(1, 1), Some("BAD"));
        assert_eq!(table.get(1, 2), Some("ERROR: bad input"));
        assert_eq!(output.report.cells_failed, 1);
        assert_eq!(output.report.cells_ok, 3);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_row() {
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut processor = BatchProcessor::new(vec![builtin("FlipConverter")], BatchConfig::default())
            .with_progress(Box::new(move |_: usize, _: usize| {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }));
        processor
            .run(Table::from_column("prompt", ["a", " ", "c"]), "prompt")
            .await
            .unwrap();
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 3);

        let events = processor.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TelemetryEvent::BatchCompleted { processed: 2, skipped: 1, .. }));
    }

    #[tokio::test]
    async fn test_single_prompt_records() {
        let mut processor = SinglePromptProcessor::new(
            vec![builtin("UpperCaseConverter"), Arc::new(Refuses)],
            BatchConfig::default(),
        );
        let records = processor.run("bad").await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].output, "BAD");
        assert!(records[0].is_success());
        assert_eq!(records[1].output, "bad input");
        assert_eq!(
            records[1].status,
            RecordStatus::Failure { kind: "ExecutionError".into() }
        );
        assert_eq!(processor.take_events().len(), 2);
    }

    /// Blocks like a terminal prompt and records how many calls overlap.
    struct Operator {
        in_flight: Arc<std::sync::atomic::AtomicUsize>,
        peak: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Converter for Operator {
        fn name(&self) -> &str {
            "OperatorConverter"
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::text_to_text()
        }

        async fn convert_async(&self, prompt: &str, _: DataKind) -> Result<ConverterResult, ConvertError> {
            use std::sync::atomic::Ordering;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_secs(120)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ConverterResult::text(format!("{prompt} (edited)")))
        }

        fn requires_human_input(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interactive_converter_never_overlaps() {
        let peak = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let operator = Operator {
            in_flight: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };
        let config = BatchConfig::default().with_cell_deadline(std::time::Duration::from_secs(1));
        let mut processor = BatchProcessor::new(vec![Arc::new(operator)], config);
        let output = processor
            .run(Table::from_column("prompt", ["one", "two"]), "prompt")
            .await
            .unwrap();

        assert_eq!(peak.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(output.table.get(0, 1), Some("one (edited)"));
        assert_eq!(output.table.get(1, 1), Some("two (edited)"));
        assert_eq!(output.report.cells_failed, 0);
    }

    #[tokio::test]
    async fn test_zero_max_rows_means_no_cap() {
        let config = BatchConfig::default().with_max_rows(Some(0));
        let mut processor = BatchProcessor::new(vec![builtin("UpperCaseConverter")], config);
        let output = processor
            .run(Table::from_column("prompt", ["a", "b", "c"]), "prompt")
            .await
            .unwrap();
        assert_eq!(output.table.row_count(), 3);
        assert_eq!(output.report.rows_processed, 3);
    }
}
