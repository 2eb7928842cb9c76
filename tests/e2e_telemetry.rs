use pch_batch::{BatchConfig, BatchProcessor};
use pch_domain::Table;
use pch_engine::ConverterDiscovery;
use pch_plugins::{ConverterRegistry, DefaultShim};
use pch_telemetry::{ExportFormat, TelemetryEvent, export_log};
use std::sync::Arc;

async fn collect_events() -> Vec<TelemetryEvent> {
    let mut discovery = ConverterDiscovery::new(
        ConverterRegistry::new().with_builtins(),
        Arc::new(DefaultShim::default()),
    );
    let ledger = discovery.run().await;
    let mut events = discovery.take_events();

    let mut processor = BatchProcessor::from_ledger(&ledger, BatchConfig::default());
    processor
        .run(Table::from_column("prompt", ["one", "two"]), "prompt")
        .await
        .unwrap();
    events.extend(processor.take_events());
    events
}

#[tokio::test]
async fn test_event_sequence() {
    let events = collect_events().await;
    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert!(kinds.contains(&"ConverterClassified"));

    assert!(matches!(events.first(), Some(TelemetryEvent::DiscoveryStarted { .. })));
    assert!(matches!(events.last(), Some(TelemetryEvent::BatchCompleted { rows: 2, .. })));
    let completed = events
        .iter()
        .position(|e| matches!(e, TelemetryEvent::DiscoveryCompleted { .. }))
        .unwrap();
    assert!(events[..completed]
        .iter()
        .all(|e| !matches!(e, TelemetryEvent::BatchCompleted { .. })));
}

#[tokio::test]
async fn test_export_every_format() {
    let events = collect_events().await;

    let mut json = Vec::new();
    export_log(&events, ExportFormat::Json, &mut json).unwrap();
    let json = String::from_utf8(json).unwrap();
    assert_eq!(json.lines().count(), events.len());
    for line in json.lines() {
        serde_json::from_str::<serde_json::Value>(line).unwrap();
    }

    let mut csv = Vec::new();
    export_log(&events, ExportFormat::Csv, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.starts_with("type,timestamp,details"));

    let mut plain = Vec::new();
    export_log(&events, ExportFormat::PlainText, &mut plain).unwrap();
    assert!(!plain.is_empty());
}
