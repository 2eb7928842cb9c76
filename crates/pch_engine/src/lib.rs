//! Probing and classification of converter plugins.
//!
//! [`ConverterDiscovery`] drives the whole pass: the registry lists converter
//! factories, the [`InstantiationProber`] finds an argument set each one
//! accepts, the [`ExecutionHarness`] runs a single bounded conversion, and
//! the [`ClassificationLedger`] records what worked.

pub mod candidates;
pub mod config;
pub mod discovery;
pub mod harness;
pub mod ledger;
pub mod prober;

pub use candidates::{candidates_for, fallback_candidates};
pub use config::{ConfigError, HarnessConfig, SandboxSettings};
pub use discovery::ConverterDiscovery;
pub use harness::{
    DEFAULT_PROBE_DEADLINE, DEFAULT_PROBE_TEXT, ExecutionHarness, convert_cell, guarded_convert,
};
pub use ledger::{
    ClassificationLedger, EXHAUSTED_REASON, LedgerSnapshot, TIMEOUT_REASON, WorkingConverter,
    WorkingSummary, testing_failed_reason,
};
pub use prober::{InstantiationProber, ProbeAttempt};

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
