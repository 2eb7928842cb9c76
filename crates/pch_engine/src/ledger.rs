use indexmap::IndexMap;
use pch_domain::{CapabilitySet, Classification, PluginSource};
use pch_plugins::Converter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub const EXHAUSTED_REASON: &str = "Could not instantiate with any known parameters";
pub const TIMEOUT_REASON: &str = "Conversion test timeout (likely interactive converter)";

pub fn testing_failed_reason(kind: &str, message: &str) -> String {
    format!("Testing failed: {}: {}", kind, message)
}

/// A converter that passed probing.
#[derive(Debug, Clone)]
pub struct WorkingConverter {
    pub name: String,
    pub source: PluginSource,
    pub converter: Arc<dyn Converter>,
    pub capabilities: CapabilitySet,
    /// Probe output; `None` when execution was skipped.
    pub probe_output: Option<String>,
}

impl WorkingConverter {
    pub fn is_text_to_text(&self) -> bool {
        self.capabilities.is_text_to_text()
    }
}

/// Working and failed converters, each name in exactly one of the two, in
/// the order they were classified.
#[derive(Debug, Default)]
pub struct ClassificationLedger {
    working: IndexMap<String, WorkingConverter>,
    failed: IndexMap<String, String>,
}

impl ClassificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_classified(&self, name: &str) -> bool {
        self.working.contains_key(name) || self.failed.contains_key(name)
    }

    /// Returns false and leaves the ledger untouched if `entry.name` was
    /// already classified.
    pub fn record_working(&mut self, entry: WorkingConverter) -> bool {
        if self.is_classified(&entry.name) {
            warn!("{} is already classified; ignoring new result", entry.name);
            return false;
        }
        self.working.insert(entry.name.clone(), entry);
        true
    }

    pub fn record_failure(&mut self, name: impl Into<String>, reason: impl Into<String>) -> bool {
        let name = name.into();
        if self.is_classified(&name) {
            warn!("{} is already classified; ignoring new result", name);
            return false;
        }
        self.failed.insert(name, reason.into());
        true
    }

    pub fn working(&self) -> impl Iterator<Item = &WorkingConverter> {
        self.working.values()
    }

    pub fn get_working(&self, name: &str) -> Option<&WorkingConverter> {
        self.working.get(name)
    }

    pub fn failed(&self) -> &IndexMap<String, String> {
        &self.failed
    }

    pub fn text_to_text(&self) -> impl Iterator<Item = &WorkingConverter> {
        self.working.values().filter(|w| w.is_text_to_text())
    }

    pub fn other_media(&self) -> impl Iterator<Item = &WorkingConverter> {
        self.working.values().filter(|w| !w.is_text_to_text())
    }

    /// Text-to-text converters in classification order, for the processors.
    pub fn text_to_text_converters(&self) -> Vec<Arc<dyn Converter>> {
        self.text_to_text().map(|w| Arc::clone(&w.converter)).collect()
    }

    pub fn text_to_text_count(&self) -> usize {
        self.text_to_text().count()
    }

    pub fn working_count(&self) -> usize {
        self.working.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Sorted names of working text-to-text converters.
    pub fn sorted_text_to_text_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.text_to_text().map(|w| w.name.clone()).collect();
        names.sort();
        names
    }

    /// Up to `limit` failures sorted by converter name.
    pub fn failure_details(&self, limit: usize) -> Vec<(&str, &str)> {
        let mut details: Vec<(&str, &str)> = self
            .failed
            .iter()
            .map(|(n, r)| (n.as_str(), r.as_str()))
            .collect();
        details.sort_by(|a, b| a.0.cmp(b.0));
        details.truncate(limit);
        details
    }

    pub fn classification(&self, name: &str) -> Option<Classification> {
        if let Some(w) = self.working.get(name) {
            return Some(if w.is_text_to_text() {
                Classification::TextToText
            } else {
                Classification::OtherMedia {
                    capabilities: w.capabilities.clone(),
                }
            });
        }
        self.failed.get(name).map(|reason| Classification::Failed {
            reason: reason.clone(),
        })
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            working: self
                .working
                .values()
                .map(|w| WorkingSummary {
                    name: w.name.clone(),
                    source: w.source.clone(),
                    capabilities: w.capabilities.clone(),
                    text_to_text: w.is_text_to_text(),
                })
                .collect(),
            failed: self.failed.clone(),
            text_to_text: self.text_to_text().map(|w| w.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSummary {
    pub name: String,
    pub source: PluginSource,
    pub capabilities: CapabilitySet,
    pub text_to_text: bool,
}

/// Serializable view of a ledger without the converter instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub working: Vec<WorkingSummary>,
    pub failed: IndexMap<String, String>,
    pub text_to_text: Vec<String>,
}
