use pch_engine::HarnessConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for batch and single-prompt runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Deadline for each converter call on each row. Converters that need
    /// human input wait without one.
    pub cell_deadline: Duration,

    /// Process only the first N rows (None or 0 = all)
    pub max_rows: Option<usize>,

    /// Log progress every N rows
    pub log_every_n: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cell_deadline: Duration::from_secs(30),
            max_rows: None,
            log_every_n: 10,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell deadline taken from the harness settings
    pub fn from_harness(config: &HarnessConfig) -> Self {
        Self {
            cell_deadline: config.cell_deadline(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cell_deadline(mut self, deadline: Duration) -> Self {
        self.cell_deadline = deadline;
        self
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Set log interval; zero disables progress lines
    #[must_use]
    pub fn with_log_every_n(mut self, n: usize) -> Self {
        self.log_every_n = n;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.cell_deadline, Duration::from_secs(30));
        assert_eq!(config.max_rows, None);
        assert_eq!(config.log_every_n, 10);
    }

    #[test]
    fn test_from_harness_uses_cell_timeout() {
        let harness = HarnessConfig::default().with_cell_timeout(2.5);
        let config = BatchConfig::from_harness(&harness).with_max_rows(Some(3));
        assert_eq!(config.cell_deadline, Duration::from_millis(2500));
        assert_eq!(config.max_rows, Some(3));
    }
}
