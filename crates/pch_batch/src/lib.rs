pub mod config;
pub mod report;
pub mod runner;

pub use config::BatchConfig;
pub use report::{BatchReport, RowAction};
pub use runner::{BatchError, BatchOutput, BatchProcessor, ProgressFn, SinglePromptProcessor};
