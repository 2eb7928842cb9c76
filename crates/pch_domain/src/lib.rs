pub mod args;
pub mod error;
pub mod outcome;
pub mod record;
pub mod table;
pub mod types;

pub use args::{ArgValue, ConstructArgs};
pub use error::{ConstructError, ConvertError};
pub use outcome::{Classification, ProbeOutcome};
pub use record::{PromptRecord, RecordStatus, error_marker, is_error_marker, output_column};
pub use table::{Cell, Table, TableError};
pub use types::{CapabilitySet, ConverterResult, DataKind, PluginSource};
