//! Persistence for the harness: prompt tables in CSV, TSV or JSON, and the
//! TOML configuration file.

pub mod config_store;
pub mod error;
pub mod table_io;

pub use config_store::{DEFAULT_CONFIG_FILE, TomlConfigStore};
pub use error::StorageError;
pub use table_io::{TableFormat, read_table, timestamped_output_path, write_table};
