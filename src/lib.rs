//! Prompt converter harness.
//!
//! Discovers converter plugins (built-in, Lua and WASM), probes which ones
//! can be constructed and actually run, and fans prompts out to the working
//! text-to-text converters. The pieces live in their own crates and are
//! re-exported here.

pub use pch_batch as batch;
pub use pch_domain as domain;
pub use pch_engine as engine;
pub use pch_plugins as plugins;
pub use pch_storage as storage;
pub use pch_telemetry as telemetry;
