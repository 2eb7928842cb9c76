//! # PCH Plugins
//!
//! Converter plugin contract for the prompt converter harness: the
//! [`Converter`] and [`ConverterFactory`] traits, the [`ShimResolver`] handed
//! to every factory, and the [`ConverterRegistry`] that collects built-in
//! converters plus Lua and WebAssembly modules from plugin directories.
//!
//! ## Example: discovering converters
//!
//! ```rust,no_run
//! use pch_plugins::ConverterRegistry;
//!
//! let mut registry = ConverterRegistry::new().with_builtins();
//! registry.add_plugin_directory("./plugins");
//!
//! let discovery = registry.discover();
//! for descriptor in &discovery.descriptors {
//!     println!("{} ({})", descriptor.name, descriptor.source);
//! }
//! ```
//!
//! ## Example: a Lua converter
//!
//! ```lua
//! -- shout_converter.lua
//! function convert(text, input_type)
//!     return string.upper(text) .. "!"
//! end
//! ```
//!
//! Files must be named `*_converter.lua` or `*_converter.wasm`. Scripts run
//! without `os`, `io`, `debug` or `package`, under an instruction budget and
//! a wall-clock watchdog; WASM modules run with fuel metering.

pub mod builtin;
pub mod converter;
pub mod error;
pub mod factory;
pub mod lua_plugin;
pub mod registry;
pub mod sandbox;
pub mod shim;
pub mod wasm_plugin;

pub use converter::{Converter, ConverterBackend, ensure_input};
pub use error::{PluginError, Result};
pub use factory::{ConstructFn, ConverterFactory, ConverterFamily, FnFactory};
pub use lua_plugin::{LuaConverter, LuaModule};
pub use registry::{ConverterRegistry, Discovery, PluginDescriptor};
pub use sandbox::SandboxConfig;
pub use shim::{
    ChatTarget, ConverterIdentifier, DefaultShim, PlaceholderChatTarget, SeedTemplate,
    ShimResolver, WordSelectionStrategy,
};
pub use wasm_plugin::{WasmConverter, WasmModule};
