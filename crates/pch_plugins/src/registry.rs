use crate::builtin::builtin_factories;
use crate::error::PluginError;
use crate::factory::ConverterFactory;
use crate::lua_plugin::LuaModule;
use crate::sandbox::SandboxConfig;
use crate::wasm_plugin::WasmModule;
use indexmap::IndexMap;
use pch_domain::PluginSource;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const LUA_SUFFIX: &str = "_converter.lua";
const WASM_SUFFIX: &str = "_converter.wasm";

/// One discovered converter type.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub source: PluginSource,
    pub factory: Arc<dyn ConverterFactory>,
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Result of one registry scan.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Converters in scan order: built-ins first, then each directory.
    pub descriptors: Vec<PluginDescriptor>,
    /// Module name (file stem) to `Import failed: ...` reason.
    pub load_failures: IndexMap<String, String>,
}

impl Discovery {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Explicit list of converter factories plus directories of script and
/// WASM modules to scan.
pub struct ConverterRegistry {
    factories: Vec<(Arc<dyn ConverterFactory>, PluginSource)>,
    directories: Vec<PathBuf>,
    config: SandboxConfig,
}

impl ConverterRegistry {
    /// Empty registry with default sandbox limits
    pub fn new() -> Self {
        Self::with_config(SandboxConfig::default())
    }

    pub fn with_config(config: SandboxConfig) -> Self {
        Self {
            factories: Vec::new(),
            directories: Vec::new(),
            config,
        }
    }

    /// Registry pre-populated with the built-in converters
    #[must_use]
    pub fn with_builtins(mut self) -> Self {
        for factory in builtin_factories() {
            self.factories.push((factory, PluginSource::Builtin));
        }
        self
    }

    pub fn register(&mut self, factory: Arc<dyn ConverterFactory>) {
        self.factories.push((factory, PluginSource::Builtin));
    }

    pub fn add_plugin_directory<P: AsRef<Path>>(&mut self, dir: P) {
        self.directories.push(dir.as_ref().to_path_buf());
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    /// Scan everything registered. Load failures are recorded, never fatal.
    pub fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen = HashSet::new();

        for (factory, source) in &self.factories {
            admit(&mut discovery, &mut seen, Arc::clone(factory), source.clone());
        }

        for dir in &self.directories {
            self.scan_directory(dir, &mut discovery, &mut seen);
        }

        info!(
            "Discovered {} converters ({} modules failed to load)",
            discovery.descriptors.len(),
            discovery.load_failures.len()
        );
        discovery
    }

    fn scan_directory(&self, dir: &Path, discovery: &mut Discovery, seen: &mut HashSet<String>) {
        if !dir.is_dir() {
            warn!("Plugin directory does not exist: {}", dir.display());
            return;
        }

        let mut paths: Vec<PathBuf> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect(),
            Err(e) => {
                warn!("Failed to read plugin directory {}: {}", dir.display(), e);
                return;
            }
        };
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            if stem.starts_with('_') {
                debug!("Skipping private module: {}", path.display());
                continue;
            }

            let loaded_module: Result<(Arc<dyn ConverterFactory>, PluginSource), PluginError> =
                if file_name.ends_with(LUA_SUFFIX) {
                    LuaModule::from_file(&path, self.config.clone())
                        .map(|m| (Arc::new(m) as Arc<dyn ConverterFactory>, PluginSource::Script(path.clone())))
                } else if file_name.ends_with(WASM_SUFFIX) {
                    WasmModule::from_file(&path, self.config.clone())
                        .map(|m| (Arc::new(m) as Arc<dyn ConverterFactory>, PluginSource::Wasm(path.clone())))
                } else {
                    debug!("Skipping non-converter file: {}", path.display());
                    continue;
                };

            match loaded_module {
                Ok((factory, source)) => {
                    if admit(discovery, seen, factory, source) {
                        loaded += 1;
                    }
                }
                Err(e) => {
                    warn!("Failed to load converter module {}: {}", path.display(), e);
                    discovery
                        .load_failures
                        .entry(stem)
                        .or_insert_with(|| format!("Import failed: {}: {}", e.kind_name(), e));
                }
            }
        }

        info!("Loaded {} converter modules from {}", loaded, dir.display());
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn admit(
    discovery: &mut Discovery,
    seen: &mut HashSet<String>,
    factory: Arc<dyn ConverterFactory>,
    source: PluginSource,
) -> bool {
    let name = factory.name().to_string();
    if !is_converter_name(&name) {
        debug!("Skipping {}: not a converter name", name);
        return false;
    }
    if !seen.insert(name.clone()) {
        warn!("Duplicate converter {} from {} ignored", name, source);
        return false;
    }
    discovery.descriptors.push(PluginDescriptor {
        name,
        source,
        factory,
    });
    true
}

/// Converter names end in `Converter` and are not private.
pub fn is_converter_name(name: &str) -> bool {
    name.ends_with("Converter") && !name.starts_with('_')
}

/// `shout_converter` becomes `ShoutConverter`.
pub fn converter_name_from_stem(stem: &str) -> String {
    stem.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
