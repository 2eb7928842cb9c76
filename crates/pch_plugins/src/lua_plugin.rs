use crate::converter::{Converter, ConverterBackend, ensure_input};
use crate::error::{PluginError, Result};
use crate::factory::{ConverterFactory, ConverterFamily};
use crate::registry::converter_name_from_stem;
use crate::sandbox::SandboxConfig;
use crate::shim::ShimResolver;
use async_trait::async_trait;
use mlua::{Lua, Value};
use pch_domain::{
    ArgValue, CapabilitySet, ConstructArgs, ConstructError, ConvertError, ConverterResult, DataKind,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// A converter module written in Lua.
///
/// ```lua
/// name = "ShoutConverter"               -- optional, derived from the file name
/// supported_input_types = { "text" }    -- optional, defaults to text
/// supported_output_types = { "text" }
///
/// function init(args)                   -- optional; without it only {} is accepted
///     if args.suffix == nil then error("suffix is required") end
///     suffix = args.suffix
/// end
///
/// function convert(text, input_type)    -- required
///     return string.upper(text) .. suffix
/// end
/// ```
///
/// The script is checked once at load; every construction attempt runs it
/// in a fresh VM so a rejected `init` leaves nothing behind.
pub struct LuaModule {
    name: String,
    module_name: String,
    path: Option<PathBuf>,
    source: Arc<str>,
    capabilities: CapabilitySet,
    requires_human_input: bool,
    config: SandboxConfig,
}

impl LuaModule {
    /// Load a Lua converter module from a file path
    pub fn from_file<P: AsRef<Path>>(path: P, config: SandboxConfig) -> Result<Self> {
        let path = path.as_ref();
        let script = std::fs::read_to_string(path).map_err(|e| {
            PluginError::LoadFailed(format!("Failed to read Lua file {}: {}", path.display(), e))
        })?;

        let module_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut module = Self::from_string(&module_name, &script, config)?;
        module.path = Some(path.to_path_buf());
        Ok(module)
    }

    /// Load a Lua converter module from source
    pub fn from_string(module_name: &str, script: &str, config: SandboxConfig) -> Result<Self> {
        let lua = new_vm(module_name, script, &config)?;
        let globals = lua.globals();

        if !matches!(globals.get::<Value>("convert")?, Value::Function(_)) {
            return Err(PluginError::LoadFailed(format!(
                "{}: convert() function not found",
                module_name
            )));
        }

        let name = globals
            .get::<Option<String>>("name")?
            .unwrap_or_else(|| converter_name_from_stem(module_name));
        let inputs = read_kinds(&lua, "supported_input_types")?;
        let outputs = read_kinds(&lua, "supported_output_types")?;
        let requires_human_input = globals
            .get::<Option<bool>>("requires_human_input")?
            .unwrap_or(false);

        debug!("Loaded Lua module {} declaring {}", module_name, name);

        Ok(Self {
            name,
            module_name: module_name.to_string(),
            path: None,
            source: Arc::from(script),
            capabilities: CapabilitySet::new(inputs, outputs),
            requires_human_input,
            config,
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

impl ConverterFactory for LuaModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn family(&self) -> ConverterFamily {
        ConverterFamily::Legacy
    }

    fn construct(
        &self,
        args: &ConstructArgs,
        _shim: &dyn ShimResolver,
    ) -> std::result::Result<Box<dyn Converter>, ConstructError> {
        let lua = new_vm(&self.module_name, &self.source, &self.config)
            .map_err(|e| ConstructError::Fatal(e.to_string()))?;

        let init = lua
            .globals()
            .get::<Option<mlua::Function>>("init")
            .map_err(|e| ConstructError::Fatal(lua_message(&e)))?;

        match init {
            Some(init) => {
                let table = args_table(&lua, args).map_err(|e| ConstructError::Fatal(lua_message(&e)))?;
                init.call::<()>(table)
                    .map_err(|e| ConstructError::from_legacy_message(lua_message(&e)))?;
            }
            None if !args.is_empty() => {
                return Err(ConstructError::ShapeMismatch(format!(
                    "{}() takes no arguments",
                    self.name
                )));
            }
            None => {}
        }

        Ok(Box::new(LuaConverter {
            runtime: Arc::new(LuaRuntime {
                name: self.name.clone(),
                lua,
                capabilities: self.capabilities.clone(),
                requires_human_input: self.requires_human_input,
                config: self.config.clone(),
                instruction_counter: Arc::new(AtomicU64::new(0)),
            }),
        }))
    }
}

/// A constructed Lua converter. Calls run on the blocking pool.
pub struct LuaConverter {
    runtime: Arc<LuaRuntime>,
}

struct LuaRuntime {
    name: String,
    lua: Lua,
    capabilities: CapabilitySet,
    requires_human_input: bool,
    config: SandboxConfig,
    instruction_counter: Arc<AtomicU64>,
}

impl LuaRuntime {
    fn convert(&self, input: &str, input_kind: DataKind) -> Result<ConverterResult> {
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::new(AtomicBool::new(false));
        let cancel_flag_thread = cancel_flag.clone();
        let done_flag_thread = done_flag.clone();
        let timeout = self.config.timeout;

        // Watchdog sets the cancel flag; the instruction hook checks it
        std::thread::spawn(move || {
            let check_interval = Duration::from_millis(50);
            let start = Instant::now();
            loop {
                std::thread::sleep(check_interval);
                if done_flag_thread.load(Ordering::Relaxed) {
                    break;
                }
                if start.elapsed() >= timeout {
                    cancel_flag_thread.store(true, Ordering::Relaxed);
                    break;
                }
            }
        });

        let result = self.execute_convert(input, input_kind, cancel_flag.clone());
        done_flag.store(true, Ordering::Relaxed);

        if cancel_flag.load(Ordering::Relaxed) && result.is_err() {
            return Err(PluginError::Timeout(timeout.as_secs()));
        }
        result
    }

    fn execute_convert(
        &self,
        input: &str,
        input_kind: DataKind,
        cancel_flag: Arc<AtomicBool>,
    ) -> Result<ConverterResult> {
        self.instruction_counter.store(0, Ordering::Relaxed);

        let counter = self.instruction_counter.clone();
        let limit = self.config.instruction_limit;
        self.lua.set_hook(
            mlua::HookTriggers {
                every_nth_instruction: Some(1000),
                ..Default::default()
            },
            move |_lua, _debug| {
                if cancel_flag.load(Ordering::Relaxed) {
                    return Err(mlua::Error::RuntimeError(
                        "Execution cancelled due to timeout".to_string(),
                    ));
                }

                if let Some(limit) = limit {
                    let count = counter.fetch_add(1000, Ordering::Relaxed);
                    if count > limit {
                        return Err(mlua::Error::RuntimeError(
                            "Instruction limit exceeded".to_string(),
                        ));
                    }
                }
                Ok(mlua::VmState::Continue)
            },
        );

        let outcome = self
            .lua
            .globals()
            .get::<mlua::Function>("convert")
            .and_then(|convert| convert.call::<Value>((input.to_string(), input_kind.as_str())));

        self.lua.remove_hook();

        let value = outcome.map_err(|e| {
            PluginError::ExecutionFailed(format!("Lua execution error: {}", lua_message(&e)))
        })?;
        self.to_result(value)
    }

    fn to_result(&self, value: Value) -> Result<ConverterResult> {
        let default_kind = self
            .capabilities
            .outputs
            .first()
            .copied()
            .unwrap_or(DataKind::Text);

        match value {
            Value::String(s) => Ok(ConverterResult::new(s.to_string_lossy(), default_kind)),
            Value::Table(t) => {
                let text: String = t.get("output_text").map_err(|_| {
                    PluginError::InvalidReturn("table result needs a string output_text".to_string())
                })?;
                let kind = match t.get::<Option<String>>("output_type")? {
                    Some(k) => k
                        .parse()
                        .map_err(|e| PluginError::InvalidReturn(format!("{}", e)))?,
                    None => default_kind,
                };
                Ok(ConverterResult::new(text, kind))
            }
            other => Err(PluginError::InvalidReturn(format!(
                "convert() returned {} instead of a string",
                other.type_name()
            ))),
        }
    }
}

#[async_trait]
impl Converter for LuaConverter {
    fn name(&self) -> &str {
        &self.runtime.name
    }

    fn capabilities(&self) -> CapabilitySet {
        self.runtime.capabilities.clone()
    }

    async fn convert_async(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> std::result::Result<ConverterResult, ConvertError> {
        ensure_input(&self.runtime.capabilities, input_kind)?;
        let runtime = Arc::clone(&self.runtime);
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || runtime.convert(&prompt, input_kind))
            .await
            .map_err(|e| ConvertError::Panicked(e.to_string()))?
            .map_err(ConvertError::from)
    }

    fn convert(
        &self,
        prompt: &str,
        input_kind: DataKind,
    ) -> std::result::Result<ConverterResult, ConvertError> {
        ensure_input(&self.runtime.capabilities, input_kind)?;
        self.runtime.convert(prompt, input_kind).map_err(ConvertError::from)
    }

    fn requires_human_input(&self) -> bool {
        self.runtime.requires_human_input
    }

    fn backend(&self) -> ConverterBackend {
        ConverterBackend::Lua
    }
}

/// Fresh sandboxed VM with the module script executed.
fn new_vm(module_name: &str, script: &str, config: &SandboxConfig) -> Result<Lua> {
    let lua = Lua::new();

    apply_sandbox(&lua)?;
    let _ = lua.set_memory_limit(config.memory_limit);
    add_helpers(&lua)?;

    lua.load(script)
        .set_name(module_name)
        .exec()
        .map_err(|e| PluginError::LoadFailed(format!("Failed to load Lua script: {}", lua_message(&e))))?;

    Ok(lua)
}

/// Remove dangerous Lua standard libraries
fn apply_sandbox(lua: &Lua) -> Result<()> {
    let globals = lua.globals();

    for module in &[
        "os", "io", "debug", "package", "dofile", "loadfile", "require", "load", "loadstring",
        "collectgarbage", "rawget", "rawset", "rawequal", "rawlen", "getmetatable",
        "setmetatable",
    ] {
        globals.set(*module, Value::Nil)?;
    }

    Ok(())
}

/// `pch` helper table available to every script
fn add_helpers(lua: &Lua) -> Result<()> {
    static WORD_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let helpers = lua.create_table()?;

    // pch.words(text) - split on whitespace
    let words_fn = lua.create_function(|lua, text: String| {
        let words = WORD_REGEX.get_or_init(|| regex::Regex::new(r"\S+").expect("word regex is valid"));
        let table = lua.create_table()?;
        for (i, m) in words.find_iter(&text).enumerate() {
            table.set(i + 1, m.as_str())?;
        }
        Ok(table)
    })?;
    helpers.set("words", words_fn)?;

    // pch.is_blank(text)
    let blank_fn = lua.create_function(|_, text: String| Ok(text.trim().is_empty()))?;
    helpers.set("is_blank", blank_fn)?;

    // pch.regex_replace(text, pattern, replacement)
    let replace_fn = lua.create_function(
        |_, (text, pattern, replacement): (String, String, String)| {
            let re = regex::Regex::new(&pattern)
                .map_err(|e| mlua::Error::RuntimeError(format!("invalid regex: {}", e)))?;
            Ok(re.replace_all(&text, replacement.as_str()).into_owned())
        },
    )?;
    helpers.set("regex_replace", replace_fn)?;

    lua.globals().set("pch", helpers)?;
    Ok(())
}

fn read_kinds(lua: &Lua, key: &str) -> Result<Vec<DataKind>> {
    match lua.globals().get::<Option<Vec<String>>>(key)? {
        None => Ok(vec![DataKind::Text]),
        Some(names) => names
            .iter()
            .map(|n| {
                n.parse::<DataKind>()
                    .map_err(|e| PluginError::LoadFailed(format!("{}: {}", key, e)))
            })
            .collect(),
    }
}

fn args_table(lua: &Lua, args: &ConstructArgs) -> mlua::Result<mlua::Table> {
    let table = lua.create_table()?;
    for (key, value) in args.iter() {
        let value = match value {
            ArgValue::Null => Value::NULL,
            ArgValue::Bool(b) => Value::Boolean(*b),
            ArgValue::Int(i) => Value::Integer(*i),
            ArgValue::Str(s) => Value::String(lua.create_string(s)?),
        };
        table.set(key, value)?;
    }
    Ok(table)
}

/// Error text without the `runtime error:` prefix or the traceback.
fn lua_message(e: &mlua::Error) -> String {
    let text = match e {
        mlua::Error::CallbackError { cause, .. } => return lua_message(cause),
        other => other.to_string(),
    };
    let text = text.split("\nstack traceback").next().unwrap_or_default();
    text.strip_prefix("runtime error: ").unwrap_or(text).to_string()
}
