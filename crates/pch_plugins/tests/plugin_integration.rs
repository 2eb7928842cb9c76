use pch_domain::{ConstructArgs, ConstructError, ConvertError, DataKind, PluginSource};
use pch_plugins::{
    ConverterBackend, ConverterRegistry, DefaultShim, LuaModule, SandboxConfig, ShimResolver,
};
use std::time::Duration;
use tempfile::TempDir;

const WASM_REVERSE: &str = r#"
    (module
        (memory (export "memory") 1)
        (global $heap (mut i32) (i32.const 1024))
        (func $alloc (export "alloc") (param $size i32) (result i32)
            (local $ptr i32)
            (local.set $ptr (global.get $heap))
            (global.set $heap (i32.add (global.get $heap) (local.get $size)))
            (local.get $ptr))
        (func (export "convert") (param $ptr i32) (param $len i32) (result i32)
            (local $out i32)
            (local $i i32)
            (local.set $out (call $alloc (i32.add (i32.const 4) (local.get $len))))
            (i32.store (local.get $out) (local.get $len))
            (block $done
                (loop $loop
                    (br_if $done (i32.ge_u (local.get $i) (local.get $len)))
                    (i32.store8
                        (i32.add (i32.add (local.get $out) (i32.const 4)) (local.get $i))
                        (i32.load8_u
                            (i32.sub
                                (i32.add (local.get $ptr) (local.get $len))
                                (i32.add (local.get $i) (i32.const 1)))))
                    (local.set $i (i32.add (local.get $i) (i32.const 1)))
                    (br $loop)))
            (local.get $out)))
"#;

fn write_plugins(dir: &TempDir) {
    std::fs::write(
        dir.path().join("shout_converter.lua"),
        r#"
            function convert(text, input_type)
                return string.upper(text) .. "!"
            end
        "#,
    )
    .unwrap();

    std::fs::write(
        dir.path().join("suffix_converter.lua"),
        r#"
            name = "SuffixAppendConverter"
            function init(args)
                if args.text_to_add == nil then
                    error("missing 1 required keyword-only argument: 'text_to_add'")
                end
                suffix = args.text_to_add
            end
            function convert(text)
                return text .. " " .. suffix
            end
        "#,
    )
    .unwrap();

    std::fs::write(
        dir.path().join("legacy_converter.lua"),
        "function transform(text) return text end",
    )
    .unwrap();

    std::fs::write(
        dir.path().join("mirror_converter.wasm"),
        wat::parse_str(WASM_REVERSE).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_registry_scans_lua_and_wasm_modules() {
    let dir = TempDir::new().unwrap();
    write_plugins(&dir);

    let mut registry = ConverterRegistry::new();
    registry.add_plugin_directory(dir.path());
    let discovery = registry.discover();

    // Sorted by file name
    assert_eq!(
        discovery.names(),
        vec!["MirrorConverter", "ShoutConverter", "SuffixAppendConverter"]
    );
    assert!(matches!(discovery.descriptors[0].source, PluginSource::Wasm(_)));

    let reason = &discovery.load_failures["legacy_converter"];
    assert!(reason.starts_with("Import failed: LoadFailed"), "{reason}");
    assert!(reason.contains("convert() function not found"));
}

#[test]
fn test_builtins_precede_directory_modules() {
    let dir = TempDir::new().unwrap();
    write_plugins(&dir);

    let mut registry = ConverterRegistry::new().with_builtins();
    registry.add_plugin_directory(dir.path());
    let discovery = registry.discover();

    let first_script = discovery
        .descriptors
        .iter()
        .position(|d| d.source != PluginSource::Builtin)
        .unwrap();
    assert!(discovery.descriptors[..first_script]
        .iter()
        .all(|d| d.source == PluginSource::Builtin));
    assert!(discovery.names().contains(&"ShoutConverter"));
}

#[tokio::test]
async fn test_discovered_modules_construct_and_convert() {
    let dir = TempDir::new().unwrap();
    write_plugins(&dir);

    let mut registry = ConverterRegistry::new();
    registry.add_plugin_directory(dir.path());
    let discovery = registry.discover();
    let shim = DefaultShim::new(dir.path());

    let find = |name: &str| {
        discovery
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .unwrap()
            .factory
            .clone()
    };

    let mirror = find("MirrorConverter")
        .construct(&ConstructArgs::new(), &shim)
        .unwrap();
    assert_eq!(mirror.backend(), ConverterBackend::Wasm);
    let out = mirror.convert_async("test", DataKind::Text).await.unwrap();
    assert_eq!(out.output_text, "tset");

    let suffix = find("SuffixAppendConverter");
    let err = suffix.construct(&ConstructArgs::new(), &shim).err().unwrap();
    assert!(matches!(err, ConstructError::ShapeMismatch(_)));
    let converter = suffix
        .construct(&ConstructArgs::new().with("text_to_add", "test"), &shim)
        .unwrap();
    let out = converter.convert_async("hello", DataKind::Text).await.unwrap();
    assert_eq!(out.output_text, "hello test");
}

#[tokio::test]
async fn test_lua_converter_rejects_undeclared_input_kind() {
    let module = LuaModule::from_string(
        "shout_converter",
        "function convert(text) return text end",
        SandboxConfig::default(),
    )
    .unwrap();
    let converter = pch_plugins::ConverterFactory::construct(
        &module,
        &ConstructArgs::new(),
        &DefaultShim::default() as &dyn ShimResolver,
    )
    .unwrap();
    let err = converter.convert_async("x", DataKind::Image).await.unwrap_err();
    assert_eq!(err, ConvertError::UnsupportedInput(DataKind::Image));
}

#[tokio::test]
async fn test_hanging_script_is_stopped_by_watchdog() {
    let module = LuaModule::from_string(
        "spin_converter",
        "function convert(text) while true do end end",
        SandboxConfig {
            timeout: Duration::from_millis(200),
            instruction_limit: None,
            ..Default::default()
        },
    )
    .unwrap();
    let converter = pch_plugins::ConverterFactory::construct(
        &module,
        &ConstructArgs::new(),
        &DefaultShim::default(),
    )
    .unwrap();

    let start = std::time::Instant::now();
    let err = converter.convert_async("x", DataKind::Text).await.unwrap_err();
    assert!(matches!(err, ConvertError::Timeout(_)), "{err:?}");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_sandbox_hides_io_and_require() {
    for (stem, body) in [
        ("io_converter", "io.open('/etc/passwd')"),
        ("require_converter", "require('os')"),
        ("load_converter", "load('return 1')()"),
    ] {
        let script = format!("function convert(text) {body} return text end");
        let module = LuaModule::from_string(stem, &script, SandboxConfig::default()).unwrap();
        let converter = pch_plugins::ConverterFactory::construct(
            &module,
            &ConstructArgs::new(),
            &DefaultShim::default(),
        )
        .unwrap();
        assert!(converter.convert("x", DataKind::Text).is_err(), "{stem} escaped the sandbox");
    }
}
