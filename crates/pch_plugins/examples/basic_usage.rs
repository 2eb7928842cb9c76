//! Build a few converters by hand and run them on one prompt
//!
//! Run with: cargo run -p pch_plugins --example basic_usage

use pch_domain::{ConstructArgs, DataKind};
use pch_plugins::{ConverterFactory, ConverterRegistry, DefaultShim, LuaModule, SandboxConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PCH Plugins Basic Usage ===\n");

    let shim = DefaultShim::default();
    let discovery = ConverterRegistry::new().with_builtins().discover();
    println!("1. {} built-in converters registered", discovery.len());

    println!("\n2. Running converters that build without arguments:");
    for descriptor in &discovery.descriptors {
        let Ok(converter) = descriptor.factory.construct(&ConstructArgs::new(), &shim) else {
            println!("   {:<26} needs arguments", descriptor.name);
            continue;
        };
        if converter.requires_human_input() {
            println!("   {:<26} interactive, skipped", descriptor.name);
            continue;
        }
        match converter.convert_async("hello world", DataKind::Text).await {
            Ok(result) => println!("   {:<26} {}", descriptor.name, result.output_text),
            Err(e) => println!("   {:<26} error: {}", descriptor.name, e),
        }
    }

    println!("\n3. Inline Lua converter with construction arguments:");
    let script = r#"
        function init(args)
            if args.text_to_add == nil then error("text_to_add is required") end
            suffix = args.text_to_add
        end

        function convert(text)
            return text .. " " .. suffix
        end
    "#;
    let module = LuaModule::from_string("suffix_converter", script, SandboxConfig::default())?;
    let converter = module
        .construct(&ConstructArgs::new().with("text_to_add", "please"), &shim)
        .map_err(|e| e.to_string())?;
    let result = converter.convert_async("hello world", DataKind::Text).await?;
    println!("   {} -> {}", module.name(), result.output_text);

    Ok(())
}
