use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pch_batch::{BatchConfig, BatchProcessor, SinglePromptProcessor};
use pch_domain::{ConstructArgs, Table};
use pch_plugins::builtin::builtin_factories;
use pch_plugins::{Converter, ConverterFactory, DefaultShim, LuaModule, SandboxConfig};
use std::hint::black_box;
use std::sync::Arc;

const NO_ARG_BUILTINS: [&str; 6] = [
    "UpperCaseConverter",
    "FlipConverter",
    "ROT13Converter",
    "Base64Converter",
    "UrlConverter",
    "LeetspeakConverter",
];

fn builtins() -> Vec<Arc<dyn Converter>> {
    let shim = DefaultShim::default();
    builtin_factories()
        .into_iter()
        .filter(|f| NO_ARG_BUILTINS.contains(&f.name()))
        .map(|f| Arc::from(f.construct(&ConstructArgs::new(), &shim).unwrap()))
        .collect()
}

fn prompts(rows: usize) -> Table {
    Table::from_column(
        "prompt",
        (0..rows).map(|i| format!("Prompt number {} asks the model something, politely.", i)),
    )
}

fn bench_batch_rows(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("batch_rows");

    for rows in [10, 100, 1000] {
        let table = prompts(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| {
                let mut processor = BatchProcessor::new(builtins(), BatchConfig::default());
                rt.block_on(processor.run(black_box(table.clone()), "prompt")).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_lua_converter(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let module = LuaModule::from_string(
        "ShoutConverter",
        "function convert(text) return string.upper(text) .. '!' end",
        SandboxConfig::default(),
    )
    .unwrap();
    let converter: Arc<dyn Converter> =
        Arc::from(module.construct(&ConstructArgs::new(), &DefaultShim::default()).unwrap());
    let table = prompts(100);

    c.bench_function("lua_batch_100_rows", |b| {
        b.iter(|| {
            let mut processor = BatchProcessor::new(vec![Arc::clone(&converter)], BatchConfig::default());
            rt.block_on(processor.run(black_box(table.clone()), "prompt")).unwrap()
        })
    });
}

fn bench_single_prompt(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let converters = builtins();

    c.bench_function("single_prompt_all_builtins", |b| {
        b.iter(|| {
            let mut processor = SinglePromptProcessor::new(converters.clone(), BatchConfig::default());
            rt.block_on(processor.run(black_box("How do I bake bread?")))
        })
    });
}

criterion_group!(benches, bench_batch_rows, bench_lua_converter, bench_single_prompt);
criterion_main!(benches);
