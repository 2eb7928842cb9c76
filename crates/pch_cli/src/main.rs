use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "pch")]
#[command(
    version,
    about = "Prompt converter harness - discover converter plugins and run them over prompts",
    long_about = None
)]
pub struct Cli {
    /// CSV, TSV or JSON file with a column of prompts
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Output file (.csv, .tsv or .json; .xlsx is written as .csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Convert a single prompt instead of a file
    #[arg(short, long, conflicts_with = "input_file")]
    prompt: Option<String>,

    /// Column holding the prompts [default: prompt]
    #[arg(short = 'c', long)]
    prompt_column: Option<String>,

    /// Process only the first N rows (0 processes all)
    #[arg(short, long)]
    max_rows: Option<usize>,

    /// Debug logging and failure details
    #[arg(short, long)]
    verbose: bool,

    /// Directory of *_converter.lua / *_converter.wasm plugins (repeatable)
    #[arg(long = "plugin-dir", value_name = "DIR")]
    plugin_dirs: Vec<PathBuf>,

    /// Settings file (default: ./pch.toml when present)
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Deadline for each probe conversion, in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<f64>,

    /// Write the discovery and processing event log here (.json, .csv or .txt)
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.prompt.is_none() && cli.input_file.is_none() {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::FAILURE);
    }

    pch_telemetry::init_telemetry(&pch_telemetry::TelemetryConfig::for_verbosity(cli.verbose))?;

    let config = commands::settings::load(&cli)?;
    let mut events = Vec::new();

    let ledger = commands::discover::run(&config, &mut events).await;
    commands::discover::print_summary(&ledger, cli.verbose, config.max_failures_shown);

    if ledger.text_to_text_count() == 0 {
        eprintln!(
            "No working text-to-text converters found. Re-run with --verbose to see why each one failed."
        );
        commands::export::write_report(cli.report.as_deref(), &events)?;
        return Ok(ExitCode::FAILURE);
    }

    if let Some(prompt) = &cli.prompt {
        commands::prompt::run(&ledger, &config, prompt, cli.output.as_deref(), &mut events).await?;
    } else if let Some(input) = &cli.input_file {
        commands::batch::run(
            &ledger,
            &config,
            input,
            cli.output.as_deref(),
            cli.max_rows,
            &mut events,
        )
        .await?;
    }

    commands::export::write_report(cli.report.as_deref(), &events)?;
    Ok(ExitCode::SUCCESS)
}
