use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum, ValueHint};
use nedeval_core::{
    metrics::MetricRegistry,
    workspace::{Configuration, Workspace},
    Batch, MetricValues,
};
use owo_colors::OwoColorize;
use prettytable::{row, Table};
use serde::Deserialize;

use crate::command::Command;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Args)]
pub(crate) struct EvaluateArgs {
    /// JSON lines file, one {"outputs": {...}, "inputs": {...}} object per batch
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    data: String,

    /// Metric configuration (JSON, or YAML with a .yaml/.yml extension).
    /// Defaults to the ned metric.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<String>,

    #[arg(long)]
    #[arg(default_value = "json")]
    format: OutputFormat,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchRecord {
    outputs: Batch,
    inputs: Batch,
}

fn load_workspace(config: Option<&str>, registry: &MetricRegistry) -> Result<Workspace> {
    let Some(path) = config else {
        return Ok(Workspace::create_from_configuration(
            &Configuration::default(),
            registry,
        )?);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {path}"))?;
    let is_yaml = matches!(
        Path::new(path).extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let workspace = if is_yaml {
        Workspace::create_from_yaml(&contents, registry)
    } else {
        Workspace::create_from_json(&contents, registry)
    };
    workspace.with_context(|| format!("Failed to parse configuration file {path}"))
}

fn print_values(values: &MetricValues, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(values)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_titles(row!["Metric", "Value"]);
            for (name, value) in values {
                table.add_row(row![name, format!("{value:.6}")]);
            }
            table.printstd();
        }
    }
    Ok(())
}

pub(crate) struct EvaluateCommand;

impl Command for EvaluateCommand {
    type Args = EvaluateArgs;
    fn execute(args: &EvaluateArgs, quiet: bool) -> Result<()> {
        let registry = MetricRegistry::with_builtin_metrics();
        let mut workspace = load_workspace(args.config.as_deref(), &registry)?;

        let file = File::open(&args.data)
            .with_context(|| format!("Failed to open data file {}", args.data))?;
        if !quiet {
            eprintln!("Reading data file: {}", &args.data);
            eprintln!("Using metrics: {}", workspace.metric_names().join(", "));
        }

        let mut batches = 0;
        for (index, line) in io::BufReader::new(file).lines().enumerate() {
            let line_number = index + 1;
            let line = line.with_context(|| format!("Failed to read line {line_number}"))?;
            if line.trim().is_empty() {
                continue;
            }

            let record: BatchRecord = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse batch on line {line_number}"))?;
            workspace
                .add_batch(&record.outputs, &record.inputs)
                .with_context(|| format!("Failed to add batch on line {line_number}"))?;
            batches += 1;
        }
        log::debug!("Read {batches} batches from {}", args.data);

        let values = workspace.evaluate().context("Failed to evaluate metrics")?;
        if !quiet {
            eprintln!("{} {batches} batches", "Evaluated".green());
        }
        print_values(&values, args.format)
    }
}
