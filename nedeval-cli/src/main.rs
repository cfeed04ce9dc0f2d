use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use crate::command::Command;

mod command;
mod config;
mod evaluate;
mod gen_completions;
mod gen_schema;
mod list_metrics;

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Silence all output
    #[arg(long, default_value = "false")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate predictions against labels from a JSON lines file
    Evaluate(evaluate::EvaluateArgs),
    /// Check or generate a config
    Config(config::ConfigArgs),
    /// List available metrics
    ListMetrics(list_metrics::ListMetricsArgs),
    /// Generate shell completions
    GenCompletions(gen_completions::GenCompletionsArgs),
    /// Generate JSON schema for configuration
    GenSchema(gen_schema::GenSchemaArgs),
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let result = match &cli.command {
        Commands::Evaluate(args) => evaluate::EvaluateCommand::execute(args, cli.quiet),
        Commands::Config(args) => config::ConfigCommand::execute(args, cli.quiet),
        Commands::ListMetrics(args) => list_metrics::ListMetricsCommand::execute(args, cli.quiet),
        Commands::GenCompletions(args) => {
            gen_completions::GenCompletionsCommand::execute(args, cli.quiet)
        }
        Commands::GenSchema(args) => gen_schema::GenSchemaCommand::execute(args, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}
