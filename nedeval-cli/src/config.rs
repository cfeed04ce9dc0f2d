use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use nedeval_core::{metrics::MetricRegistry, workspace::Workspace};
use serde_json::json;

use crate::command::Command;

#[derive(Args)]
pub(crate) struct ConfigCheckArgs {
    config: String,
}

#[derive(Args)]
pub(crate) struct ConfigNewArgs {
    /// Metrics to include, each with its default configuration
    #[arg(required = true)]
    metrics: Vec<String>,
}

#[derive(Subcommand)]
enum ConfigSubCommand {
    /// Check an evaluation configuration for validity.
    Check(ConfigCheckArgs),
    /// Emit a full configuration with all defaults.
    New(ConfigNewArgs),
}

#[derive(Args)]
pub(crate) struct ConfigArgs {
    #[command(subcommand)]
    subcommand: ConfigSubCommand,
}

pub(crate) struct ConfigCommand;

impl Command for ConfigCommand {
    type Args = ConfigArgs;
    fn execute(args: &ConfigArgs, _quiet: bool) -> Result<()> {
        let registry = MetricRegistry::with_builtin_metrics();
        match &args.subcommand {
            ConfigSubCommand::Check(args) => {
                let contents = std::fs::read_to_string(&args.config).with_context(|| {
                    format!("Failed to read configuration file {}", args.config)
                })?;
                let is_yaml = args.config.ends_with(".yaml") || args.config.ends_with(".yml");
                let workspace = if is_yaml {
                    Workspace::create_from_yaml(&contents, &registry)
                } else {
                    Workspace::create_from_json(&contents, &registry)
                };
                workspace.with_context(|| {
                    format!("Failed to parse configuration file {}", args.config)
                })?;
                println!("ok");
                Ok(())
            }
            ConfigSubCommand::New(args) => {
                let metrics = args
                    .metrics
                    .iter()
                    .map(|name| {
                        let factory = registry.get(name).with_context(|| {
                            format!(
                                "Metric \"{}\" does not exist. Available metrics are: {}",
                                name,
                                registry.names().join(", ")
                            )
                        })?;
                        Ok(json!({
                            "typename": name,
                            "config": factory.get_config_default()
                        }))
                    })
                    .collect::<Result<Vec<_>>>()?;

                let overall_config = json!({ "metrics": metrics });
                println!("{}", serde_json::to_string_pretty(&overall_config)?);
                Ok(())
            }
        }
    }
}
