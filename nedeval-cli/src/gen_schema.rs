use anyhow::Result;
use clap::Args;
use nedeval_core::{config_schema::ConfigSchema, metrics::MetricRegistry};

use crate::command::Command;

#[derive(Args)]
pub(crate) struct GenSchemaArgs {}

pub(crate) struct GenSchemaCommand;

impl Command for GenSchemaCommand {
    type Args = GenSchemaArgs;
    fn execute(_args: &GenSchemaArgs, _quiet: bool) -> Result<()> {
        let registry = MetricRegistry::with_builtin_metrics();
        let mut schema = ConfigSchema::new();
        registry.iter().for_each(|factory| schema.add_metric(factory));
        println!("{}", serde_json::to_string_pretty(schema.schema())?);
        Ok(())
    }
}
