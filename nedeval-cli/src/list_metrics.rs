use anyhow::Result;
use clap::Args;
use nedeval_core::metrics::MetricRegistry;

use crate::command::Command;

#[derive(Args)]
pub(crate) struct ListMetricsArgs {}

pub(crate) struct ListMetricsCommand;

impl Command for ListMetricsCommand {
    type Args = ListMetricsArgs;
    fn execute(_args: &ListMetricsArgs, _quiet: bool) -> Result<()> {
        MetricRegistry::with_builtin_metrics()
            .names()
            .iter()
            .for_each(|name| println!("{name}"));
        Ok(())
    }
}
