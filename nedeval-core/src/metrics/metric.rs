use crate::{
    error::Result,
    types::{Batch, MetricValues},
};

/// An accumulator that ingests batches and reduces them to named scores.
pub trait Metric: Send {
    /// Checks that `add` would accept the batch, without accumulating it.
    fn validate(&self, _outputs: &Batch, _inputs: &Batch) -> Result<()> {
        Ok(())
    }
    fn add(&mut self, outputs: &Batch, inputs: &Batch) -> Result<()>;
    fn evaluate(&self) -> Result<MetricValues>;
    fn reset(&mut self);
    fn get_name(&self) -> String;
}
