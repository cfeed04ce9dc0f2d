mod metric;
mod metric_factory;
mod metric_registry;
mod ned;

pub use metric::*;
pub use metric_factory::*;
pub use metric_registry::*;
pub use ned::*;
