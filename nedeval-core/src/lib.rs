pub mod config_schema;
pub mod distance;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod types;
pub mod workspace;

pub use types::*;
