use std::any::Any;

use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};

use crate::{error::Result, metrics::Metric};

// This intentionally does not derive JsonSchema
// Use gen_json_metric_config_schema instead with schema_with
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JsonMetricConfig {
    typename: String,
    #[serde(default = "empty_config")]
    config: serde_json::Value,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl JsonMetricConfig {
    pub fn new(typename: String, config: serde_json::Value) -> Self {
        JsonMetricConfig { typename, config }
    }

    /// Selects a metric with its default configuration.
    pub fn with_defaults(typename: &str) -> Self {
        JsonMetricConfig::new(typename.to_owned(), empty_config())
    }

    pub fn typename(&self) -> String {
        self.typename.to_owned()
    }

    pub fn json_value(&self) -> &serde_json::Value {
        &self.config
    }
}

pub trait MetricConfig: Any {
    fn as_any(&self) -> &dyn Any;
    fn typename(&self) -> String;
}

pub trait MetricFactory: Send + Sync {
    fn parse_config(&self, value: &serde_json::Value) -> Result<Box<dyn MetricConfig>>;
    fn create(&self, config: &dyn MetricConfig) -> Result<Box<dyn Metric>>;
    fn typename(&self) -> String;
    fn get_config_schema(&self) -> RootSchema;
    fn get_config_default(&self) -> serde_json::Value;
}

#[macro_export]
macro_rules! impl_default_factory_functions {
    ($typename: expr, $config_type: ident) => {
        fn typename(&self) -> String {
            $typename.to_owned()
        }

        fn parse_config(
            &self,
            value: &serde_json::Value,
        ) -> $crate::error::Result<Box<dyn $crate::metrics::MetricConfig>> {
            let res: $config_type = serde_json::from_value(value.clone()).map_err(|e| {
                $crate::error::Error::InvalidConfiguration(format!(
                    "Failed to parse {} config: {e}",
                    $typename
                ))
            })?;
            Ok(Box::new(res))
        }

        fn get_config_schema(&self) -> schemars::schema::RootSchema {
            schemars::schema_for!($config_type)
        }

        fn get_config_default(&self) -> serde_json::Value {
            serde_json::to_value($config_type::default()).unwrap_or(serde_json::Value::Null)
        }
    };
}
