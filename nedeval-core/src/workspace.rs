use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    keys::metric_keys,
    metrics::{JsonMetricConfig, Metric, MetricRegistry},
    types::{Batch, MetricValues},
};

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,
    #[schemars(schema_with = "crate::config_schema::gen_json_metric_configs_schema")]
    metrics: Vec<JsonMetricConfig>,
}

impl Configuration {
    pub fn new(metrics: Vec<JsonMetricConfig>) -> Configuration {
        Configuration {
            _schema: None,
            metrics,
        }
    }

    pub fn metrics(&self) -> &[JsonMetricConfig] {
        &self.metrics
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new(vec![JsonMetricConfig::with_defaults(metric_keys::NED)])
    }
}

/// An evaluation run: a set of metrics that all see the same batches.
pub struct Workspace {
    metrics: Vec<Box<dyn Metric>>,
}

impl Workspace {
    pub fn create_from_json(json: &str, registry: &MetricRegistry) -> Result<Workspace> {
        let config: Configuration = serde_json::from_str(json).map_err(|e| {
            Error::InvalidConfiguration(format!("Failed to parse configuration: {e}"))
        })?;

        Self::create_from_configuration(&config, registry)
    }

    pub fn create_from_yaml(yaml: &str, registry: &MetricRegistry) -> Result<Workspace> {
        let json_from_yaml = serde_yaml::from_str::<serde_json::Value>(yaml)
            .map_err(|e| Error::InvalidConfiguration(format!("Failed to parse yaml: {e}")))?;
        let config: Configuration = serde_json::from_value(json_from_yaml).map_err(|e| {
            Error::InvalidConfiguration(format!("Failed to parse configuration: {e}"))
        })?;

        Self::create_from_configuration(&config, registry)
    }

    pub fn create_from_configuration(
        config: &Configuration,
        registry: &MetricRegistry,
    ) -> Result<Workspace> {
        if config.metrics.is_empty() {
            return Err(Error::InvalidConfiguration(
                "At least one metric must be configured".to_owned(),
            ));
        }

        let metrics = config
            .metrics
            .iter()
            .map(|metric_config| registry.create_metric(metric_config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Workspace::with_metrics(metrics))
    }

    pub fn with_metrics(metrics: Vec<Box<dyn Metric>>) -> Workspace {
        Workspace { metrics }
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.get_name()).collect()
    }

    /// Every metric validates the batch before any of them accumulates it, so
    /// a rejected batch leaves the workspace unchanged.
    pub fn add_batch(&mut self, outputs: &Batch, inputs: &Batch) -> Result<()> {
        for metric in self.metrics.iter() {
            metric.validate(outputs, inputs)?;
        }
        for metric in self.metrics.iter_mut() {
            metric.add(outputs, inputs)?;
        }
        Ok(())
    }

    /// Merges the results of every metric. Later metrics win on key clashes.
    pub fn evaluate(&self) -> Result<MetricValues> {
        let mut values = MetricValues::new();
        for metric in self.metrics.iter() {
            values.extend(metric.evaluate()?);
        }
        Ok(values)
    }

    pub fn reset(&mut self) {
        self.metrics.iter_mut().for_each(|m| m.reset());
    }
}
