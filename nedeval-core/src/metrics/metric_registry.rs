use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    error::{Error, Result},
    metrics::{JsonMetricConfig, Metric, MetricFactory, NedMetricFactory},
};

/// Maps metric names to the factories that build them. Populated explicitly,
/// either one factory at a time or with [`MetricRegistry::with_builtin_metrics`].
#[derive(Default)]
pub struct MetricRegistry {
    registry: BTreeMap<String, Box<dyn MetricFactory>>,
}

impl MetricRegistry {
    pub fn new() -> MetricRegistry {
        MetricRegistry::default()
    }

    pub fn with_builtin_metrics() -> MetricRegistry {
        let mut registry = MetricRegistry::new();
        registry.register_builtin_metrics();
        registry
    }

    pub fn register_builtin_metrics(&mut self) {
        let builtins: Vec<Box<dyn MetricFactory>> = vec![Box::<NedMetricFactory>::default()];
        for factory in builtins {
            // Only reachable if a caller registered a factory under a builtin name first
            if let Err(e) = self.register(factory) {
                log::warn!("Skipping builtin metric: {e}");
            }
        }
    }

    pub fn register(&mut self, factory: Box<dyn MetricFactory>) -> Result<()> {
        let typename = factory.typename();
        if self.registry.contains_key(&typename) {
            return Err(Error::DuplicateMetric(typename));
        }
        log::debug!("Registered metric {typename}");
        self.registry.insert(typename, factory);
        Ok(())
    }

    pub fn get(&self, typename: &str) -> Option<&dyn MetricFactory> {
        self.registry.get(typename).map(|x| x.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn MetricFactory> {
        self.registry.values().map(|x| x.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    pub fn create_metric(&self, config: &JsonMetricConfig) -> Result<Box<dyn Metric>> {
        match self.get(&config.typename()) {
            Some(factory) => {
                let parsed = factory.parse_config(config.json_value())?;
                factory.create(parsed.as_ref())
            }
            None => Err(Error::UnknownMetric(format!(
                "{} (available: {})",
                config.typename(),
                self.registry.keys().join(", ")
            ))),
        }
    }
}
