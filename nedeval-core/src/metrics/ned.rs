use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_default::DefaultFromSerde;
use serde_json::Value;

use crate::{
    distance::normalized_levenshtein,
    error::{Error, Result},
    impl_default_factory_functions,
    keys::{self, metric_keys},
    metrics::{Metric, MetricConfig, MetricFactory},
    types::{Batch, BatchValue, MetricValues, NumericArray},
};

/// What `evaluate` reports when no examples were accumulated.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EmptyPolicy {
    /// Fail with [`Error::NoDataAccumulated`].
    #[default]
    Error,
    /// Report a distance of 0.0.
    Zero,
}

#[derive(Deserialize, Serialize, JsonSchema, DefaultFromSerde, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct NedConfig {
    #[serde(default)]
    on_empty: EmptyPolicy,
}

impl NedConfig {
    pub fn new(on_empty: EmptyPolicy) -> NedConfig {
        NedConfig { on_empty }
    }

    pub fn on_empty(&self) -> EmptyPolicy {
        self.on_empty
    }
}

impl MetricConfig for NedConfig {
    fn typename(&self) -> String {
        metric_keys::NED.to_owned()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Mean normalized Levenshtein distance between predictions and labels,
/// accumulated over any number of batches.
#[derive(Debug, Default, Clone)]
pub struct NedMetric {
    predictions: Vec<Value>,
    labels: Vec<Value>,
    on_empty: EmptyPolicy,
}

impl NedMetric {
    pub fn new() -> NedMetric {
        NedMetric::default()
    }

    pub fn with_config(config: &NedConfig) -> NedMetric {
        NedMetric {
            on_empty: config.on_empty,
            ..Default::default()
        }
    }

    pub fn predictions(&self) -> &[Value] {
        &self.predictions
    }

    pub fn labels(&self) -> &[Value] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty() && self.labels.is_empty()
    }

    /// Mean distance over the accumulated pairs.
    pub fn mean_distance(&self) -> Result<f64> {
        if self.predictions.len() != self.labels.len() {
            return Err(Error::LengthMismatch {
                predictions: self.predictions.len(),
                labels: self.labels.len(),
            });
        }

        if self.predictions.is_empty() {
            return match self.on_empty {
                EmptyPolicy::Error => Err(Error::NoDataAccumulated),
                EmptyPolicy::Zero => {
                    log::warn!("No examples accumulated, reporting a distance of 0");
                    Ok(0.0)
                }
            };
        }

        let total: f64 = self
            .predictions
            .iter()
            .zip(self.labels.iter())
            .map(|(pred, label)| normalized_levenshtein(pred, label))
            .sum();
        let mean = total / self.predictions.len() as f64;
        log::debug!(
            "Evaluated {} over {} examples: {mean}",
            metric_keys::NED,
            self.predictions.len()
        );
        Ok(mean)
    }
}

fn ground_truths(inputs: &Batch) -> Result<(&'static str, &BatchValue)> {
    let label_name = if inputs.contains_key(keys::LABEL) {
        keys::LABEL
    } else {
        keys::LABELS
    };
    inputs
        .get(label_name)
        .map(|value| (label_name, value))
        .ok_or_else(|| {
            Error::MissingKey(format!(
                "inputs must contain '{}' or '{}'",
                keys::LABEL,
                keys::LABELS
            ))
        })
}

/// The first prioritized output key holding a non-null value, falling back to
/// the key the labels were read from.
fn eval_results<'a>(outputs: &'a Batch, label_name: &str) -> Result<&'a BatchValue> {
    keys::PREDICTION_KEYS
        .iter()
        .filter_map(|key| outputs.get(key))
        .find(|value| !value.is_null())
        .or_else(|| outputs.get(label_name))
        .ok_or_else(|| {
            Error::MissingKey(format!(
                "outputs must contain one of {:?} or '{label_name}'",
                keys::PREDICTION_KEYS
            ))
        })
}

/// Resolves the prediction and label containers of a batch and checks that
/// they share a supported container kind.
fn select<'a>(outputs: &'a Batch, inputs: &'a Batch) -> Result<(&'a str, Selection<'a>)> {
    let (label_name, ground_truths) = ground_truths(inputs)?;
    let eval_results = eval_results(outputs, label_name)?;

    if eval_results.kind() != ground_truths.kind() {
        return Err(Error::TypeMismatch {
            predictions: eval_results.kind(),
            labels: ground_truths.kind(),
        });
    }

    let selection = match (eval_results, ground_truths) {
        (BatchValue::Sequence(preds), BatchValue::Sequence(labels)) => {
            Selection::Sequences(preds, labels)
        }
        (BatchValue::Array(preds), BatchValue::Array(labels)) => Selection::Arrays(preds, labels),
        _ => return Err(Error::UnsupportedContainerType(ground_truths.kind())),
    };
    Ok((label_name, selection))
}

enum Selection<'a> {
    Sequences(&'a [Value], &'a [Value]),
    Arrays(&'a NumericArray, &'a NumericArray),
}

impl Metric for NedMetric {
    fn validate(&self, outputs: &Batch, inputs: &Batch) -> Result<()> {
        select(outputs, inputs).map(|_| ())
    }

    fn add(&mut self, outputs: &Batch, inputs: &Batch) -> Result<()> {
        let (label_name, selection) = select(outputs, inputs)?;
        let (preds, labels) = match selection {
            Selection::Sequences(preds, labels) => (preds.to_vec(), labels.to_vec()),
            Selection::Arrays(preds, labels) => (preds.to_list(), labels.to_list()),
        };

        log::debug!(
            "Accepted batch of {} predictions and {} labels from '{label_name}'",
            preds.len(),
            labels.len()
        );
        self.predictions.extend(preds);
        self.labels.extend(labels);
        Ok(())
    }

    fn evaluate(&self) -> Result<MetricValues> {
        let mean = self.mean_distance()?;
        Ok(MetricValues::from([(metric_keys::NED.to_owned(), mean)]))
    }

    fn reset(&mut self) {
        self.predictions.clear();
        self.labels.clear();
    }

    fn get_name(&self) -> String {
        metric_keys::NED.to_owned()
    }
}

#[derive(Default)]
pub struct NedMetricFactory;

impl MetricFactory for NedMetricFactory {
    impl_default_factory_functions!(metric_keys::NED, NedConfig);

    fn create(&self, config: &dyn MetricConfig) -> Result<Box<dyn Metric>> {
        let config = config
            .as_any()
            .downcast_ref::<NedConfig>()
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "{} metric cannot be created from a {} config",
                    metric_keys::NED,
                    config.typename()
                ))
            })?;
        Ok(Box::new(NedMetric::with_config(config)))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    use super::*;
    use crate::types::{ArrayData, ContainerKind};

    fn text_batch(key: &str, items: &[&str]) -> Batch {
        Batch::new().with(key, BatchValue::strings(items.iter().copied()))
    }

    #[test]
    fn test_add_preserves_order() {
        let mut metric = NedMetric::new();
        metric
            .add(
                &text_batch("text", &["a", "b"]),
                &text_batch("label", &["x", "y"]),
            )
            .unwrap();
        metric
            .add(&text_batch("text", &["c"]), &text_batch("label", &["z"]))
            .unwrap();

        assert_eq!(metric.predictions(), &[json!("a"), json!("b"), json!("c")]);
        assert_eq!(metric.labels(), &[json!("x"), json!("y"), json!("z")]);
        assert_eq!(metric.len(), 3);
    }

    #[test]
    fn test_hello_world() {
        let mut metric = NedMetric::new();
        metric
            .add(
                &text_batch("text", &["hello", "world"]),
                &text_batch("label", &["hello", "worlo"]),
            )
            .unwrap();
        let result = metric.evaluate().unwrap();
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(result["ned"], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_dataset_is_zero() {
        let mut metric = NedMetric::new();
        let items = ["the cat", "sat", "on the mat"];
        metric
            .add(&text_batch("caption", &items), &text_batch("labels", &items))
            .unwrap();
        assert_abs_diff_eq!(metric.evaluate().unwrap()["ned"], 0.0);
    }

    #[test]
    fn test_caption_has_priority_over_text() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new()
            .with("caption", BatchValue::strings(["a"]))
            .with("text", BatchValue::strings(["b"]));
        metric.add(&outputs, &text_batch("label", &["a"])).unwrap();
        assert_eq!(metric.predictions(), &[json!("a")]);
    }

    #[test]
    fn test_null_output_skipped() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new()
            .with("caption", BatchValue::Null)
            .with("text", BatchValue::strings(["b"]));
        metric.add(&outputs, &text_batch("label", &["a"])).unwrap();
        assert_eq!(metric.predictions(), &[json!("b")]);
    }

    #[test]
    fn test_label_key_preferred_over_labels() {
        let mut metric = NedMetric::new();
        let inputs = Batch::new()
            .with("label", BatchValue::strings(["first"]))
            .with("labels", BatchValue::strings(["second"]));
        metric.add(&text_batch("text", &["p"]), &inputs).unwrap();
        assert_eq!(metric.labels(), &[json!("first")]);
    }

    #[test]
    fn test_falls_back_to_label_key_in_outputs() {
        let mut metric = NedMetric::new();
        metric
            .add(&text_batch("label", &["pred"]), &text_batch("label", &["gold"]))
            .unwrap();
        assert_eq!(metric.predictions(), &[json!("pred")]);
    }

    #[test]
    fn test_missing_label_key() {
        let mut metric = NedMetric::new();
        let res = metric.add(&text_batch("text", &["a"]), &text_batch("target", &["a"]));
        assert!(matches!(res, Err(Error::MissingKey(_))));
    }

    #[test]
    fn test_missing_prediction_key() {
        let mut metric = NedMetric::new();
        let res = metric.add(&text_batch("answer", &["a"]), &text_batch("label", &["a"]));
        assert!(matches!(res, Err(Error::MissingKey(_))));
        assert!(metric.is_empty());
    }

    #[test]
    fn test_sequence_against_array_is_type_mismatch() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new().with("labels", NumericArray::from_ints(vec![1, 2]));
        let inputs = Batch::new().with("labels", vec![json!(1), json!(2)]);
        let res = metric.add(&outputs, &inputs);
        assert!(matches!(
            res,
            Err(Error::TypeMismatch {
                predictions: ContainerKind::NumericArray,
                labels: ContainerKind::Sequence,
            })
        ));
        assert!(metric.is_empty());
    }

    #[test]
    fn test_scalar_is_unsupported() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new().with("text", BatchValue::Scalar(json!("a")));
        let inputs = Batch::new().with("label", BatchValue::Scalar(json!("a")));
        let res = metric.add(&outputs, &inputs);
        assert!(matches!(
            res,
            Err(Error::UnsupportedContainerType(ContainerKind::Scalar))
        ));
    }

    #[test]
    fn test_null_fallback_is_unsupported() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new().with("labels", BatchValue::Null);
        let inputs = Batch::new().with("labels", BatchValue::Null);
        let res = metric.add(&outputs, &inputs);
        assert!(matches!(
            res,
            Err(Error::UnsupportedContainerType(ContainerKind::Null))
        ));
    }

    #[test]
    fn test_validate_does_not_accumulate() {
        let metric = NedMetric::new();
        metric
            .validate(&text_batch("text", &["a"]), &text_batch("label", &["b"]))
            .unwrap();
        assert!(metric.is_empty());

        let outputs = Batch::new().with("scores", NumericArray::from_ints(vec![1]));
        let res = metric.validate(&outputs, &text_batch("label", &["b"]));
        assert!(matches!(res, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_numeric_arrays_converted() {
        let mut metric = NedMetric::new();
        let boxes = |data: Vec<i64>| NumericArray::new(vec![2, 4], ArrayData::Int(data)).unwrap();
        let outputs = Batch::new().with("boxes", boxes(vec![0, 0, 10, 10, 5, 5, 20, 20]));
        let inputs = Batch::new().with("labels", boxes(vec![0, 0, 10, 10, 5, 5, 20, 21]));
        metric.add(&outputs, &inputs).unwrap();

        assert_eq!(metric.predictions()[0], json!([0, 0, 10, 10]));
        assert_eq!(metric.labels()[1], json!([5, 5, 20, 21]));
        // One of eight coordinates differs, in one of two boxes
        assert_abs_diff_eq!(metric.evaluate().unwrap()["ned"], 0.125);
    }

    #[test]
    fn test_scalar_label_ids() {
        let mut metric = NedMetric::new();
        let outputs = Batch::new().with("labels", NumericArray::from_ints(vec![1, 2, 3, 4]));
        let inputs = Batch::new().with("label", NumericArray::from_ints(vec![1, 2, 3, 5]));
        metric.add(&outputs, &inputs).unwrap();
        assert_abs_diff_eq!(metric.evaluate().unwrap()["ned"], 0.25);
    }

    #[test]
    fn test_empty_evaluate_fails() {
        let metric = NedMetric::new();
        assert!(matches!(metric.evaluate(), Err(Error::NoDataAccumulated)));
    }

    #[test]
    fn test_empty_evaluate_zero_policy() {
        let metric = NedMetric::with_config(&NedConfig::new(EmptyPolicy::Zero));
        assert_abs_diff_eq!(metric.evaluate().unwrap()["ned"], 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        let mut metric = NedMetric::new();
        metric
            .add(&text_batch("text", &["a", "b"]), &text_batch("label", &["a"]))
            .unwrap();
        assert!(matches!(
            metric.evaluate(),
            Err(Error::LengthMismatch {
                predictions: 2,
                labels: 1
            })
        ));
    }

    #[test]
    fn test_reset() {
        let mut metric = NedMetric::new();
        metric
            .add(&text_batch("text", &["a"]), &text_batch("label", &["b"]))
            .unwrap();
        metric.reset();
        assert!(metric.is_empty());
        assert!(matches!(metric.evaluate(), Err(Error::NoDataAccumulated)));
    }

    #[test]
    fn test_evaluate_does_not_consume() {
        let mut metric = NedMetric::new();
        metric
            .add(&text_batch("text", &["abcd"]), &text_batch("label", &["abce"]))
            .unwrap();
        let first = metric.evaluate().unwrap();
        let second = metric.evaluate().unwrap();
        assert_eq!(first, second);
        assert_eq!(metric.len(), 1);
    }

    #[test]
    fn test_config_defaults() {
        let factory = NedMetricFactory;
        assert_eq!(factory.get_config_default(), json!({"onEmpty": "error"}));
        let config = factory.parse_config(&json!({})).unwrap();
        assert_eq!(config.typename(), "ned");
    }
}
