use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// The shape of container found under a batch key.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Sequence,
    NumericArray,
    Null,
    Scalar,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Sequence => "sequence",
            ContainerKind::NumericArray => "numeric array",
            ContainerKind::Null => "null",
            ContainerKind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int,
    Float,
}

/// Row-major storage of a numeric array. Elements are homogeneous.
#[derive(Debug, PartialEq, Clone)]
pub enum ArrayData {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int(v) => v.len(),
            ArrayData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Int(_) => DType::Int,
            ArrayData::Float(_) => DType::Float,
        }
    }

    fn to_values(&self) -> Vec<Value> {
        match self {
            ArrayData::Int(v) => v.iter().map(|x| Value::from(*x)).collect(),
            // Finite by construction, see NumericArray::new
            ArrayData::Float(v) => v
                .iter()
                .map(|x| Number::from_f64(*x).map_or(Value::Null, Value::Number))
                .collect(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct NumericArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NumericArray {
    /// Fails if the element count implied by `shape` does not match `data`.
    /// An empty shape describes a zero-dimensional array holding one element.
    /// Non-finite floats are rejected, they have no native JSON value.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<NumericArray> {
        let expected = element_count(&shape).ok_or_else(|| {
            Error::InvalidArgument(format!("Array shape {shape:?} overflows usize"))
        })?;
        if expected != data.len() {
            return Err(Error::InvalidArgument(format!(
                "Array of shape {:?} requires {} elements but {} were given",
                shape,
                expected,
                data.len()
            )));
        }
        if let ArrayData::Float(values) = &data {
            if let Some(x) = values.iter().find(|x| !x.is_finite()) {
                return Err(Error::InvalidArgument(format!(
                    "Array contains non-finite value {x}"
                )));
            }
        }
        Ok(NumericArray { shape, data })
    }

    pub fn from_ints(values: Vec<i64>) -> NumericArray {
        NumericArray {
            shape: vec![values.len()],
            data: ArrayData::Int(values),
        }
    }

    pub fn from_floats(values: Vec<f64>) -> Result<NumericArray> {
        NumericArray::new(vec![values.len()], ArrayData::Float(values))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Converts the array into a plain sequence along its first axis. Items of
    /// a 1-D array are native numbers, items of higher rank arrays are nested
    /// lists in row-major order.
    pub fn to_list(&self) -> Vec<Value> {
        let values = self.data.to_values();
        if self.shape.is_empty() {
            return values;
        }
        nest(&self.shape, &values)
    }
}

/// Product of the dimensions, or `None` if the non-zero dimensions overflow.
/// Overflow is checked even when a zero dimension makes the total zero, so any
/// sub-shape of a validated shape has a representable count.
fn element_count(shape: &[usize]) -> Option<usize> {
    let non_zero = shape
        .iter()
        .filter(|d| **d != 0)
        .try_fold(1usize, |acc, d| acc.checked_mul(*d))?;
    if shape.contains(&0) {
        Some(0)
    } else {
        Some(non_zero)
    }
}

fn nest(shape: &[usize], values: &[Value]) -> Vec<Value> {
    match shape {
        [] => values.to_vec(),
        [_] => values.to_vec(),
        [outer, rest @ ..] => {
            let inner = element_count(rest).unwrap_or(0);
            if inner == 0 {
                return (0..*outer)
                    .map(|_| Value::Array(nest(rest, &[])))
                    .collect();
            }
            values
                .chunks(inner)
                .map(|chunk| Value::Array(nest(rest, chunk)))
                .collect()
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonNumericArray {
    shape: Vec<usize>,
    data: Vec<Number>,
    #[serde(default)]
    dtype: Option<DType>,
}

impl TryFrom<JsonNumericArray> for NumericArray {
    type Error = Error;

    fn try_from(json: JsonNumericArray) -> Result<NumericArray> {
        let dtype = json.dtype.unwrap_or_else(|| {
            if json.data.iter().all(|n| n.is_i64()) {
                DType::Int
            } else {
                DType::Float
            }
        });

        let data = match dtype {
            DType::Int => ArrayData::Int(
                json.data
                    .iter()
                    .map(|n| {
                        n.as_i64().ok_or_else(|| {
                            Error::InvalidArgument(format!("{n} is not an integer"))
                        })
                    })
                    .collect::<Result<Vec<i64>>>()?,
            ),
            DType::Float => ArrayData::Float(
                json.data
                    .iter()
                    .map(|n| {
                        n.as_f64().ok_or_else(|| {
                            Error::InvalidArgument(format!("{n} is not representable as f64"))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?,
            ),
        };

        NumericArray::new(json.shape, data)
    }
}

impl From<&NumericArray> for JsonNumericArray {
    fn from(array: &NumericArray) -> Self {
        let data = array
            .data
            .to_values()
            .into_iter()
            .filter_map(|v| match v {
                Value::Number(n) => Some(n),
                _ => None,
            })
            .collect();
        JsonNumericArray {
            shape: array.shape.clone(),
            data,
            dtype: Some(array.dtype()),
        }
    }
}

/// A value stored under one key of a batch mapping.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(try_from = "Value", into = "Value")]
pub enum BatchValue {
    Sequence(Vec<Value>),
    Array(NumericArray),
    Null,
    Scalar(Value),
}

impl BatchValue {
    pub fn kind(&self) -> ContainerKind {
        match self {
            BatchValue::Sequence(_) => ContainerKind::Sequence,
            BatchValue::Array(_) => ContainerKind::NumericArray,
            BatchValue::Null => ContainerKind::Null,
            BatchValue::Scalar(_) => ContainerKind::Scalar,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BatchValue::Null)
    }

    pub fn strings<I, S>(items: I) -> BatchValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BatchValue::Sequence(items.into_iter().map(|s| Value::String(s.into())).collect())
    }
}

fn is_array_object(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("shape")
        && map.contains_key("data")
        && map
            .keys()
            .all(|k| matches!(k.as_str(), "shape" | "data" | "dtype"))
}

impl TryFrom<Value> for BatchValue {
    type Error = Error;

    fn try_from(value: Value) -> Result<BatchValue> {
        match value {
            Value::Null => Ok(BatchValue::Null),
            Value::Array(items) => Ok(BatchValue::Sequence(items)),
            Value::Object(map) if is_array_object(&map) => {
                let json: JsonNumericArray = serde_json::from_value(Value::Object(map))?;
                Ok(BatchValue::Array(json.try_into()?))
            }
            other => Ok(BatchValue::Scalar(other)),
        }
    }
}

impl From<BatchValue> for Value {
    fn from(value: BatchValue) -> Self {
        match value {
            BatchValue::Sequence(items) => Value::Array(items),
            BatchValue::Array(array) => {
                serde_json::to_value(JsonNumericArray::from(&array)).unwrap_or(Value::Null)
            }
            BatchValue::Null => Value::Null,
            BatchValue::Scalar(v) => v,
        }
    }
}

impl From<Vec<Value>> for BatchValue {
    fn from(items: Vec<Value>) -> Self {
        BatchValue::Sequence(items)
    }
}

impl From<NumericArray> for BatchValue {
    fn from(array: NumericArray) -> Self {
        BatchValue::Array(array)
    }
}

/// One batch worth of named values, either model outputs or pipeline inputs.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(transparent)]
pub struct Batch(BTreeMap<String, BatchValue>);

impl Batch {
    pub fn new() -> Batch {
        Batch::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<BatchValue>) -> Batch {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<BatchValue>) {
        self.0.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&BatchValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, BatchValue)> for Batch {
    fn from_iter<T: IntoIterator<Item = (K, BatchValue)>>(iter: T) -> Self {
        Batch(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Metric results keyed by metric identifier.
pub type MetricValues = BTreeMap<String, f64>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_to_list_1d() {
        let array = NumericArray::from_ints(vec![1, 2, 3]);
        assert_eq!(array.to_list(), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_to_list_2d_is_row_major() {
        let array =
            NumericArray::new(vec![2, 3], ArrayData::Int(vec![1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(array.to_list(), vec![json!([1, 2, 3]), json!([4, 5, 6])]);
    }

    #[test]
    fn test_to_list_3d() {
        let array = NumericArray::new(
            vec![2, 1, 2],
            ArrayData::Float(vec![0.5, 1.5, 2.5, 3.5]),
        )
        .unwrap();
        assert_eq!(
            array.to_list(),
            vec![json!([[0.5, 1.5]]), json!([[2.5, 3.5]])]
        );
    }

    #[test]
    fn test_to_list_zero_width_rows() {
        let array = NumericArray::new(vec![2, 0], ArrayData::Int(vec![])).unwrap();
        assert_eq!(array.to_list(), vec![json!([]), json!([])]);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let res = NumericArray::new(vec![2, 2], ArrayData::Int(vec![1, 2, 3]));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_shape_overflow_rejected() {
        let res = NumericArray::new(vec![1 << 32, 1 << 32, 0], ArrayData::Int(vec![]));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
        let res = NumericArray::new(vec![0, usize::MAX, 2], ArrayData::Int(vec![]));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_shape_overflow_from_json_is_an_error() {
        let res = serde_json::from_str::<Batch>(
            r#"{"boxes": {"shape": [4294967296, 4294967296, 0], "data": []}}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        assert!(matches!(
            NumericArray::from_floats(vec![1.0, f64::INFINITY]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            NumericArray::from_floats(vec![f64::NEG_INFINITY]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            NumericArray::new(vec![1], ArrayData::Float(vec![f64::NAN])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(NumericArray::from_floats(vec![0.5, -2.0]).is_ok());
    }

    #[test]
    fn test_batch_value_from_json() {
        let batch: Batch = serde_json::from_value(json!({
            "text": ["a", "b"],
            "boxes": {"shape": [1, 4], "data": [0, 0, 10, 10]},
            "scores": {"shape": [2], "data": [0.5, 1]},
            "caption": null,
            "label": "x",
            "meta": {"shape": [1], "data": [1], "extra": true}
        }))
        .unwrap();

        assert_eq!(batch.get("text").unwrap().kind(), ContainerKind::Sequence);
        assert_eq!(
            batch.get("boxes").unwrap().kind(),
            ContainerKind::NumericArray
        );
        assert_eq!(batch.get("caption").unwrap().kind(), ContainerKind::Null);
        assert_eq!(batch.get("label").unwrap().kind(), ContainerKind::Scalar);
        assert_eq!(batch.get("meta").unwrap().kind(), ContainerKind::Scalar);

        match batch.get("scores").unwrap() {
            BatchValue::Array(array) => {
                assert_eq!(array.dtype(), DType::Float);
                assert_eq!(array.to_list(), vec![json!(0.5), json!(1.0)]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_array_json_fails() {
        let res: std::result::Result<Batch, _> =
            serde_json::from_value(json!({"boxes": {"shape": [3], "data": [1, 2]}}));
        assert!(res.is_err());
    }

    #[test]
    fn test_array_serializes_back() {
        let value: Value = BatchValue::Array(NumericArray::from_ints(vec![4, 5])).into();
        assert_eq!(value, json!({"shape": [2], "data": [4, 5], "dtype": "int"}));
    }
}
