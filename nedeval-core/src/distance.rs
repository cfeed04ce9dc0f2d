use serde_json::Value;

/// Splits a value into the tokens edit operations act on. Strings are split
/// into chars, lists into their elements, null is empty, and any other value
/// is a single token.
pub fn tokens(value: &Value) -> Vec<Value> {
    match value {
        Value::String(s) => s.chars().map(|c| Value::String(c.into())).collect(),
        Value::Array(items) => items.clone(),
        Value::Null => vec![],
        other => vec![other.clone()],
    }
}

fn token_count(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Null => 0,
        _ => 1,
    }
}

pub fn levenshtein(a: &Value, b: &Value) -> usize {
    match (a, b) {
        (Value::String(a), Value::String(b)) => strsim::levenshtein(a, b),
        _ => strsim::generic_levenshtein(&tokens(a), &tokens(b)),
    }
}

/// Edit distance divided by the longer token count, in `[0, 1]`.
pub fn normalized_levenshtein(a: &Value, b: &Value) -> f64 {
    if a == b {
        return 0.0;
    }
    let max_len = token_count(a).max(token_count(b));
    if max_len == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / max_len as f64
}

pub fn normalized_similarity(a: &Value, b: &Value) -> f64 {
    1.0 - normalized_levenshtein(a, b)
}
