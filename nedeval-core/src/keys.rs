//! Well-known keys shared between model pipelines and metrics.

pub const LABEL: &str = "label";
pub const LABELS: &str = "labels";
pub const CAPTION: &str = "caption";
pub const TEXT: &str = "text";
pub const BOXES: &str = "boxes";
pub const SCORES: &str = "scores";

/// Output keys searched for predictions, highest priority first.
pub const PREDICTION_KEYS: [&str; 5] = [CAPTION, TEXT, BOXES, LABELS, SCORES];

pub mod metric_keys {
    pub const NED: &str = "ned";
}
