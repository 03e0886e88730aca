//! Decoded detection value.

use serde::{Deserialize, Serialize};

use crate::postprocess::rect::BoundingBox;

/// Label used when a class id has no entry in the label table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One located, classified object instance.
///
/// Produced by the decoder and never mutated afterwards; NMS and the overlay
/// only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in normalized center format
    pub bbox: BoundingBox,
    /// Objectness multiplied by the best class probability
    pub confidence: f32,
    /// Index into the label table, possibly out of range for malformed output
    pub class_id: usize,
    /// Human-readable label, `"Unknown"` when `class_id` is out of range
    pub class_name: String,
}

impl Detection {
    pub fn new(
        bbox: BoundingBox,
        confidence: f32,
        class_id: usize,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            class_name: class_name.into(),
        }
    }
}
