//! Builder the decoder uses to assemble `Detection` values.

use crate::postprocess::detection::{Detection, UNKNOWN_LABEL};
use crate::postprocess::labels::LabelTable;
use crate::postprocess::rect::BoundingBox;

/// Builder for `Detection` values, resolving class names on the way.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    bbox: BoundingBox,
    confidence: f32,
    class_id: usize,
    class_name: Option<String>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = BoundingBox::new(cx, cy, w, h);
        self
    }

    /// Set the combined confidence score.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the class id and resolve its name from `labels`.
    pub fn class(mut self, class_id: usize, labels: &LabelTable) -> Self {
        self.class_id = class_id;
        self.class_name = Some(labels.name_or_unknown(class_id).to_string());
        self
    }

    /// Build the final `Detection`. A class never resolved is `"Unknown"`.
    pub fn build(self) -> Detection {
        let class_name = self
            .class_name
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        Detection::new(self.bbox, self.confidence, self.class_id, class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let labels = LabelTable::new(["person", "car"]);
        let det = DetectionBuilder::new()
            .xywh(0.3, 0.5, 0.4, 0.6)
            .confidence(0.95)
            .class(1, &labels)
            .build();

        assert_eq!(det.confidence, 0.95);
        assert_eq!(det.class_name, "car");
        assert!((det.bbox.x - 0.3).abs() < 1e-6);
        assert!((det.bbox.height - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_unresolved_class_is_unknown() {
        let det = DetectionBuilder::new().xywh(0.5, 0.5, 0.1, 0.1).build();
        assert_eq!(det.class_name, UNKNOWN_LABEL);
    }
}
