//! Decoding of raw detection model output tensors.
//!
//! Two layouts are recognized:
//! - direct output, rank 3 `[1, N, 5 + C]`, one candidate per row laid out as
//!   `[x, y, w, h, objectness, class_0, ..., class_{C-1}]`
//! - grid output, rank 4 `[1, boxes, classes, values]`, the legacy layout,
//!   which is recognized but not decoded
//!
//! Any other rank decodes to nothing.

use ndarray::{ArrayView1, ArrayView3, ArrayView4, ArrayViewD, Ix3, Ix4, s};

use crate::postprocess::builder::DetectionBuilder;
use crate::postprocess::detection::Detection;
use crate::postprocess::labels::LabelTable;
use crate::postprocess::nms::suppress;

/// Minimum combined score for a candidate to be kept.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

const OBJECTNESS_INDEX: usize = 4;
const CLASS_SCORES_OFFSET: usize = 5;

/// Raw output tensor tagged by layout.
#[derive(Debug, Clone)]
pub enum RawOutput<'a> {
    /// Rank-3 `[1, N, 5 + C]` candidate list.
    Direct(ArrayView3<'a, f32>),
    /// Rank-4 `[1, boxes, classes, values]` grid layout.
    Grid(ArrayView4<'a, f32>),
    /// Any other rank.
    Unsupported { rank: usize },
}

impl<'a> RawOutput<'a> {
    /// Classify a tensor by its rank.
    pub fn from_tensor(tensor: ArrayViewD<'a, f32>) -> Self {
        let rank = tensor.ndim();
        match rank {
            3 => match tensor.into_dimensionality::<Ix3>() {
                Ok(view) => RawOutput::Direct(view),
                Err(_) => RawOutput::Unsupported { rank },
            },
            4 => match tensor.into_dimensionality::<Ix4>() {
                Ok(view) => RawOutput::Grid(view),
                Err(_) => RawOutput::Unsupported { rank },
            },
            _ => RawOutput::Unsupported { rank },
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            RawOutput::Direct(_) => 3,
            RawOutput::Grid(_) => 4,
            RawOutput::Unsupported { rank } => *rank,
        }
    }

    /// Whether this layout can produce detections.
    pub fn is_decodable(&self) -> bool {
        matches!(self, RawOutput::Direct(_))
    }
}

/// Turns raw output tensors into NMS-filtered detections.
#[derive(Debug, Clone, Copy)]
pub struct OutputDecoder {
    input_width: u32,
    input_height: u32,
    confidence_threshold: f32,
}

impl OutputDecoder {
    /// Create a decoder for a model with the given input dimensions and the
    /// default confidence threshold.
    pub fn new(input_width: u32, input_height: u32) -> Self {
        Self {
            input_width,
            input_height,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Set the confidence threshold for filtering candidates.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }

    /// Decode a tensor of any rank and apply per-class NMS.
    pub fn decode(&self, tensor: ArrayViewD<'_, f32>, labels: &LabelTable) -> Vec<Detection> {
        self.decode_output(&RawOutput::from_tensor(tensor), labels)
    }

    /// Decode an already classified tensor and apply per-class NMS.
    pub fn decode_output(&self, output: &RawOutput<'_>, labels: &LabelTable) -> Vec<Detection> {
        suppress(self.candidates(output, labels))
    }

    /// Candidates passing the confidence threshold, before NMS.
    pub fn candidates(&self, output: &RawOutput<'_>, labels: &LabelTable) -> Vec<Detection> {
        match output {
            RawOutput::Direct(view) => self.direct_candidates(view, labels),
            RawOutput::Grid(view) => {
                tracing::debug!(shape = ?view.shape(), "grid output layout is not decoded");
                Vec::new()
            }
            RawOutput::Unsupported { rank } => {
                tracing::debug!(rank, "unsupported output tensor rank");
                Vec::new()
            }
        }
    }

    fn direct_candidates(
        &self,
        output: &ArrayView3<'_, f32>,
        labels: &LabelTable,
    ) -> Vec<Detection> {
        let values_per_row = output.shape()[2];
        if values_per_row <= CLASS_SCORES_OFFSET {
            tracing::warn!(values_per_row, "direct output rows carry no class scores");
            return Vec::new();
        }

        // Only the first batch entry is meaningful for single-frame inference.
        let Some(rows) = output.outer_iter().next() else {
            return Vec::new();
        };

        rows.outer_iter()
            .filter_map(|row| self.decode_row(row, labels))
            .collect()
    }

    fn decode_row(&self, row: ArrayView1<'_, f32>, labels: &LabelTable) -> Option<Detection> {
        // Cheap reject on objectness before scanning class scores. Written as a
        // negated comparison so NaN is rejected too.
        let objectness = row[OBJECTNESS_INDEX];
        if !(objectness >= self.confidence_threshold) {
            return None;
        }

        let (class_id, class_score) = argmax(row.slice(s![CLASS_SCORES_OFFSET..]))?;
        let confidence = objectness * class_score;
        if !(confidence >= self.confidence_threshold) {
            return None;
        }

        let det = DetectionBuilder::new()
            .xywh(row[0], row[1], row[2].max(0.0), row[3].max(0.0))
            .confidence(confidence)
            .class(class_id, labels)
            .build();

        tracing::trace!(
            class = %det.class_name,
            class_id,
            confidence,
            x = det.bbox.x * self.input_width as f32,
            y = det.bbox.y * self.input_height as f32,
            width = det.bbox.width * self.input_width as f32,
            height = det.bbox.height * self.input_height as f32,
            "candidate"
        );
        Some(det)
    }
}

/// Index and value of the largest score. Ties go to the lowest index; NaN
/// scores are ignored.
fn argmax(scores: ArrayView1<'_, f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}
