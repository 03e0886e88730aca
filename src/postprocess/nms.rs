//! Per-class greedy non-maximum suppression.

use indexmap::IndexMap;

use crate::postprocess::detection::Detection;

/// Overlap above which the lower-confidence box of a same-class pair is dropped.
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Remove overlapping lower-confidence detections within each class.
///
/// Detections are grouped by `class_id` in order of each class's first
/// appearance. Each group is stably sorted by descending confidence and a
/// candidate is kept unless its IoU with an already kept box of the same
/// group exceeds [`NMS_IOU_THRESHOLD`]. Boxes of different classes never
/// suppress each other.
///
/// The output is grouped by class, each group confidence-descending; it is not
/// globally sorted.
pub fn suppress(detections: Vec<Detection>) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    let total = detections.len();
    let mut by_class: IndexMap<usize, Vec<Detection>> = IndexMap::new();
    for det in detections {
        by_class.entry(det.class_id).or_default().push(det);
    }

    let mut result: Vec<Detection> = Vec::with_capacity(total);
    for (_, mut group) in by_class {
        // `sort_by` is stable, so equal confidences keep input order.
        group.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let start = result.len();
        'candidates: for det in group {
            for kept in &result[start..] {
                if det.bbox.iou(&kept.bbox) > NMS_IOU_THRESHOLD {
                    continue 'candidates;
                }
            }
            result.push(det);
        }
    }

    tracing::trace!(input = total, kept = result.len(), "non-maximum suppression");
    result
}
