use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in center format.
///
/// Coordinates are normalized to `[0, 1]` relative to the model input, the
/// layout detection models emit directly:
/// - XYWH: Center X, Center Y, Width, Height
///
/// Corner (TLBR) form is derived on demand for overlap tests and drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Center x coordinate
    pub x: f32,
    /// Center y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl BoundingBox {
    /// Create a new box from center coordinates and dimensions (XYWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        [
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        ]
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    ///
    /// Touching or disjoint boxes yield exactly `0.0`, as does a pair whose
    /// union has no area.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let [ax1, ay1, ax2, ay2] = self.to_tlbr();
        let [bx1, by1, bx2, by2] = other.to_tlbr();

        let x_min = ax1.max(bx1);
        let y_min = ay1.max(by1);
        let x_max = ax2.min(bx2);
        let y_max = ay2.min(by2);

        if x_min >= x_max || y_min >= y_max {
            return 0.0;
        }

        // Areas come from the corner form so that a box compared with itself
        // yields exactly 1.0.
        let area_a = (ax2 - ax1) * (ay2 - ay1);
        let area_b = (bx2 - bx1) * (by2 - by1);
        let inter_area = (x_max - x_min) * (y_max - y_min);
        let union_area = area_a + area_b - inter_area;

        if union_area > 0.0 {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// IoU of two boxes given in center format.
pub fn intersection_over_union(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.iou(b)
}
