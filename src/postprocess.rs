mod builder;
mod decoder;
mod detection;
mod labels;
mod nms;
mod rect;

pub use builder::DetectionBuilder;
pub use decoder::{DEFAULT_CONFIDENCE_THRESHOLD, OutputDecoder, RawOutput};
pub use detection::{Detection, UNKNOWN_LABEL};
pub use labels::LabelTable;
pub use nms::{NMS_IOU_THRESHOLD, suppress};
pub use rect::{BoundingBox, intersection_over_union};
