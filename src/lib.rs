//! Post-processing core for real-time object detection overlays.
//!
//! Raw detection model output is decoded into scored, labeled boxes, pruned
//! with per-class non-maximum suppression, and handed to an overlay renderer.
//! The tensor runtime itself stays behind the [`InferenceEngine`] trait.

pub mod config;
pub mod error;
pub mod integration;
pub mod overlay;
pub mod postprocess;

pub use config::PipelineConfig;
pub use error::{FrameError, InitializationError};
pub use integration::{DetectionPipeline, FrameGate, FramePermit, InferenceEngine, ModelMetadata};
pub use postprocess::{
    BoundingBox, Detection, DetectionBuilder, LabelTable, NMS_IOU_THRESHOLD, OutputDecoder,
    RawOutput, UNKNOWN_LABEL, intersection_over_union, suppress,
};
