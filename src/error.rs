//! Error types for the detection pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while bringing a pipeline up.
///
/// A caller that receives one of these must not go on to run frames.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// The label resource could not be read.
    #[error("failed to read label table {path}: {source}")]
    LabelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The label resource held no non-blank lines.
    #[error("label table is empty")]
    EmptyLabelTable,
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for `PipelineConfig`.
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Confidence threshold outside `[0, 1]`.
    #[error("invalid confidence threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f32),
    /// The model input is not a single NHWC RGB image.
    #[error("invalid model input shape {0:?}: expected [1, height, width, 3]")]
    InvalidInputShape(Vec<usize>),
    /// The declared output tensor cannot hold any values.
    #[error("invalid model output shape {0:?}")]
    InvalidOutputShape(Vec<usize>),
    /// The inference engine could not report its tensor metadata.
    #[error("inference engine unavailable: {0}")]
    Engine(String),
}

/// Per-frame failures. `DetectionPipeline::run` absorbs these into an empty
/// detection list; `try_run` hands them back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The supplied buffer does not match the model input size.
    #[error("input buffer holds {got} values, expected {expected}")]
    InputSize { expected: usize, got: usize },
    /// The external engine failed for this frame.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The output tensor rank is recognized but not decodable.
    #[error("unsupported output tensor rank {rank}")]
    UnsupportedOutputShape { rank: usize },
}
