//! Capability trait for the external inference engine.

use std::fmt;

use ndarray::{ArrayView4, ArrayViewMutD};

/// Tensor metadata reported by an engine once, at initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Declared input shape, expected to be NHWC `[1, height, width, 3]`.
    pub input_shape: Vec<usize>,
    /// Declared output shape, rank 3 for direct output or rank 4 for grid output.
    pub output_shape: Vec<usize>,
}

impl ModelMetadata {
    pub fn new(input_shape: impl Into<Vec<usize>>, output_shape: impl Into<Vec<usize>>) -> Self {
        Self {
            input_shape: input_shape.into(),
            output_shape: output_shape.into(),
        }
    }

    /// Input `(width, height)` if the input shape is `[1, height, width, 3]`
    /// with non-zero spatial dimensions.
    pub fn input_size(&self) -> Option<(usize, usize)> {
        match self.input_shape.as_slice() {
            &[1, height, width, 3] if height > 0 && width > 0 => Some((width, height)),
            _ => None,
        }
    }
}

/// Trait for tensor-execution backends.
///
/// Implement this trait to plug any detection model runtime into the
/// pipeline. The pipeline never touches the runtime beyond these calls.
///
/// # Example
///
/// ```ignore
/// use detection_overlay_rs::{InferenceEngine, ModelMetadata};
/// use ndarray::{ArrayView4, ArrayViewMutD};
///
/// struct MyEngine {
///     // Your interpreter handle here
/// }
///
/// impl InferenceEngine for MyEngine {
///     type Error = std::io::Error;
///
///     fn metadata(&self) -> Result<ModelMetadata, Self::Error> {
///         Ok(ModelMetadata::new([1, 640, 640, 3], [1, 25200, 85]))
///     }
///
///     fn infer(
///         &mut self,
///         input: ArrayView4<'_, f32>,
///         output: ArrayViewMutD<'_, f32>,
///     ) -> Result<(), Self::Error> {
///         // Run the model and write into `output`
///         Ok(())
///     }
/// }
/// ```
pub trait InferenceEngine {
    /// Engine-level failure.
    type Error: fmt::Display;

    /// Report declared input and output tensor shapes.
    fn metadata(&self) -> Result<ModelMetadata, Self::Error>;

    /// Run inference synchronously.
    ///
    /// # Arguments
    /// * `input` - Normalized RGB pixels in `[0, 1]`, shape `[1, height, width, 3]`
    /// * `output` - Buffer shaped like the declared output tensor, to be filled
    fn infer(
        &mut self,
        input: ArrayView4<'_, f32>,
        output: ArrayViewMutD<'_, f32>,
    ) -> Result<(), Self::Error>;

    /// Release native resources. Called exactly once by the pipeline.
    fn release(&mut self) {}
}
