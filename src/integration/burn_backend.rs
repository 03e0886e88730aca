//! Burn inference backend for object detection.
//!
//! This module provides a `BurnEngine` that implements `InferenceEngine`
//! for running detection models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use detection_overlay_rs::integration::{BurnEngine, BurnModel};
//! use burn::backend::NdArray;
//!
//! // Implement BurnModel for your detection model
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> burn::tensor::TensorData {
//!         // Run inference, returning the [1, N, 5 + C] head
//!     }
//!
//!     fn output_shape(&self) -> Vec<usize> {
//!         vec![1, 25200, 85]
//!     }
//! }
//!
//! let model = MyYoloModel::load("model.bin");
//! let engine = BurnEngine::new(model, Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::{Tensor, TensorData};
use ndarray::{ArrayView4, ArrayViewD, ArrayViewMutD, IxDyn};
use thiserror::Error;

use super::{InferenceEngine, ModelMetadata};

/// Error type for Burn inference failures.
#[derive(Debug, Clone, Error)]
pub enum BurnEngineError {
    /// The model returned a tensor whose shape differs from the declared one.
    #[error("output shape mismatch: declared {declared:?}, got {got:?}")]
    OutputShapeMismatch {
        declared: Vec<usize>,
        got: Vec<usize>,
    },
    /// The output tensor could not be read back as `f32`.
    #[error("failed to read model output: {0}")]
    OutputData(String),
}

/// Trait for Burn-based detection models.
///
/// Implement this trait for your specific model architecture.
pub trait BurnModel<B: Backend> {
    /// Run forward pass on the input tensor.
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape [batch, channels, height, width], or
    ///   [batch, height, width, channels] when `channels_first` is false
    ///
    /// # Returns
    /// Raw output tensor data, before any thresholding or NMS.
    fn forward(&self, input: Tensor<B, 4>) -> TensorData;

    /// Declared output tensor shape.
    fn output_shape(&self) -> Vec<usize>;

    /// Get the expected input size (height, width).
    fn input_size(&self) -> (usize, usize) {
        (640, 640) // Default YOLO input size
    }

    /// Whether the model consumes NCHW tensors (vs NHWC).
    fn channels_first(&self) -> bool {
        true
    }
}

/// Burn-based engine implementing `InferenceEngine`.
pub struct BurnEngine<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnEngine<B, M> {
    /// Create a new Burn engine with the given model and device.
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Convert the pipeline's NHWC input into a Burn tensor in the model's layout.
    fn to_tensor(&self, input: ArrayView4<'_, f32>) -> Tensor<B, 4> {
        let (batch, height, width, channels) = input.dim();
        let data: Vec<f32> = input.iter().copied().collect();

        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([batch, height, width, channels]);

        if self.model.channels_first() {
            tensor.permute([0, 3, 1, 2])
        } else {
            tensor
        }
    }
}

impl<B: Backend, M: BurnModel<B>> InferenceEngine for BurnEngine<B, M> {
    type Error = BurnEngineError;

    fn metadata(&self) -> Result<ModelMetadata, Self::Error> {
        let (height, width) = self.model.input_size();
        Ok(ModelMetadata::new(
            [1, height, width, 3],
            self.model.output_shape(),
        ))
    }

    fn infer(
        &mut self,
        input: ArrayView4<'_, f32>,
        mut output: ArrayViewMutD<'_, f32>,
    ) -> Result<(), Self::Error> {
        let tensor = self.to_tensor(input);
        let data = self.model.forward(tensor);

        let got = data.shape.clone();
        if got.as_slice() != output.shape() {
            return Err(BurnEngineError::OutputShapeMismatch {
                declared: output.shape().to_vec(),
                got,
            });
        }

        let values = data
            .to_vec::<f32>()
            .map_err(|e| BurnEngineError::OutputData(format!("{e:?}")))?;
        let values = ArrayViewD::from_shape(IxDyn(&got), &values)
            .map_err(|e| BurnEngineError::OutputData(e.to_string()))?;
        output.assign(&values);
        Ok(())
    }
}
