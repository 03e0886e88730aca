//! DetectionPipeline for combining an inference engine with post-processing.

use ndarray::{ArrayD, ArrayView4, IxDyn};

use crate::config::PipelineConfig;
use crate::error::{FrameError, InitializationError};
use crate::postprocess::{Detection, LabelTable, OutputDecoder, RawOutput};

use super::{InferenceEngine, ModelMetadata};

/// A per-frame detector that bundles an inference engine with output
/// decoding and per-class NMS.
///
/// Safe to drive from one worker at a time; `run` takes `&mut self` because
/// engine handles are usually not reentrant. Frame-dropping policy belongs to
/// the caller (see `FrameGate`).
pub struct DetectionPipeline<E: InferenceEngine> {
    engine: E,
    labels: LabelTable,
    metadata: ModelMetadata,
    decoder: OutputDecoder,
    output: ArrayD<f32>,
    released: bool,
}

impl<E: InferenceEngine> DetectionPipeline<E> {
    /// Query the engine's tensor metadata once and build the pipeline.
    ///
    /// Fails if the label table is empty, the config is invalid, the engine
    /// cannot report metadata, or the model input is not `[1, H, W, 3]`.
    pub fn initialize(
        mut engine: E,
        labels: LabelTable,
        config: PipelineConfig,
    ) -> Result<Self, InitializationError> {
        // A failed start-up still releases the engine it was handed.
        let (metadata, decoder, output) = match Self::prepare(&engine, &labels, &config) {
            Ok(parts) => parts,
            Err(err) => {
                engine.release();
                return Err(err);
            }
        };

        tracing::info!(
            input_width = decoder.input_size().0,
            input_height = decoder.input_size().1,
            output_shape = ?metadata.output_shape,
            labels = labels.len(),
            confidence_threshold = config.confidence_threshold,
            "detection pipeline initialized"
        );

        Ok(Self {
            engine,
            labels,
            metadata,
            decoder,
            output,
            released: false,
        })
    }

    fn prepare(
        engine: &E,
        labels: &LabelTable,
        config: &PipelineConfig,
    ) -> Result<(ModelMetadata, OutputDecoder, ArrayD<f32>), InitializationError> {
        config.validate()?;
        if labels.is_empty() {
            return Err(InitializationError::EmptyLabelTable);
        }

        let metadata = engine
            .metadata()
            .map_err(|e| InitializationError::Engine(e.to_string()))?;
        let (width, height) = metadata
            .input_size()
            .ok_or_else(|| InitializationError::InvalidInputShape(metadata.input_shape.clone()))?;
        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(InitializationError::InvalidInputShape(
                metadata.input_shape.clone(),
            ));
        };

        if output_len(&metadata.output_shape).is_none() {
            return Err(InitializationError::InvalidOutputShape(
                metadata.output_shape.clone(),
            ));
        }

        let rank = metadata.output_shape.len();
        if rank != 3 {
            tracing::warn!(
                rank,
                shape = ?metadata.output_shape,
                "model output layout is not decodable; frames will yield no detections"
            );
        }

        let decoder = OutputDecoder::new(width, height)
            .with_confidence_threshold(config.confidence_threshold);
        let output = ArrayD::zeros(IxDyn(&metadata.output_shape));
        Ok((metadata, decoder, output))
    }

    /// Process a single preprocessed frame and return its detections.
    ///
    /// Never fails: inference errors, malformed input and undecodable output
    /// are logged and yield an empty list for this frame only.
    ///
    /// # Arguments
    /// * `input` - Normalized RGB pixels, row-major `height * width * 3` values
    pub fn run(&mut self, input: &[f32]) -> Vec<Detection> {
        match self.try_run(input) {
            Ok(detections) => detections,
            Err(err @ FrameError::UnsupportedOutputShape { .. }) => {
                tracing::debug!(error = %err, "frame skipped");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "frame skipped");
                Vec::new()
            }
        }
    }

    /// Like `run`, but reports why a frame produced no detections.
    pub fn try_run(&mut self, input: &[f32]) -> Result<Vec<Detection>, FrameError> {
        let (width, height) = self.decoder.input_size();
        let shape = (1, height as usize, width as usize, 3);
        let expected = height as usize * width as usize * 3;

        let input = ArrayView4::from_shape(shape, input).map_err(|_| FrameError::InputSize {
            expected,
            got: input.len(),
        })?;

        // Engines may leave parts of the buffer untouched.
        self.output.fill(0.0);
        self.engine
            .infer(input, self.output.view_mut())
            .map_err(|e| FrameError::Inference(e.to_string()))?;

        let raw = RawOutput::from_tensor(self.output.view());
        if !raw.is_decodable() {
            return Err(FrameError::UnsupportedOutputShape { rank: raw.rank() });
        }

        let detections = self.decoder.decode_output(&raw, &self.labels);
        tracing::debug!(count = detections.len(), "frame decoded");
        Ok(detections)
    }

    /// Release engine resources and consume the pipeline.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.engine.release();
            tracing::info!("detection pipeline shut down");
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Model input `(width, height)`.
    pub fn input_size(&self) -> (u32, u32) {
        self.decoder.input_size()
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

/// Element count of a declared output shape, or `None` if the shape is empty,
/// has a zero dimension, or would not fit in an `f32` allocation.
fn output_len(shape: &[usize]) -> Option<usize> {
    if shape.is_empty() || shape.contains(&0) {
        return None;
    }
    let len = shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))?;
    let bytes = len.checked_mul(std::mem::size_of::<f32>())?;
    (bytes <= isize::MAX as usize).then_some(len)
}

impl<E: InferenceEngine> Drop for DetectionPipeline<E> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayViewMutD;
    use std::cell::Cell;
    use std::rc::Rc;

    struct MockEngine {
        metadata: ModelMetadata,
        rows: Vec<Vec<f32>>,
        fail: bool,
        releases: Rc<Cell<usize>>,
    }

    impl MockEngine {
        fn direct(rows: Vec<Vec<f32>>) -> Self {
            let width = rows.first().map_or(8, Vec::len);
            Self {
                metadata: ModelMetadata::new([1, 4, 4, 3], [1, rows.len().max(1), width]),
                rows,
                fail: false,
                releases: Rc::new(Cell::new(0)),
            }
        }
    }

    impl InferenceEngine for MockEngine {
        type Error = String;

        fn metadata(&self) -> Result<ModelMetadata, Self::Error> {
            Ok(self.metadata.clone())
        }

        fn infer(
            &mut self,
            _input: ArrayView4<'_, f32>,
            mut output: ArrayViewMutD<'_, f32>,
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err("native backend missing".to_string());
            }
            for (i, row) in self.rows.iter().enumerate() {
                for (j, &v) in row.iter().enumerate() {
                    output[&[0, i, j][..]] = v;
                }
            }
            Ok(())
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn labels() -> LabelTable {
        LabelTable::new(["person", "bicycle", "car"])
    }

    fn frame() -> Vec<f32> {
        vec![0.5; 4 * 4 * 3]
    }

    #[test]
    fn test_detection_pipeline() {
        let engine = MockEngine::direct(vec![
            vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.1, 0.1, 0.9],
            vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.9, 0.0, 0.0],
        ]);
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert_eq!(pipeline.input_size(), (4, 4));
        let dets = pipeline.run(&frame());
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_name, "car");
    }

    #[test]
    fn test_inference_failure_yields_empty_frame() {
        let mut engine = MockEngine::direct(vec![vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9, 0.0, 0.0]]);
        engine.fail = true;
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert!(pipeline.run(&frame()).is_empty());
        assert_eq!(
            pipeline.try_run(&frame()),
            Err(FrameError::Inference("native backend missing".to_string()))
        );
    }

    #[test]
    fn test_wrong_input_size() {
        let engine = MockEngine::direct(vec![vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9, 0.0, 0.0]]);
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert_eq!(
            pipeline.try_run(&[0.0; 10]),
            Err(FrameError::InputSize {
                expected: 48,
                got: 10
            })
        );
        assert!(pipeline.run(&[0.0; 10]).is_empty());
    }

    #[test]
    fn test_grid_output_is_unsupported() {
        let mut engine = MockEngine::direct(Vec::new());
        engine.metadata = ModelMetadata::new([1, 4, 4, 3], [1, 2, 3, 4]);
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert_eq!(
            pipeline.try_run(&frame()),
            Err(FrameError::UnsupportedOutputShape { rank: 4 })
        );
        assert!(pipeline.run(&frame()).is_empty());
    }

    #[test]
    fn test_frames_are_independent() {
        let mut engine = MockEngine::direct(vec![vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9, 0.0, 0.0]]);
        engine.fail = true;
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert!(pipeline.run(&frame()).is_empty());
        pipeline.engine.fail = false;
        assert_eq!(pipeline.run(&frame()).len(), 1);
    }

    #[test]
    fn test_initialization_failures() {
        let engine = MockEngine::direct(Vec::new());
        let err =
            DetectionPipeline::initialize(engine, LabelTable::default(), PipelineConfig::default());
        assert!(matches!(err, Err(InitializationError::EmptyLabelTable)));

        let mut engine = MockEngine::direct(Vec::new());
        engine.metadata = ModelMetadata::new([1, 3, 4, 4], [1, 1, 8]);
        let err = DetectionPipeline::initialize(engine, labels(), PipelineConfig::default());
        assert!(matches!(err, Err(InitializationError::InvalidInputShape(_))));

        let mut engine = MockEngine::direct(Vec::new());
        engine.metadata = ModelMetadata::new([1, 4, 4, 3], [1, 0, 8]);
        let err = DetectionPipeline::initialize(engine, labels(), PipelineConfig::default());
        assert!(matches!(err, Err(InitializationError::InvalidOutputShape(_))));

        let engine = MockEngine::direct(Vec::new());
        let config = PipelineConfig::default().with_confidence_threshold(2.0);
        let err = DetectionPipeline::initialize(engine, labels(), config);
        assert!(matches!(err, Err(InitializationError::InvalidThreshold(_))));

        let mut engine = MockEngine::direct(Vec::new());
        engine.metadata = ModelMetadata::new([1, 2, 2, 3], [1, usize::MAX / 2, 7]);
        let err = DetectionPipeline::initialize(engine, labels(), PipelineConfig::default());
        assert!(matches!(err, Err(InitializationError::InvalidOutputShape(_))));
    }

    #[test]
    fn test_failed_initialize_releases_engine() {
        let mut engine = MockEngine::direct(Vec::new());
        engine.metadata = ModelMetadata::new([1, 3, 2, 2], [1, 1, 8]);
        let releases = Rc::clone(&engine.releases);

        let err = DetectionPipeline::initialize(engine, labels(), PipelineConfig::default());
        assert!(err.is_err());
        assert_eq!(releases.get(), 1);

        let engine = MockEngine::direct(Vec::new());
        let releases = Rc::clone(&engine.releases);
        let err =
            DetectionPipeline::initialize(engine, LabelTable::default(), PipelineConfig::default());
        assert!(err.is_err());
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn test_output_len_rejects_oversized_shapes() {
        assert_eq!(output_len(&[1, 25200, 85]), Some(25200 * 85));
        assert_eq!(output_len(&[]), None);
        assert_eq!(output_len(&[1, 0, 85]), None);
        assert_eq!(output_len(&[1, usize::MAX / 2, 7]), None);
        assert_eq!(output_len(&[usize::MAX / 2]), None);
    }

    #[test]
    fn test_stale_output_is_not_decoded_again() {
        let engine = MockEngine::direct(vec![vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9, 0.0, 0.0]]);
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert_eq!(pipeline.run(&frame()).len(), 1);
        // the engine writes nothing on the next frame
        pipeline.engine.rows.clear();
        assert!(pipeline.run(&frame()).is_empty());
    }

    #[test]
    fn test_output_buffer_matches_declared_shape() {
        let engine = MockEngine::direct(vec![vec![0.0; 8]; 5]);
        let pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        assert_eq!(pipeline.output.shape(), &[1, 5, 8]);
    }

    #[test]
    fn test_release_runs_once() {
        let engine = MockEngine::direct(Vec::new());
        let mut pipeline =
            DetectionPipeline::initialize(engine, labels(), PipelineConfig::default()).unwrap();

        pipeline.release();
        pipeline.release();
        assert_eq!(pipeline.engine().releases.get(), 1);
    }
}
