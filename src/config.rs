//! Pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InitializationError;
use crate::postprocess::DEFAULT_CONFIDENCE_THRESHOLD;

/// Configuration for the `DetectionPipeline`.
///
/// The NMS overlap threshold is fixed and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub confidence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    /// Set the confidence threshold for filtering detections.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InitializationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InitializationError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|source| InitializationError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InitializationError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(InitializationError::InvalidThreshold(
                self.confidence_threshold,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.confidence_threshold, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_default() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_out_of_range_threshold() {
        for threshold in [-0.1, 1.5, f32::NAN] {
            let config = PipelineConfig::default().with_confidence_threshold(threshold);
            assert!(matches!(
                config.validate(),
                Err(InitializationError::InvalidThreshold(_))
            ));
        }
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir()
            .join(format!("pipeline-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "confidence_threshold": 0.4 }"#).unwrap();

        let config = PipelineConfig::from_path(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(config.unwrap().confidence_threshold, 0.4);
    }

    #[test]
    fn test_from_path_rejects_garbage() {
        let path = std::env::temp_dir()
            .join(format!("pipeline-config-bad-{}.json", std::process::id()));
        std::fs::write(&path, "confidence_threshold = 0.4").unwrap();

        let err = PipelineConfig::from_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, InitializationError::ConfigParse { .. }));
    }
}
