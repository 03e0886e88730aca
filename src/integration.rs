//! Integration module for connecting inference backends with detection
//! post-processing.
//!
//! This module provides the engine capability trait, the per-frame pipeline
//! and the frame admission gate used by a live camera loop.

mod engine;
mod frame_gate;
mod pipeline;

pub use engine::{InferenceEngine, ModelMetadata};
pub use frame_gate::{FrameGate, FramePermit};
pub use pipeline::DetectionPipeline;

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnEngine, BurnEngineError, BurnModel};
