//! Helpers for the rendering side of the overlay: mapping normalized boxes
//! into view space, class colours, captions and the frame-rate readout.
//!
//! Nothing here draws; a UI layer feeds these values to its canvas.

use std::time::{Duration, Instant};

use crate::postprocess::Detection;

/// Colours cycled through by class id, as `0xAARRGGBB`.
pub const CLASS_PALETTE: [u32; 8] = [
    0xFFFF_0000, // red
    0xFF00_FF00, // green
    0xFF00_00FF, // blue
    0xFFFF_FF00, // yellow
    0xFF00_FFFF, // cyan
    0xFFFF_00FF, // magenta
    0xFFFF_8000, // orange
    0xFF80_00FF, // purple
];

/// Colour for a class; ids beyond the palette wrap around.
pub fn class_color(class_id: usize) -> u32 {
    CLASS_PALETTE[class_id % CLASS_PALETTE.len()]
}

/// Box caption, e.g. `"person: 87%"`. The percentage is truncated, not rounded.
pub fn caption(det: &Detection) -> String {
    format!("{}: {}%", det.class_name, (det.confidence * 100.0) as i32)
}

/// Status line shown over the preview.
pub fn status_line(detections: usize, fps: f32) -> String {
    format!("Detections: {detections} | FPS: {fps:.1}")
}

/// Rectangle in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ViewRect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Maps normalized detections onto a view of a given size.
#[derive(Debug, Clone, Copy)]
pub struct ViewProjector {
    view_width: f32,
    view_height: f32,
}

impl ViewProjector {
    /// `None` until the view has a real size.
    pub fn new(view_width: f32, view_height: f32) -> Option<Self> {
        (view_width > 0.0 && view_height > 0.0).then_some(Self {
            view_width,
            view_height,
        })
    }

    pub fn project(&self, det: &Detection) -> ViewRect {
        let [x1, y1, x2, y2] = det.bbox.to_tlbr();

        ViewRect {
            left: x1 * self.view_width,
            top: y1 * self.view_height,
            right: x2 * self.view_width,
            bottom: y2 * self.view_height,
        }
    }
}

/// Frames-per-second estimate refreshed about once a second.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

const FPS_WINDOW: Duration = Duration::from_secs(1);

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Count a frame seen at `now` and return the current estimate.
    pub fn tick(&mut self, now: Instant) -> f32 {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= FPS_WINDOW {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
        self.fps
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}
