//! Latest-frame-wins admission for a single detection worker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Admits at most one frame at a time; frames arriving while one is in
/// flight are dropped, never queued.
///
/// # Example
///
/// ```ignore
/// let gate = FrameGate::new();
/// if let Some(_permit) = gate.try_begin() {
///     let detections = pipeline.run(&frame);
///     // permit drops here and the next frame is admitted
/// }
/// ```
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the worker for one frame, or `None` if a frame is still in flight.
    pub fn try_begin(&self) -> Option<FramePermit<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.accepted.fetch_add(1, Ordering::Relaxed);
            Some(FramePermit { gate: self })
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Frames admitted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Frames rejected because another was in flight.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Proof that the holder owns the worker; releases the gate on drop, even
/// if frame processing panics.
#[derive(Debug)]
pub struct FramePermit<'a> {
    gate: &'a FrameGate,
}

impl Drop for FramePermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
