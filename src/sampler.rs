//! Frame sampling plan computation.
//!
//! This module is the pure core of the service: given a video's frame rate
//! and duration plus a requested time window and frame count, it decides
//! which frame indices to decode. It performs no I/O, which keeps the index
//! arithmetic directly testable.
//!
//! # Example
//!
//! ```
//! use fotograma::{SamplePlan, SampleWindow};
//!
//! let window = SampleWindow::new(0.0, 10.0, 5);
//! let plan = SamplePlan::compute(&window, 10.0, 10.0).unwrap();
//!
//! assert_eq!(plan.indices(), vec![0, 20, 40, 60, 80, 100]);
//! assert_eq!(plan.max_frames, 5);
//! ```

use crate::error::FotogramaError;

/// A requested sampling window over a video's timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct SampleWindow {
    /// Window start, in seconds from the beginning of the video.
    pub start_time: f64,
    /// Window end, in seconds. Clamped to the video duration during planning.
    pub end_time: f64,
    /// Maximum number of frames to extract from the window.
    pub frame_count: u32,
}

impl SampleWindow {
    /// Create a window. No validation happens here; see
    /// [`SampleWindow::validate`].
    pub fn new(start_time: f64, end_time: f64, frame_count: u32) -> Self {
        Self {
            start_time,
            end_time,
            frame_count,
        }
    }

    /// Check the window invariants: `0 ≤ start_time < end_time` and
    /// `frame_count ≥ 1`.
    ///
    /// # Errors
    ///
    /// - [`FotogramaError::InvalidRange`] if the start is negative or does
    ///   not precede the end.
    /// - [`FotogramaError::InvalidFrameCount`] if `frame_count` is zero.
    pub fn validate(&self) -> Result<(), FotogramaError> {
        if self.start_time < 0.0 || self.end_time <= self.start_time {
            return Err(FotogramaError::InvalidRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.frame_count == 0 {
            return Err(FotogramaError::InvalidFrameCount);
        }
        Ok(())
    }
}

/// A deterministic extraction plan: which frame indices to attempt, and how
/// many frames to emit at most.
///
/// The attempted index sequence is `start_frame, start_frame + step, …` up to
/// `end_frame` inclusive. The sequence may be longer than `max_frames`; the
/// extractor stops writing once `max_frames` images exist.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SamplePlan {
    /// First frame index to attempt, `floor(start_time * fps)`.
    pub start_frame: u64,
    /// Last frame index to attempt (inclusive), `floor(end_time * fps)` after
    /// clamping `end_time` to the video duration.
    pub end_frame: u64,
    /// Spacing between attempted indices, in frames. Always ≥ 1.
    pub step: u64,
    /// Cap on the number of frames actually written.
    pub max_frames: usize,
}

impl SamplePlan {
    /// Compute the extraction plan for a window against a video's frame rate
    /// and duration (both in the units reported by
    /// [`VideoDetails`](crate::VideoDetails)).
    ///
    /// The step is `max(1, (end_frame - start_frame) / frame_count)` with
    /// integer division. For `frame_count > 1` this spaces samples slightly
    /// tighter than dividing the span by `frame_count - 1` would, so the last
    /// attempted index can overshoot the cap; the cap in `max_frames` is what
    /// bounds the output.
    ///
    /// A window that starts beyond the video's duration produces an empty
    /// index sequence rather than an error.
    ///
    /// # Errors
    ///
    /// - Any error from [`SampleWindow::validate`].
    /// - [`FotogramaError::InvalidVideo`] if `fps` is not a positive number.
    pub fn compute(
        window: &SampleWindow,
        fps: f64,
        duration_seconds: f64,
    ) -> Result<Self, FotogramaError> {
        window.validate()?;

        if !(fps > 0.0) {
            return Err(FotogramaError::InvalidVideo(format!(
                "frames per second must be positive, got {fps}"
            )));
        }

        // Clamp the window end to the actual duration.
        let end_time = window.end_time.min(duration_seconds);

        let start_frame = (window.start_time * fps).floor() as u64;
        let end_frame = (end_time * fps).floor() as u64;

        let span = end_frame.saturating_sub(start_frame);
        let step = (span / u64::from(window.frame_count)).max(1);

        Ok(Self {
            start_frame,
            end_frame,
            step,
            max_frames: window.frame_count as usize,
        })
    }

    /// The attempted frame indices, in ascending order.
    ///
    /// Empty when the (clamped) window lies entirely before `start_frame`,
    /// i.e. when the request started past the end of the video.
    pub fn indices(&self) -> Vec<u64> {
        if self.start_frame > self.end_frame {
            return Vec::new();
        }
        (self.start_frame..=self.end_frame)
            .step_by(self.step as usize)
            .collect()
    }
}
