//! Video metadata types.
//!
//! This module defines [`VideoDetails`], the read-only description of an
//! uploaded video returned by [`VideoSource::details`](crate::VideoSource::details).
//! Details are extracted once when the file is opened and cached for the
//! lifetime of the source.

/// Read-only properties of a video stream.
///
/// `fps` and `duration_seconds` are rounded to two decimal places, matching
/// what the upload response reports. `duration_seconds` is derived as
/// `frame_count / fps`; a zero frame rate is rejected at open time, so the
/// division is always defined here.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoDetails {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Estimated total number of frames.
    pub frame_count: u64,
    /// Frames per second, rounded to two decimals (may be approximate for
    /// variable-frame-rate content).
    pub fps: f64,
    /// Total duration in seconds, rounded to two decimals.
    pub duration_seconds: f64,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}
