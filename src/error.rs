//! Error types for the `fotograma` crate.
//!
//! This module defines [`FotogramaError`], the unified error type returned by
//! the fallible operations in the library. Variants carry enough context
//! (paths, session ids, upstream messages) to diagnose a failure without
//! extra logging at the call site. The HTTP layer maps these onto status
//! codes and JSON bodies in [`crate::routes`].

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `fotograma` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FotogramaError {
    /// The video path does not exist on disk.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
    },

    /// The video file exists but could not be opened by the decoder.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video's reported properties make it unusable (e.g. zero fps,
    /// which would make the duration computation divide by zero).
    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    /// A sampling window whose start does not precede its end, or whose
    /// start is negative.
    #[error("Invalid range: start ({start}) must be non-negative and less than end ({end})")]
    InvalidRange {
        /// Requested window start, in seconds.
        start: f64,
        /// Requested window end, in seconds.
        end: f64,
    },

    /// A requested frame count of zero.
    #[error("Frame count must be greater than zero")]
    InvalidFrameCount,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The session id is not registered (never created, or already consumed).
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// An I/O error occurred while reading or writing session files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FotogramaError {
    fn from(error: FfmpegError) -> Self {
        FotogramaError::FfmpegError(error.to_string())
    }
}
