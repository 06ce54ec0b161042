//! Video probing and frame extraction.
//!
//! [`VideoSource`] opens an uploaded video with FFmpeg, caches its
//! [`VideoDetails`], and extracts the frames selected by a
//! [`SamplePlan`](crate::SamplePlan) as JPEG files. Extraction seeks once to
//! the nearest keyframe before the first planned index and decodes forward,
//! emitting each frame whose computed frame number matches the next target.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;
use uuid::Uuid;

use crate::{error::FotogramaError, metadata::VideoDetails, sampler::SamplePlan};

/// An opened video file.
///
/// Created via [`VideoSource::open`], which probes the best video stream and
/// caches its details. [`extract_frames`](VideoSource::extract_frames)
/// borrows the source mutably because FFmpeg demuxing is stateful (seeking
/// moves the shared read position).
pub struct VideoSource {
    /// The opened FFmpeg input (demuxer) context.
    input_context: Input,
    /// Index of the best video stream.
    video_stream_index: usize,
    /// Cached details extracted at open time (rounded values).
    details: VideoDetails,
    /// Unrounded frame rate, kept for pts↔frame-number conversion.
    raw_fps: f64,
    /// Path to the opened file (kept for error messages).
    #[allow(dead_code)]
    file_path: PathBuf,
}

impl VideoSource {
    /// Open a video file and probe its properties.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and caches its details. The frame rate comes from the
    /// stream's average frame rate, falling back to its raw rate; the total
    /// frame count comes from the container when declared, otherwise it is
    /// estimated from the container duration. The duration reported in the
    /// details is derived as `frame_count / fps`.
    ///
    /// # Errors
    ///
    /// - [`FotogramaError::FileNotFound`] if `path` is not an existing file.
    /// - [`FotogramaError::FileOpen`] if FFmpeg cannot open the stream.
    /// - [`FotogramaError::NoVideoStream`] if the file has no video stream.
    /// - [`FotogramaError::InvalidVideo`] if the frame rate is zero, which
    ///   would make the duration computation divide by zero.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FotogramaError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        if !path.is_file() {
            return Err(FotogramaError::FileNotFound { path: file_path });
        }

        log::debug!("Opening video file: {}", file_path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| FotogramaError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| FotogramaError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FotogramaError::NoVideoStream)?;
        let video_stream_index = stream.index();

        // Frame rate from the stream's average frame rate, with the raw
        // rate field as fallback.
        let frame_rate = stream.avg_frame_rate();
        let raw_fps = if frame_rate.denominator() != 0 {
            f64::from(frame_rate.numerator()) / f64::from(frame_rate.denominator())
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                f64::from(rate.numerator()) / f64::from(rate.denominator())
            } else {
                0.0
            }
        };

        if raw_fps <= 0.0 {
            return Err(FotogramaError::InvalidVideo(
                "video reports a frame rate of zero".to_string(),
            ));
        }

        // Total frame count: the container's declared count when present,
        // otherwise estimated from the container duration.
        let declared_frames = stream.frames();
        let frame_count = if declared_frames > 0 {
            declared_frames as u64
        } else {
            let duration_microseconds = input_context.duration();
            let duration_seconds = if duration_microseconds > 0 {
                duration_microseconds as f64 / 1_000_000.0
            } else {
                0.0
            };
            (duration_seconds * raw_fps) as u64
        };

        let codec_parameters = stream.parameters();
        let decoder_context =
            CodecContext::from_parameters(codec_parameters).map_err(|error| {
                FotogramaError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| FotogramaError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let duration_seconds = frame_count as f64 / raw_fps;

        let details = VideoDetails {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frame_count,
            fps: round_to_two_decimals(raw_fps),
            duration_seconds: round_to_two_decimals(duration_seconds),
            codec,
        };

        log::info!(
            "Opened video: {} ({}x{}, {:.2} fps, ~{} frames, codec={})",
            file_path.display(),
            details.width,
            details.height,
            details.fps,
            details.frame_count,
            details.codec,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            details,
            raw_fps,
            file_path,
        })
    }

    /// The cached video details.
    ///
    /// Probed once during [`open`](VideoSource::open); no additional
    /// decoding happens here.
    pub fn details(&self) -> &VideoDetails {
        &self.details
    }

    /// Decode the frames selected by `plan` and write each as a JPEG named
    /// `frame_<hex>.jpg` in `output_dir`. Returns the written filenames.
    ///
    /// Seeks once to the nearest keyframe before the first planned index and
    /// decodes forward, writing each frame whose computed frame number
    /// matches the next target. Stops as soon as `plan.max_frames` images
    /// have been written or the decoder stops producing frames. A seek or
    /// decode failure ends extraction early with whatever was written so far
    /// (logged, not surfaced); there are no retries.
    ///
    /// # Errors
    ///
    /// - [`FotogramaError::NoVideoStream`] if the stream disappeared (never
    ///   expected after a successful open).
    /// - [`FotogramaError::FfmpegError`] if the decoder or scaler cannot be
    ///   constructed.
    /// - [`FotogramaError::VideoDecodeError`] if a decoded frame cannot be
    ///   converted to an image.
    /// - [`FotogramaError::ImageError`] if a JPEG cannot be written.
    pub fn extract_frames(
        &mut self,
        plan: &SamplePlan,
        output_dir: &Path,
    ) -> Result<Vec<String>, FotogramaError> {
        let targets = plan.indices();
        if targets.is_empty() || plan.max_frames == 0 {
            return Ok(Vec::new());
        }

        let frames_per_second = self.raw_fps;
        let target_width = self.details.width;
        let target_height = self.details.height;

        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or(FotogramaError::NoVideoStream)?;
        let time_base = stream.time_base();
        let codec_parameters = stream.parameters();
        let decoder_context = CodecContext::from_parameters(codec_parameters)?;
        let mut decoder = decoder_context.decoder().video()?;

        // Pixel-format converter (source format → RGB24).
        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        // Seek to the nearest keyframe before the first target.
        let first_timestamp =
            frame_number_to_stream_timestamp(targets[0], frames_per_second, time_base);
        if let Err(error) = self.input_context.seek(first_timestamp, ..first_timestamp) {
            log::warn!(
                "Seek to frame {} failed, no frames extracted: {error}",
                targets[0]
            );
            return Ok(Vec::new());
        }

        let mut written: Vec<String> = Vec::with_capacity(plan.max_frames);
        let mut target_index = 0;
        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if written.len() >= plan.max_frames || target_index >= targets.len() {
                break;
            }
            if stream.index() != self.video_stream_index {
                continue;
            }

            if let Err(error) = decoder.send_packet(&packet) {
                // Degrade to a partial result, as promised by the contract.
                log::warn!(
                    "Decoding failed after {} frame(s), extraction stopped early: {error}",
                    written.len()
                );
                return Ok(written);
            }

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if written.len() >= plan.max_frames || target_index >= targets.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current_frame_number =
                    pts_to_frame_number(pts, time_base, frames_per_second);

                // Skip targets the seek already landed past.
                while target_index < targets.len() && targets[target_index] < current_frame_number
                {
                    target_index += 1;
                }

                if target_index < targets.len() && current_frame_number == targets[target_index] {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let filename = write_frame_jpeg(
                        &rgb_frame,
                        target_width,
                        target_height,
                        output_dir,
                    )?;
                    written.push(filename);
                    target_index += 1;
                }
            }
        }

        // Flush the decoder for any frames still buffered at end of stream.
        if written.len() < plan.max_frames
            && target_index < targets.len()
            && decoder.send_eof().is_ok()
        {
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if written.len() >= plan.max_frames || target_index >= targets.len() {
                    break;
                }

                let pts = decoded_frame.pts().unwrap_or(0);
                let current_frame_number =
                    pts_to_frame_number(pts, time_base, frames_per_second);

                while target_index < targets.len() && targets[target_index] < current_frame_number
                {
                    target_index += 1;
                }

                if target_index < targets.len() && current_frame_number == targets[target_index] {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    let filename = write_frame_jpeg(
                        &rgb_frame,
                        target_width,
                        target_height,
                        output_dir,
                    )?;
                    written.push(filename);
                    target_index += 1;
                }
            }
        }

        log::debug!(
            "Extracted {} of at most {} frame(s) into {}",
            written.len(),
            plan.max_frames,
            output_dir.display(),
        );

        Ok(written)
    }
}

/// Write a scaled RGB24 frame as `frame_<hex>.jpg` in `output_dir` and
/// return the generated filename.
fn write_frame_jpeg(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
    output_dir: &Path,
) -> Result<String, FotogramaError> {
    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FotogramaError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;

    let filename = format!("frame_{}.jpg", Uuid::new_v4().simple());
    rgb_image.save(output_dir.join(&filename))?;
    Ok(filename)
}

/// Copy pixel data from an FFmpeg video frame into a tightly-packed RGB
/// buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3); this
/// strips it so the result can be passed to [`image::RgbImage::from_raw`].
fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Convert a frame number to a timestamp in the stream's time base, suitable
/// for FFmpeg seeking.
fn frame_number_to_stream_timestamp(
    frame_number: u64,
    frames_per_second: f64,
    time_base: Rational,
) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    let numerator = f64::from(time_base.numerator());
    let denominator = f64::from(time_base.denominator());
    (seconds * denominator / numerator) as i64
}

/// Rescale a PTS value to a frame number.
fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds =
        pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator());
    (seconds * frames_per_second) as u64
}

/// Round to two decimal places, the precision the upload response reports.
fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
