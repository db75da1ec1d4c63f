//! A [`MediaSource`] that decodes a video file with FFmpeg.
//!
//! Each seek jumps to the keyframe at or before the target and decodes
//! forward to the first frame whose presentation time reaches it. The frame
//! is converted to RGBA and held as the current frame until the next seek.
//! Decoding happens on Tokio's blocking pool, so the async caller is never
//! stalled by FFmpeg work.
//!
//! # Example
//!
//! ```no_run
//! use frameslice::{FfmpegSource, MediaSource};
//!
//! # async fn example() -> Result<(), frameslice::SliceError> {
//! let mut source = FfmpegSource::open("input.mp4")?;
//! println!("{:.2}s", source.dimensions().duration());
//! source.seek(1.5).await?;
//! let (width, height) = source.current_frame_dimensions();
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbaImage;

use crate::crop::Rect;
use crate::error::SliceError;
use crate::geometry::MediaDimensions;
use crate::source::{MediaSource, crop_image};

/// Container timestamps are in microseconds.
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// A decoded frame counts as "at" the target if it is within this many
/// seconds before it, absorbing time base rounding.
const LANDING_TOLERANCE: f64 = 0.001;

/// Everything the blocking decode needs, moved onto the blocking thread for
/// each seek and back again.
struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    width: u32,
    height: u32,
}

/// A video file opened for frame capture.
pub struct FfmpegSource {
    path: PathBuf,
    dimensions: MediaDimensions,
    state: Option<DecodeState>,
    frame: RgbaImage,
    frame_timestamp: f64,
}

impl std::fmt::Debug for FfmpegSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSource")
            .field("path", &self.path)
            .field("dimensions", &self.dimensions)
            .field("frame_timestamp", &self.frame_timestamp)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open `path`, probe its video stream, and decode the first frame.
    ///
    /// # Errors
    ///
    /// - [`SliceError::FileOpen`] if FFmpeg cannot open or parse the file.
    /// - [`SliceError::NoVideoStream`] if there is no video stream.
    /// - [`SliceError::InvalidDimensions`] if the stream reports an empty
    ///   frame or no duration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SliceError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening media file: {}", path.display());

        let open_failed = |reason: String| SliceError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_failed(format!("FFmpeg initialisation failed: {error}")))?;
        let input = ffmpeg_next::format::input(&path).map_err(|error| open_failed(error.to_string()))?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(SliceError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let stream_duration = stream.duration();

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| open_failed(format!("Failed to create video decoder: {error}")))?;

        let duration = if input.duration() > 0 {
            input.duration() as f64 / MICROS_PER_SECOND
        } else {
            pts_to_seconds(stream_duration.max(0), time_base)
        };
        let dimensions = MediaDimensions::new(decoder.width(), decoder.height(), duration)?;

        let mut state = DecodeState {
            input,
            decoder,
            stream_index,
            time_base,
            width: dimensions.width(),
            height: dimensions.height(),
        };
        let (frame_timestamp, frame) = state.decode_at(0.0)?;

        log::debug!(
            "Opened {}: {}×{}, {:.3}s",
            path.display(),
            dimensions.width(),
            dimensions.height(),
            dimensions.duration()
        );

        Ok(Self {
            path,
            dimensions,
            state: Some(state),
            frame,
            frame_timestamp,
        })
    }

    /// Frame size and duration of the video stream.
    pub fn dimensions(&self) -> MediaDimensions {
        self.dimensions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Presentation time of the current frame, in seconds.
    pub fn current_timestamp(&self) -> f64 {
        self.frame_timestamp
    }

    /// The full current frame.
    pub fn current_frame(&self) -> &RgbaImage {
        &self.frame
    }
}

impl MediaSource for FfmpegSource {
    async fn seek(&mut self, timestamp: f64) -> Result<(), SliceError> {
        let mut state = self.state.take().ok_or_else(|| {
            SliceError::FfmpegError("decoder was lost by an earlier failed seek".to_string())
        })?;

        let (state, decoded) = tokio::task::spawn_blocking(move || {
            let decoded = state.decode_at(timestamp);
            (state, decoded)
        })
        .await
        .map_err(|error| SliceError::FfmpegError(format!("decode task failed: {error}")))?;
        self.state = Some(state);

        let (landed, frame) = decoded?;
        log::trace!("Seek to {timestamp:.3}s landed at {landed:.3}s");
        self.frame_timestamp = landed;
        self.frame = frame;
        Ok(())
    }

    fn current_frame_dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn capture_region(&mut self, region: Rect) -> Result<RgbaImage, SliceError> {
        crop_image(&self.frame, region)
    }
}

impl DecodeState {
    /// Seek to the keyframe at or before `timestamp` and decode up to the
    /// first frame at or past it. Past the last frame, the last frame wins.
    fn decode_at(&mut self, timestamp: f64) -> Result<(f64, RgbaImage), SliceError> {
        let position = (timestamp.max(0.0) * MICROS_PER_SECOND) as i64;
        self.input.seek(position, ..position)?;
        self.decoder.flush();

        let mut scaler = ScalingContext::get(
            self.decoder.format(),
            self.width,
            self.height,
            Pixel::RGBA,
            self.width,
            self.height,
            ScalingFlags::BILINEAR,
        )?;

        let mut decoded = VideoFrame::empty();
        let mut rgba = VideoFrame::empty();
        let mut last: Option<(f64, RgbaImage)> = None;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let seconds = frame_seconds(&decoded, self.time_base);
                scaler.run(&decoded, &mut rgba)?;
                let image = rgba_image(&rgba, self.width, self.height)?;
                if seconds + LANDING_TOLERANCE >= timestamp {
                    return Ok((seconds, image));
                }
                last = Some((seconds, image));
            }
        }

        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let seconds = frame_seconds(&decoded, self.time_base);
            scaler.run(&decoded, &mut rgba)?;
            let image = rgba_image(&rgba, self.width, self.height)?;
            if seconds + LANDING_TOLERANCE >= timestamp {
                return Ok((seconds, image));
            }
            last = Some((seconds, image));
        }

        last.ok_or_else(|| SliceError::CaptureFailed {
            last_ordinal: 0,
            timestamp,
            reason: "no frame could be decoded".to_string(),
        })
    }
}

fn frame_seconds(frame: &VideoFrame, time_base: Rational) -> f64 {
    let pts = frame.timestamp().or_else(|| frame.pts()).unwrap_or(0);
    pts_to_seconds(pts, time_base)
}

fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Copy a scaled RGBA frame into an image, dropping per-row padding.
fn rgba_image(frame: &VideoFrame, width: u32, height: u32) -> Result<RgbaImage, SliceError> {
    let stride = frame.stride(0);
    let row_bytes = width as usize * 4;
    let data = frame.data(0);

    let buffer = if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }
        buffer
    };

    RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
        SliceError::FfmpegError("decoded frame buffer is smaller than its dimensions".to_string())
    })
}
