//! Frame sampling: time range + interval + crop → ordered still frames.
//!
//! Sampling happens in two steps. [`plan`] turns a [`TimeRange`] and an
//! interval into the list of timestamps to visit. [`run`] then walks that
//! list strictly in order against a [`MediaSource`]: seek, wait for the seek
//! to land, capture the crop region, repeat. Only one timestamp is ever in
//! flight, because the source has a single current frame.
//!
//! # Example
//!
//! ```
//! use frameslice::{MemorySource, Rect, SamplingOptions, SamplingRequest, TimeRange};
//! use image::RgbaImage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = MemorySource::new(vec![(0.0, RgbaImage::new(320, 240))])?;
//! let request = SamplingRequest::new(Rect::new(10, 10, 100, 50), TimeRange::new(0.0, 2.0), 0.5);
//!
//! let frames = frameslice::sample(&request, &mut source, &SamplingOptions::new()).await?;
//! assert_eq!(frames.len(), 5);
//! assert_eq!(frames[4].ordinal, 5);
//! assert_eq!(frames[4].pixels.dimensions(), (100, 50));
//! # Ok(())
//! # }
//! ```

use image::RgbaImage;

use crate::config::SamplingOptions;
use crate::crop::Rect;
use crate::error::{PartialRun, SliceError};
use crate::progress::{OperationType, ProgressTracker};
use crate::source::MediaSource;
use crate::time_range::TimeRange;

/// Slack for float error when comparing a step against the range end, so
/// `0.1 * 3` still counts as reaching `0.3`.
const STEP_EPSILON: f64 = 1e-9;

/// One captured still.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// 1-based position in capture order.
    pub ordinal: u32,
    /// Media time the frame was captured at, in seconds.
    pub timestamp: f64,
    /// The cropped pixels, exactly the crop rectangle's size.
    pub pixels: RgbaImage,
}

/// Everything a sampling run needs, copied out of the models at the start
/// of the run so later edits do not leak into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingRequest {
    pub crop: Rect,
    pub range: TimeRange,
    /// Seconds between samples.
    pub interval: f64,
}

impl SamplingRequest {
    pub fn new(crop: Rect, range: TimeRange, interval: f64) -> Self {
        Self {
            crop,
            range,
            interval,
        }
    }

    /// The timestamps this request will visit.
    ///
    /// # Errors
    ///
    /// Same as [`plan`].
    pub fn plan(&self) -> Result<Vec<f64>, SliceError> {
        plan(&self.range, self.interval)
    }
}

/// Largest number of frames one plan may hold; ordinals are `u32`.
pub const MAX_FRAMES: u64 = u32::MAX as u64;

fn validate_interval(interval: f64) -> Result<(), SliceError> {
    if interval.is_finite() && interval > 0.0 {
        Ok(())
    } else {
        Err(SliceError::InvalidInterval(interval))
    }
}

/// Whole intervals that fit in the range, as a float so huge counts stay
/// representable.
fn step_count(range: &TimeRange, interval: f64) -> Result<f64, SliceError> {
    validate_interval(interval)?;
    if !range.start.is_finite() || !range.end.is_finite() {
        return Err(SliceError::InvalidRange {
            start: range.start,
            end: range.end,
        });
    }
    Ok(((range.length() + STEP_EPSILON) / interval).floor().max(0.0))
}

/// Timestamps `start, start + interval, start + 2·interval, …` up to and
/// including `end`.
///
/// `start` is always included. The last timestamp may fall short of `end`;
/// it is never snapped to it. Each step is computed as `start + k·interval`
/// rather than by repeated addition.
///
/// # Errors
///
/// - [`SliceError::InvalidInterval`] if `interval` is not a positive finite
///   number.
/// - [`SliceError::InvalidRange`] if either bound of `range` is not finite.
/// - [`SliceError::TooManyFrames`] if the plan would exceed [`MAX_FRAMES`].
///
/// # Example
///
/// ```
/// use frameslice::{TimeRange, plan};
///
/// assert_eq!(plan(&TimeRange::new(0.0, 4.5), 2.0)?, vec![0.0, 2.0, 4.0]);
/// # Ok::<(), frameslice::SliceError>(())
/// ```
pub fn plan(range: &TimeRange, interval: f64) -> Result<Vec<f64>, SliceError> {
    let steps = step_count(range, interval)?;
    if steps >= MAX_FRAMES as f64 {
        return Err(SliceError::TooManyFrames {
            requested: steps + 1.0,
            limit: MAX_FRAMES,
        });
    }

    let steps = steps as u64;
    let mut timestamps = Vec::with_capacity(steps as usize + 1);
    timestamps.push(range.start);
    timestamps.extend(
        (1..=steps).map(|step| (range.start + step as f64 * interval).min(range.end)),
    );
    Ok(timestamps)
}

/// Number of frames a range and interval will produce, computed without
/// building the plan: `floor((end - start) / interval) + 1`.
///
/// The count saturates at `u64::MAX`; anything past [`MAX_FRAMES`] is
/// refused by [`plan`].
///
/// # Errors
///
/// Returns [`SliceError::InvalidInterval`] or [`SliceError::InvalidRange`]
/// under the same conditions as [`plan`].
pub fn estimated_frame_count(range: &TimeRange, interval: f64) -> Result<u64, SliceError> {
    let steps = step_count(range, interval)?;
    Ok((steps as u64).saturating_add(1))
}

/// Plan and run a request in one call.
///
/// # Errors
///
/// See [`run`] and [`plan`]. A plan that cannot be built fails before the
/// source is touched and yields a [`PartialRun`] with no frames.
pub async fn sample<S: MediaSource>(
    request: &SamplingRequest,
    source: &mut S,
    options: &SamplingOptions,
) -> Result<Vec<CapturedFrame>, PartialRun> {
    let timestamps = request.plan()?;
    run(&timestamps, request.crop, source, options).await
}

/// Visit each timestamp in order and capture `crop` from the frame there.
///
/// For every timestamp the source is seeked, the seek is awaited (bounded
/// by the configured seek timeout, if any), and then exactly
/// `crop.w × crop.h` pixels are captured. Frames get ordinals `1, 2, …` in
/// plan order. Progress is reported after each capture.
///
/// # Errors
///
/// On the first failure the rest of the plan is abandoned and a
/// [`PartialRun`] is returned holding every frame captured so far, with:
///
/// - [`SliceError::SeekTimeout`] if a seek did not land in time,
/// - [`SliceError::CaptureFailed`] if the source failed to seek or capture,
///   returned the wrong buffer size, or `crop` does not fit its frame,
/// - [`SliceError::Cancelled`] if the cancellation token was set.
pub async fn run<S: MediaSource>(
    timestamps: &[f64],
    crop: Rect,
    source: &mut S,
    options: &SamplingOptions,
) -> Result<Vec<CapturedFrame>, PartialRun> {
    let total = timestamps.len();
    log::debug!("Sampling {total} timestamp(s), crop {crop}");

    let mut frames: Vec<CapturedFrame> = Vec::with_capacity(total);
    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::FrameSampling,
        total as u64,
        options.batch_size,
    );

    for &timestamp in timestamps {
        if options.is_cancelled() {
            log::debug!("Sampling cancelled after {} frame(s)", frames.len());
            return Err(PartialRun {
                error: SliceError::Cancelled,
                frames,
            });
        }

        let last_ordinal = frames.len() as u32;
        let captured = match seek(source, timestamp, last_ordinal, options).await {
            Ok(()) => capture(source, crop, timestamp, last_ordinal),
            Err(error) => Err(error),
        };

        let pixels = match captured {
            Ok(pixels) => pixels,
            Err(error) => {
                log::warn!("Sampling stopped at {timestamp:.3}s: {error}");
                return Err(PartialRun { error, frames });
            }
        };

        let ordinal = last_ordinal + 1;
        frames.push(CapturedFrame {
            ordinal,
            timestamp,
            pixels,
        });
        tracker.advance(Some(ordinal), Some(timestamp));
    }

    Ok(frames)
}

async fn seek<S: MediaSource>(
    source: &mut S,
    timestamp: f64,
    last_ordinal: u32,
    options: &SamplingOptions,
) -> Result<(), SliceError> {
    let landed = match options.seek_timeout {
        Some(limit) => tokio::time::timeout(limit, source.seek(timestamp))
            .await
            .map_err(|_| SliceError::SeekTimeout {
                timestamp,
                last_ordinal,
            })?,
        None => source.seek(timestamp).await,
    };
    landed.map_err(|error| capture_failed(error, timestamp, last_ordinal))
}

fn capture<S: MediaSource>(
    source: &mut S,
    crop: Rect,
    timestamp: f64,
    last_ordinal: u32,
) -> Result<RgbaImage, SliceError> {
    let (frame_width, frame_height) = source.current_frame_dimensions();
    if crop.right() > frame_width || crop.bottom() > frame_height {
        return Err(SliceError::CaptureFailed {
            last_ordinal,
            timestamp,
            reason: format!("crop {crop} exceeds {frame_width}×{frame_height} frame"),
        });
    }

    let pixels = source
        .capture_region(crop)
        .map_err(|error| capture_failed(error, timestamp, last_ordinal))?;

    if pixels.dimensions() != (crop.w, crop.h) {
        return Err(SliceError::CaptureFailed {
            last_ordinal,
            timestamp,
            reason: format!(
                "source returned {}×{}, expected {}×{}",
                pixels.width(),
                pixels.height(),
                crop.w,
                crop.h
            ),
        });
    }
    Ok(pixels)
}

/// Re-label a source error with the run's position.
fn capture_failed(error: SliceError, timestamp: f64, last_ordinal: u32) -> SliceError {
    match error {
        SliceError::SeekTimeout { .. } => SliceError::SeekTimeout {
            timestamp,
            last_ordinal,
        },
        SliceError::CaptureFailed { reason, .. } => SliceError::CaptureFailed {
            last_ordinal,
            timestamp,
            reason,
        },
        other => SliceError::CaptureFailed {
            last_ordinal,
            timestamp,
            reason: other.to_string(),
        },
    }
}
