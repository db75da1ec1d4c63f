//! The media-seek capability consumed by the sampling pipeline.
//!
//! A [`MediaSource`] exposes a single "current frame": [`seek`](MediaSource::seek)
//! moves it and resolves once the new frame is ready, and
//! [`capture_region`](MediaSource::capture_region) copies pixels out of it.
//! Because there is only one current frame, callers must not overlap a seek
//! with a capture; [`run`](crate::sampling::run) takes `&mut` access for the
//! whole loop.
//!
//! [`MemorySource`] is a ready-made implementation over decoded images,
//! handy for tests and for media decoded up front.

use std::future::Future;

use image::{RgbaImage, imageops};

use crate::crop::Rect;
use crate::error::SliceError;

/// A seekable source of decoded frames.
pub trait MediaSource {
    /// Seek to `timestamp` seconds. The future resolves once the source has
    /// landed and the current frame reflects the new position.
    fn seek(&mut self, timestamp: f64) -> impl Future<Output = Result<(), SliceError>>;

    /// Size of the current frame as `(width, height)`.
    fn current_frame_dimensions(&self) -> (u32, u32);

    /// Copy `region` out of the current frame. The result is exactly
    /// `region.w × region.h` pixels.
    fn capture_region(&mut self, region: Rect) -> Result<RgbaImage, SliceError>;
}

/// Copy `region` out of `image`.
///
/// # Errors
///
/// Returns [`SliceError::CaptureFailed`] if `region` does not fit inside the
/// image. The `last_ordinal` and `timestamp` fields are zero; the pipeline
/// fills them in.
pub fn crop_image(image: &RgbaImage, region: Rect) -> Result<RgbaImage, SliceError> {
    if region.right() > image.width() || region.bottom() > image.height() {
        return Err(SliceError::CaptureFailed {
            last_ordinal: 0,
            timestamp: 0.0,
            reason: format!(
                "region {region} exceeds {}×{} frame",
                image.width(),
                image.height()
            ),
        });
    }
    Ok(imageops::crop_imm(image, region.x, region.y, region.w, region.h).to_image())
}

/// An in-memory source over frames decoded in advance.
///
/// Seeking to `t` lands on the last frame whose timestamp is at or before
/// `t` (the first frame for earlier timestamps), the way a player shows the
/// frame on screen at a given time.
///
/// # Example
///
/// ```
/// use frameslice::{MemorySource, MediaSource};
/// use image::RgbaImage;
///
/// let frames = vec![
///     (0.0, RgbaImage::new(64, 48)),
///     (1.0, RgbaImage::new(64, 48)),
/// ];
/// let source = MemorySource::new(frames)?;
/// assert_eq!(source.current_frame_dimensions(), (64, 48));
/// # Ok::<(), frameslice::SliceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<(f64, RgbaImage)>,
    current: usize,
}

impl MemorySource {
    /// Build a source from `(timestamp, image)` pairs. The pairs are sorted
    /// by timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::NoVideoStream`] if `frames` is empty.
    pub fn new(mut frames: Vec<(f64, RgbaImage)>) -> Result<Self, SliceError> {
        if frames.is_empty() {
            return Err(SliceError::NoVideoStream);
        }
        frames.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { frames, current: 0 })
    }

    /// Timestamp of the current frame.
    pub fn current_timestamp(&self) -> f64 {
        self.frames[self.current].0
    }
}

impl MediaSource for MemorySource {
    async fn seek(&mut self, timestamp: f64) -> Result<(), SliceError> {
        let landed = self
            .frames
            .partition_point(|(frame_timestamp, _)| *frame_timestamp <= timestamp);
        self.current = landed.saturating_sub(1);
        Ok(())
    }

    fn current_frame_dimensions(&self) -> (u32, u32) {
        self.frames[self.current].1.dimensions()
    }

    fn capture_region(&mut self, region: Rect) -> Result<RgbaImage, SliceError> {
        crop_image(&self.frames[self.current].1, region)
    }
}
