//! One editing session over one piece of media.
//!
//! [`SliceSession`] owns every model the slicer works with: the crop, the
//! time range, the sampling interval, the pointer controller, and the most
//! recent preview. Loading new media resets all of them together.
//! [`PreviewGallery`] pages through a preview one frame at a time.
//!
//! # Example
//!
//! ```
//! use frameslice::{AspectPolicy, MediaDimensions, MemorySource, SamplingOptions, SliceSession};
//! use image::RgbaImage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dimensions = MediaDimensions::new(320, 240, 4.0)?;
//! let mut session = SliceSession::new(dimensions, 640.0, 480.0)?;
//! session.set_aspect(AspectPolicy::custom(1, 1));
//! session.set_interval(2.0);
//!
//! let mut source = MemorySource::new(vec![(0.0, RgbaImage::new(320, 240))])?;
//! let frames = session.preview(&mut source, &SamplingOptions::new()).await?;
//! assert_eq!(frames.len(), 3);
//! assert_eq!(frames[0].pixels.dimensions(), (240, 240));
//! # Ok(())
//! # }
//! ```

use crate::config::SamplingOptions;
use crate::crop::{AspectPolicy, CropModel, Rect};
use crate::error::{PartialRun, SliceError};
use crate::export::ExportPackager;
use crate::geometry::{CoordinateMapper, MediaDimensions};
use crate::interaction::{CropInteractionController, Feedback, PointerEvent};
use crate::sampling::{self, CapturedFrame, SamplingRequest};
use crate::source::MediaSource;
use crate::time_range::{TimeRangeModel, format_time};

/// Interval used when the requested one is not a positive finite number.
pub const DEFAULT_INTERVAL: f64 = 1.0;

/// Aspect ratio choices offered to the user, in display order. Each parses
/// with [`AspectPolicy::parse`].
pub const ASPECT_PRESETS: [&str; 6] = ["free", "original", "16:9", "4:3", "1:1", "9:16"];

/// State of one editing session.
#[derive(Debug, Clone)]
pub struct SliceSession {
    mapper: CoordinateMapper,
    crop: CropModel,
    time_range: TimeRangeModel,
    interval: f64,
    controller: CropInteractionController,
    preview: Vec<CapturedFrame>,
}

impl SliceSession {
    /// Start a session for media shown in a `container_width × container_height`
    /// surface.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDimensions`] if the container size is not
    /// positive and finite.
    pub fn new(
        dimensions: MediaDimensions,
        container_width: f64,
        container_height: f64,
    ) -> Result<Self, SliceError> {
        Ok(Self {
            mapper: CoordinateMapper::new(dimensions, container_width, container_height)?,
            crop: CropModel::new(dimensions),
            time_range: TimeRangeModel::new(dimensions.duration()),
            interval: DEFAULT_INTERVAL,
            controller: CropInteractionController::new(),
            preview: Vec::new(),
        })
    }

    /// Switch to new media.
    ///
    /// The crop goes back to the full frame, the range to the whole
    /// timeline, and the preview is cleared. The aspect policy, interval and
    /// container size carry over.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDimensions`] if the current container size
    /// cannot present the new media.
    pub fn load(&mut self, dimensions: MediaDimensions) -> Result<(), SliceError> {
        let (container_width, container_height) = self.mapper.container_size();
        self.mapper = CoordinateMapper::new(dimensions, container_width, container_height)?;
        self.crop.reset(dimensions);
        self.time_range.reset(dimensions.duration());
        self.controller.cancel();
        self.preview.clear();
        log::debug!(
            "Loaded {}×{} media, {:.3}s",
            dimensions.width(),
            dimensions.height(),
            dimensions.duration()
        );
        Ok(())
    }

    /// The presentation surface was resized.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDimensions`] for a non-positive size.
    pub fn resize_container(&mut self, width: f64, height: f64) -> Result<(), SliceError> {
        self.mapper.resize(width, height)
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn crop(&self) -> &CropModel {
        &self.crop
    }

    pub fn crop_mut(&mut self) -> &mut CropModel {
        &mut self.crop
    }

    pub fn time_range(&self) -> &TimeRangeModel {
        &self.time_range
    }

    pub fn time_range_mut(&mut self) -> &mut TimeRangeModel {
        &mut self.time_range
    }

    pub fn controller(&self) -> &CropInteractionController {
        &self.controller
    }

    /// Seconds between samples.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Set the interval. Zero, negative and non-finite values fall back to
    /// [`DEFAULT_INTERVAL`]. Returns the interval now in effect.
    pub fn set_interval(&mut self, seconds: f64) -> f64 {
        self.interval = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            DEFAULT_INTERVAL
        };
        self.interval
    }

    /// Set the interval from user text; anything that is not a number
    /// falls back to [`DEFAULT_INTERVAL`].
    pub fn set_interval_text(&mut self, text: &str) -> f64 {
        self.set_interval(text.trim().parse().unwrap_or(DEFAULT_INTERVAL))
    }

    /// Change the aspect policy and re-fit the crop to it.
    pub fn set_aspect(&mut self, policy: AspectPolicy) -> Rect {
        self.crop.apply_ratio(policy)
    }

    /// Select the full frame again. The aspect policy is kept but not
    /// re-applied.
    pub fn reset_crop(&mut self) -> Rect {
        self.crop.reset(self.mapper.dimensions());
        self.crop.rect()
    }

    /// Route a pointer event on the overlay to the crop.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Feedback {
        self.controller.handle(event, &self.mapper, &mut self.crop)
    }

    /// Frames the current settings will produce.
    pub fn estimated_frame_count(&self) -> u64 {
        sampling::estimated_frame_count(&self.time_range.range(), self.interval).unwrap_or(1)
    }

    /// Snapshot the crop, range and interval for a run.
    pub fn request(&self) -> SamplingRequest {
        SamplingRequest::new(self.crop.rect(), self.time_range.range(), self.interval)
    }

    /// Sample the current selection from `source` and keep it as the preview.
    ///
    /// The previous preview is discarded first.
    ///
    /// # Errors
    ///
    /// Returns the [`PartialRun`] from the pipeline. The preview stays empty
    /// and the partial frames go to the caller.
    pub async fn preview<S: MediaSource>(
        &mut self,
        source: &mut S,
        options: &SamplingOptions,
    ) -> Result<&[CapturedFrame], PartialRun> {
        self.preview.clear();
        let request = self.request();
        self.preview = sampling::sample(&request, source, options).await?;
        Ok(&self.preview)
    }

    /// Frames from the last successful preview.
    pub fn preview_frames(&self) -> &[CapturedFrame] {
        &self.preview
    }

    /// A gallery over the current preview.
    pub fn gallery(&self) -> PreviewGallery<'_> {
        PreviewGallery::new(&self.preview)
    }

    /// Package the preview into an archive, generating the preview first if
    /// there is none.
    ///
    /// # Errors
    ///
    /// A [`PartialRun`] if the preview had to be generated and failed, or a
    /// frameless one wrapping a packaging error.
    pub async fn export<S: MediaSource>(
        &mut self,
        source: &mut S,
        options: &SamplingOptions,
        packager: &ExportPackager,
    ) -> Result<Vec<u8>, PartialRun> {
        if self.preview.is_empty() {
            self.preview(source, options).await?;
        }
        Ok(packager.package(&self.preview)?)
    }
}

/// Pages through preview frames one at a time, wrapping at both ends.
#[derive(Debug, Clone, Copy)]
pub struct PreviewGallery<'a> {
    frames: &'a [CapturedFrame],
    index: usize,
}

impl<'a> PreviewGallery<'a> {
    /// A gallery positioned on the first frame.
    pub fn new(frames: &'a [CapturedFrame]) -> Self {
        Self { frames, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Jump to the frame with `ordinal`. Returns `None` and stays put if no
    /// frame has it.
    pub fn open(&mut self, ordinal: u32) -> Option<&'a CapturedFrame> {
        let index = self
            .frames
            .iter()
            .position(|frame| frame.ordinal == ordinal)?;
        self.index = index;
        self.current()
    }

    /// The frame on display.
    pub fn current(&self) -> Option<&'a CapturedFrame> {
        self.frames.get(self.index)
    }

    /// Step forward, from the last frame to the first.
    pub fn show_next(&mut self) -> Option<&'a CapturedFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.frames.len();
        self.current()
    }

    /// Step back, from the first frame to the last.
    pub fn show_previous(&mut self) -> Option<&'a CapturedFrame> {
        if self.frames.is_empty() {
            return None;
        }
        self.index = (self.index + self.frames.len() - 1) % self.frames.len();
        self.current()
    }

    /// `Frame #3 / 10 | Time: 00:02.000 | Size: 640 × 360 px`
    pub fn caption(&self) -> Option<String> {
        let frame = self.current()?;
        Some(format!(
            "Frame #{} / {} | Time: {} | Size: {} × {} px",
            frame.ordinal,
            self.frames.len(),
            format_time(frame.timestamp),
            frame.pixels.width(),
            frame.pixels.height()
        ))
    }
}

/// Thumbnail label: `#3 (00:02.000)`.
pub fn thumbnail_label(frame: &CapturedFrame) -> String {
    format!("#{} ({})", frame.ordinal, format_time(frame.timestamp))
}
