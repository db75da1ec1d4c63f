//! # frameslice
//!
//! Pick a rectangle of a video frame and a window of its timeline, then
//! slice that window into still frames at a fixed interval and package them
//! as a zip of PNGs.
//!
//! The crate is split the way the work flows:
//!
//! 1. [`CoordinateMapper`] letterboxes the video into a presentation surface
//!    and converts pointer positions back to video pixels.
//! 2. [`CropModel`] owns the crop rectangle and keeps it inside the frame,
//!    at least [`crop::MIN_SIZE`] pixels per side, and at the locked aspect
//!    ratio if there is one. [`CropInteractionController`] turns pointer
//!    events into moves, corner resizes and fresh selections.
//! 3. [`TimeRangeModel`] owns the start/end window.
//! 4. [`plan`] and [`run`] visit timestamps in order against a
//!    [`MediaSource`], capturing the crop at each.
//! 5. [`ExportPackager`] writes the captures into an archive.
//!
//! [`SliceSession`] bundles all of it for one piece of media.
//!
//! ## Quick Start
//!
//! ```
//! use frameslice::{
//!     CropInteractionController, CropModel, CoordinateMapper, MediaDimensions, Point,
//!     PointerEvent,
//! };
//!
//! let dimensions = MediaDimensions::new(1920, 1080, 30.0)?;
//! let mapper = CoordinateMapper::new(dimensions, 960.0, 540.0)?;
//! let mut crop = CropModel::new(dimensions);
//! let mut controller = CropInteractionController::new();
//!
//! // Grab the south-east corner and drag it up and left.
//! controller.handle(PointerEvent::Down(Point::new(960.0, 540.0)), &mapper, &mut crop);
//! controller.handle(PointerEvent::Move(Point::new(480.0, 270.0)), &mapper, &mut crop);
//! controller.handle(PointerEvent::Up, &mapper, &mut crop);
//!
//! assert_eq!((crop.rect().w, crop.rect().h), (960, 540));
//! # Ok::<(), frameslice::SliceError>(())
//! ```
//!
//! ### Sampling and export
//!
//! ```
//! use frameslice::{
//!     ExportOptions, ExportPackager, MemorySource, Rect, SamplingOptions, SamplingRequest,
//!     TimeRange,
//! };
//! use image::RgbaImage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = MemorySource::new(vec![(0.0, RgbaImage::new(640, 360))])?;
//! let request = SamplingRequest::new(Rect::new(0, 0, 320, 180), TimeRange::new(0.0, 5.0), 1.0);
//!
//! let frames = frameslice::sample(&request, &mut source, &SamplingOptions::new()).await?;
//! assert_eq!(frames.len(), 6);
//!
//! let archive = ExportPackager::new(ExportOptions::new()).package(&frames)?;
//! assert!(!archive.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | [`FfmpegSource`] decodes real video files, plus FFmpeg log control |
//! | `full` | Enables all of the above |
//!
//! The `ffmpeg` feature needs the FFmpeg development libraries installed.

pub mod config;
pub mod crop;
pub mod error;
pub mod export;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_source;
pub mod geometry;
pub mod interaction;
pub mod progress;
pub mod sampling;
pub mod session;
pub mod source;
pub mod time_range;

pub use config::{Compression, ExportOptions, SamplingOptions};
pub use crop::{AspectPolicy, Corner, CropModel, Rect};
pub use error::{PartialRun, SliceError};
pub use export::{ArchiveWriter, ExportPackager, ZipArchiveWriter};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
#[cfg(feature = "ffmpeg")]
pub use ffmpeg_source::FfmpegSource;
pub use geometry::{
    CoordinateMapper, MediaDimensions, Point, PresentationGeometry, SurfaceRect,
    compute_presentation_geometry,
};
pub use interaction::{
    CropCommand, CropInteractionController, CursorHint, DragMode, Feedback, InteractionState,
    PointerEvent,
};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampling::{
    CapturedFrame, MAX_FRAMES, SamplingRequest, estimated_frame_count, plan, run, sample,
};
pub use session::{PreviewGallery, SliceSession};
pub use source::{MediaSource, MemorySource};
pub use time_range::{RangeHandle, TimeRange, TimeRangeModel, format_time, parse_time};
