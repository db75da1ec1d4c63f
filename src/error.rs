//! Error types for the `frameslice` crate.
//!
//! This module defines [`SliceError`], the unified error type returned by all
//! fallible operations in the crate, and [`PartialRun`], which carries the
//! frames a sampling run managed to capture before it stopped.
//!
//! Geometry never fails: the crop model clamps every candidate rectangle into
//! a valid one, so there is no "degenerate rectangle" variant.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

use crate::sampling::CapturedFrame;

/// The unified error type for all `frameslice` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SliceError {
    /// A sampling interval of zero, a negative value, or a non-finite value
    /// was provided.
    #[error("Interval must be a finite number greater than zero (got {0})")]
    InvalidInterval(f64),

    /// A time range bound was NaN or infinite.
    #[error("Time range bounds must be finite (got {start}..{end})")]
    InvalidRange {
        /// Range start, in seconds.
        start: f64,
        /// Range end, in seconds.
        end: f64,
    },

    /// The range and interval would produce more frames than ordinals can
    /// number.
    #[error("Plan would produce {requested} frames, more than the limit of {limit}")]
    TooManyFrames {
        /// Frame count the plan would need.
        requested: f64,
        /// Largest frame count a run supports.
        limit: u64,
    },

    /// The media source did not report a landed seek in time.
    #[error("Seek to {timestamp:.3}s timed out (last captured frame: {last_ordinal})")]
    SeekTimeout {
        /// Timestamp the source was asked to seek to, in seconds.
        timestamp: f64,
        /// Ordinal of the last frame captured before the timeout, 0 if none.
        last_ordinal: u32,
    },

    /// The media source could not seek to or capture a timestamp.
    #[error("Capture failed at {timestamp:.3}s after frame {last_ordinal}: {reason}")]
    CaptureFailed {
        /// Ordinal of the last frame captured successfully, 0 if none.
        last_ordinal: u32,
        /// Timestamp that failed, in seconds.
        timestamp: f64,
        /// What the media source reported.
        reason: String,
    },

    /// A time string did not match `MM:SS` or `MM:SS.mmm`.
    #[error("Malformed time text: {0:?}")]
    MalformedTimeText(String),

    /// Media or container dimensions were zero, negative, or not finite.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Two frames with the same ordinal were handed to the packager.
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to the media source.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing the archive.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error from the zip writer.
    #[error("Archive error: {0}")]
    ArchiveError(#[from] ZipError),
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for SliceError {
    fn from(error: ffmpeg_next::Error) -> Self {
        SliceError::FfmpegError(error.to_string())
    }
}

/// A sampling run that stopped before the end of its plan.
///
/// Frames captured before the failure are valid and kept in
/// [`frames`](PartialRun::frames), so the caller can show them, package
/// them, or retry from [`last_ordinal`](PartialRun::last_ordinal).
#[derive(Debug, Error)]
#[error("{error} ({} frame(s) retained)", .frames.len())]
pub struct PartialRun {
    /// Why the run stopped.
    #[source]
    pub error: SliceError,
    /// Frames captured before the run stopped, in ordinal order.
    pub frames: Vec<CapturedFrame>,
}

impl PartialRun {
    /// Ordinal of the last retained frame, 0 if nothing was captured.
    pub fn last_ordinal(&self) -> u32 {
        self.frames.last().map_or(0, |frame| frame.ordinal)
    }

    /// Split into the cause and the retained frames.
    pub fn into_parts(self) -> (SliceError, Vec<CapturedFrame>) {
        (self.error, self.frames)
    }
}

/// A failure before the first capture: nothing retained.
impl From<SliceError> for PartialRun {
    fn from(error: SliceError) -> Self {
        PartialRun {
            error,
            frames: Vec::new(),
        }
    }
}
