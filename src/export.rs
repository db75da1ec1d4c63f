//! Packaging captured frames into a downloadable archive.
//!
//! [`ExportPackager`] encodes every [`CapturedFrame`] as PNG and writes it
//! into an archive entry named after its ordinal (`frame_0001.png`,
//! `frame_0002.png`, …), in ordinal order. The archive format sits behind
//! the [`ArchiveWriter`] seam; [`ZipArchiveWriter`] is the default.
//!
//! # Example
//!
//! ```no_run
//! use frameslice::{ExportOptions, ExportPackager, MemorySource, Rect, SamplingOptions,
//!     SamplingRequest, TimeRange};
//! use image::RgbaImage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = MemorySource::new(vec![(0.0, RgbaImage::new(320, 240))])?;
//! let request = SamplingRequest::new(Rect::new(0, 0, 160, 120), TimeRange::new(0.0, 3.0), 1.0);
//! let frames = frameslice::sample(&request, &mut source, &SamplingOptions::new()).await?;
//!
//! let packager = ExportPackager::new(ExportOptions::new());
//! let path = packager.save(&frames, "exports")?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{ImageFormat, RgbaImage};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::{Compression, ExportOptions};
use crate::error::SliceError;
use crate::progress::{OperationType, ProgressTracker};
use crate::sampling::CapturedFrame;

/// Destination for named archive entries.
pub trait ArchiveWriter {
    /// Append an entry.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SliceError>;

    /// Close the archive and return its bytes.
    fn finalize(self) -> Result<Vec<u8>, SliceError>
    where
        Self: Sized;
}

/// In-memory zip archive.
///
/// Entry names must be unique; adding a name twice is an error rather than
/// a silent overwrite.
pub struct ZipArchiveWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    names: HashSet<String>,
}

impl ZipArchiveWriter {
    pub fn new(compression: Compression) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(compression.to_zip_method()),
            names: HashSet::new(),
        }
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SliceError> {
        if !self.names.insert(name.to_string()) {
            return Err(SliceError::DuplicateEntry(name.to_string()));
        }
        self.writer.start_file(name, self.options)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finalize(self) -> Result<Vec<u8>, SliceError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Encode a frame's pixels as PNG.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, SliceError> {
    let mut buffer = Cursor::new(Vec::new());
    pixels.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Turns captured frames into a named archive.
#[derive(Debug, Clone, Default)]
pub struct ExportPackager {
    options: ExportOptions,
}

impl ExportPackager {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Entry name for a frame ordinal: `frame_0007.png`.
    ///
    /// Ordinals are zero-padded to four digits; larger ordinals simply use
    /// more digits.
    pub fn entry_name(&self, ordinal: u32) -> String {
        format!("{}_{ordinal:04}.png", self.options.entry_prefix)
    }

    /// File name for a new archive, stamped with the current time in
    /// milliseconds since the Unix epoch: `frames_1760400000000.zip`.
    pub fn archive_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!("{}_{millis}.zip", self.options.archive_prefix)
    }

    /// Package frames into a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::DuplicateEntry`] if two frames share an ordinal,
    /// or encoding / archive errors.
    pub fn package(&self, frames: &[CapturedFrame]) -> Result<Vec<u8>, SliceError> {
        self.package_into(frames, ZipArchiveWriter::new(self.options.compression))
    }

    /// Package frames into any [`ArchiveWriter`].
    ///
    /// Entries are written in ordinal order regardless of slice order.
    /// Progress is reported after each entry.
    ///
    /// # Errors
    ///
    /// Same as [`package`](ExportPackager::package).
    pub fn package_into<W: ArchiveWriter>(
        &self,
        frames: &[CapturedFrame],
        mut writer: W,
    ) -> Result<Vec<u8>, SliceError> {
        let mut ordered: Vec<&CapturedFrame> = frames.iter().collect();
        ordered.sort_by_key(|frame| frame.ordinal);

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::Packaging,
            ordered.len() as u64,
            1,
        );

        for frame in ordered {
            let name = self.entry_name(frame.ordinal);
            let png = encode_png(&frame.pixels)?;
            writer.add_entry(&name, &png)?;
            tracker.advance(Some(frame.ordinal), Some(frame.timestamp));
        }

        let bytes = writer.finalize()?;
        log::debug!(
            "Packaged {} frame(s) into {} byte archive",
            frames.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Package frames and write the archive into `directory` under a fresh
    /// [`archive_name`](ExportPackager::archive_name).
    ///
    /// # Errors
    ///
    /// Packaging errors, or [`SliceError::IoError`] if the file cannot be
    /// written.
    pub fn save<P: AsRef<Path>>(
        &self,
        frames: &[CapturedFrame],
        directory: P,
    ) -> Result<PathBuf, SliceError> {
        let bytes = self.package(frames)?;
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let path = directory.join(self.archive_name());
        fs::write(&path, bytes)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }
}
