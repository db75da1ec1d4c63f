//! Sampling and export configuration.
//!
//! [`SamplingOptions`] and [`ExportOptions`] are builders that thread
//! progress callbacks, cancellation tokens, and tuning settings through the
//! pipeline without polluting every function signature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use frameslice::{CancellationToken, ProgressInfo, SamplingOptions};
//!
//! let token = CancellationToken::new();
//! let options = SamplingOptions::new()
//!     .with_progress(Arc::new(|info: &ProgressInfo| {
//!         println!("{}/{}", info.current, info.total);
//!     }))
//!     .with_cancellation(token.clone())
//!     .with_seek_timeout(Duration::from_secs(5));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use zip::CompressionMethod;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Configuration for a sampling run.
///
/// All fields have defaults: no progress callback, no cancellation, a
/// callback after every frame, and no seek timeout.
#[derive(Clone)]
pub struct SamplingOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    /// Upper bound on how long one seek may take to land.
    pub(crate) seek_timeout: Option<Duration>,
}

impl Debug for SamplingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplingOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("seek_timeout", &self.seek_timeout)
            .finish()
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            seek_timeout: None,
        }
    }

    /// Attach a progress callback.
    ///
    /// The callback fires every [`batch_size`](SamplingOptions::with_batch_size)
    /// frames and always after the last one.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// The run checks the token between timestamps and stops with
    /// [`SliceError::Cancelled`](crate::SliceError::Cancelled), keeping the
    /// frames captured so far.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Fail a seek with [`SliceError::SeekTimeout`](crate::SliceError::SeekTimeout)
    /// if the source has not landed within `timeout`.
    #[must_use]
    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = Some(timeout);
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// How archive entries are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Deflate. This is the default.
    #[default]
    Deflated,
    /// No compression; PNG data is already compressed.
    Stored,
}

impl Compression {
    pub(crate) fn to_zip_method(self) -> CompressionMethod {
        match self {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Configuration for packaging frames into an archive.
#[derive(Clone)]
pub struct ExportOptions {
    /// Entry name prefix, `frame` gives `frame_0001.png`.
    pub(crate) entry_prefix: String,
    /// Archive name prefix, `frames` gives `frames_<millis>.zip`.
    pub(crate) archive_prefix: String,
    pub(crate) compression: Compression,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("entry_prefix", &self.entry_prefix)
            .field("archive_prefix", &self.archive_prefix)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            entry_prefix: "frame".to_string(),
            archive_prefix: "frames".to_string(),
            compression: Compression::default(),
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Set the entry name prefix.
    #[must_use]
    pub fn with_entry_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entry_prefix = prefix.into();
        self
    }

    /// Set the archive file name prefix.
    #[must_use]
    pub fn with_archive_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.archive_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Attach a progress callback, fired after every written entry.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }
}
