//! Start/end selection over the media timeline.
//!
//! [`TimeRangeModel`] holds two handles over `[0, duration]`. Drag edits
//! ([`set_start`](TimeRangeModel::set_start), [`set_end`](TimeRangeModel::set_end))
//! clamp themselves to keep at least [`MIN_GAP`] seconds between the
//! handles. Text edits ([`set_from_text`](TimeRangeModel::set_from_text))
//! are stricter: they are rejected outright unless the result is already a
//! valid range.

use crate::error::SliceError;

/// Smallest gap between start and end kept by drag edits, in seconds.
pub const MIN_GAP: f64 = 0.1;

/// Which end of the range an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeHandle {
    Start,
    End,
}

/// A snapshot of the selected window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Create a range. No validation: this is a plain value.
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the window in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Owner of the selected time window.
#[derive(Debug, Clone)]
pub struct TimeRangeModel {
    duration: f64,
    range: TimeRange,
}

impl TimeRangeModel {
    /// Select the whole of a `duration`-second timeline.
    pub fn new(duration: f64) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            range: TimeRange::new(0.0, duration),
        }
    }

    /// Switch to a new timeline and select all of it.
    pub fn reset(&mut self, duration: f64) {
        *self = Self::new(duration);
    }

    /// Current selection.
    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn start(&self) -> f64 {
        self.range.start
    }

    pub fn end(&self) -> f64 {
        self.range.end
    }

    /// Total timeline length.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Length of the selected window.
    pub fn selected_duration(&self) -> f64 {
        self.range.length()
    }

    /// Move the start handle, stopping [`MIN_GAP`] before the end.
    pub fn set_start(&mut self, seconds: f64) -> f64 {
        self.range.start = seconds.min(self.range.end - MIN_GAP).max(0.0);
        self.range.start
    }

    /// Move the end handle, stopping [`MIN_GAP`] after the start.
    pub fn set_end(&mut self, seconds: f64) -> f64 {
        self.range.end = seconds.max(self.range.start + MIN_GAP).min(self.duration);
        self.range.end
    }

    /// Move a handle to a fraction of the timeline (track drags).
    ///
    /// The fraction is clamped to `[0, 1]` first. A non-finite fraction
    /// leaves the handle where it is.
    pub fn set_from_fraction(&mut self, fraction: f64, handle: RangeHandle) -> f64 {
        if !fraction.is_finite() {
            return match handle {
                RangeHandle::Start => self.range.start,
                RangeHandle::End => self.range.end,
            };
        }
        let seconds = fraction.clamp(0.0, 1.0) * self.duration;
        match handle {
            RangeHandle::Start => self.set_start(seconds),
            RangeHandle::End => self.set_end(seconds),
        }
    }

    /// Set a handle from `MM:SS` / `MM:SS.mmm` text.
    ///
    /// Returns `Ok(true)` if the handle moved and `Ok(false)` if the value was
    /// well-formed but rejected because it would not leave `start < end`
    /// within `[0, duration]`. Unlike drag edits there is no clamping.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::MalformedTimeText`] for unparsable text. The
    /// range is not modified.
    pub fn set_from_text(&mut self, text: &str, handle: RangeHandle) -> Result<bool, SliceError> {
        let seconds = parse_time(text)?;
        let accepted = match handle {
            RangeHandle::Start if seconds < self.range.end => {
                self.range.start = seconds;
                true
            }
            RangeHandle::End if seconds > self.range.start && seconds <= self.duration => {
                self.range.end = seconds;
                true
            }
            _ => false,
        };
        if !accepted {
            log::debug!("Rejected {handle:?} time {text:?}: would cross the other handle");
        }
        Ok(accepted)
    }

    /// Handle positions as fractions of the timeline, `(start, end)`.
    pub fn handle_fractions(&self) -> (f64, f64) {
        if self.duration <= 0.0 {
            return (0.0, 0.0);
        }
        (
            self.range.start / self.duration,
            self.range.end / self.duration,
        )
    }
}

/// Slack added before truncating to whole milliseconds, so values that
/// came from `MM:SS.mmm` text format back to the same text.
const MILLIS_EPSILON: f64 = 1e-6;

/// Format seconds as `MM:SS.mmm`. Milliseconds are truncated, not rounded.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_millis = (seconds * 1000.0 + MILLIS_EPSILON).floor() as u64;
    let minutes = total_millis / 60_000;
    let whole = total_millis / 1000 % 60;
    let millis = total_millis % 1000;
    format!("{minutes:02}:{whole:02}.{millis:03}")
}

/// Parse `MM:SS` or `MM:SS.f…` into seconds.
///
/// Minutes and seconds are unbounded digit runs (`"00:75"` is 75 seconds).
/// Fractional digits past the third are dropped; fewer than three are read
/// as if right-padded with zeros (`".5"` is 500 ms).
///
/// # Errors
///
/// Returns [`SliceError::MalformedTimeText`] if the text does not match.
pub fn parse_time(text: &str) -> Result<f64, SliceError> {
    let malformed = || SliceError::MalformedTimeText(text.to_string());
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    let (minutes, rest) = text.split_once(':').ok_or_else(malformed)?;
    let (seconds, fraction) = match rest.split_once('.') {
        Some((seconds, fraction)) => (seconds, Some(fraction)),
        None => (rest, None),
    };

    if !digits(minutes) || !digits(seconds) || fraction.is_some_and(|f| !digits(f)) {
        return Err(malformed());
    }

    let minutes: u64 = minutes.parse().map_err(|_| malformed())?;
    let seconds: u64 = seconds.parse().map_err(|_| malformed())?;
    let millis: u64 = match fraction {
        Some(fraction) => {
            let truncated: String = fraction.chars().chain("000".chars()).take(3).collect();
            truncated.parse().map_err(|_| malformed())?
        }
        None => 0,
    };

    Ok(minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}
