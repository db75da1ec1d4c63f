//! Sampling pipeline tests: planning, ordered capture, partial failure,
//! cancellation, seek timeouts, and progress.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use frameslice::{
    CancellationToken, MAX_FRAMES, MediaSource, MemorySource, OperationType, ProgressCallback,
    ProgressInfo, Rect, SamplingOptions, SamplingRequest, SliceError, TimeRange,
    estimated_frame_count, plan, run, sample,
};
use frameslice::source::crop_image;
use image::{Rgba, RgbaImage};

/// A source whose frames are solid colors keyed by the seek count, with
/// optional scripted misbehavior.
struct ScriptedSource {
    width: u32,
    height: u32,
    seeks: Vec<f64>,
    fail_on_seek: Option<usize>,
    wrong_size: bool,
    stall: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedSource {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seeks: Vec::new(),
            fail_on_seek: None,
            wrong_size: false,
            stall: false,
            cancel_after: None,
        }
    }
}

impl MediaSource for ScriptedSource {
    async fn seek(&mut self, timestamp: f64) -> Result<(), SliceError> {
        self.seeks.push(timestamp);
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail_on_seek == Some(self.seeks.len()) {
            return Err(SliceError::FfmpegError("decoder stalled".to_string()));
        }
        Ok(())
    }

    fn current_frame_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn capture_region(&mut self, region: Rect) -> Result<RgbaImage, SliceError> {
        if let Some((count, token)) = &self.cancel_after {
            if self.seeks.len() == *count {
                token.cancel();
            }
        }
        let shade = self.seeks.len() as u8;
        let (width, height) = if self.wrong_size {
            (region.w + 1, region.h)
        } else {
            (region.w, region.h)
        };
        Ok(RgbaImage::from_pixel(width, height, Rgba([shade, 0, 0, 255])))
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.events.lock().expect("progress lock").push(info.clone());
    }
}

fn crop() -> Rect {
    Rect::new(10, 20, 64, 32)
}

// ── Planning ───────────────────────────────────────────────────────

#[test]
fn plan_steps_through_whole_seconds() {
    let timestamps = plan(&TimeRange::new(0.0, 5.0), 1.0).expect("valid interval");
    assert_eq!(timestamps, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn plan_does_not_snap_to_end() {
    let timestamps = plan(&TimeRange::new(0.0, 4.5), 2.0).expect("valid interval");
    assert_eq!(timestamps, vec![0.0, 2.0, 4.0]);
}

#[test]
fn plan_interval_longer_than_range_yields_start() {
    let timestamps = plan(&TimeRange::new(3.0, 3.5), 10.0).expect("valid interval");
    assert_eq!(timestamps, vec![3.0]);
}

#[test]
fn plan_rejects_bad_intervals() {
    for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        match plan(&TimeRange::new(0.0, 5.0), interval) {
            Err(SliceError::InvalidInterval(_)) => {}
            other => panic!("Expected InvalidInterval for {interval}, got: {other:?}"),
        }
    }
}

#[test]
fn estimate_counts_frames() {
    assert_eq!(estimated_frame_count(&TimeRange::new(0.0, 5.0), 1.0).expect("valid"), 6);
    assert_eq!(estimated_frame_count(&TimeRange::new(0.0, 4.5), 2.0).expect("valid"), 3);
    assert_eq!(estimated_frame_count(&TimeRange::new(2.0, 2.1), 1.0).expect("valid"), 1);
    assert!(estimated_frame_count(&TimeRange::new(0.0, 1.0), 0.0).is_err());
}

#[test]
fn plan_rejects_non_finite_bounds() {
    for range in [
        TimeRange::new(0.0, f64::NAN),
        TimeRange::new(0.0, f64::INFINITY),
        TimeRange::new(f64::NEG_INFINITY, 1.0),
    ] {
        match plan(&range, 1.0) {
            Err(SliceError::InvalidRange { .. }) => {}
            other => panic!("Expected InvalidRange for {range:?}, got: {other:?}"),
        }
        assert!(matches!(
            estimated_frame_count(&range, 1.0),
            Err(SliceError::InvalidRange { .. })
        ));
    }
}

#[test]
fn plan_refuses_more_frames_than_ordinals() {
    // 5.0 + k * 1e-30 never moves past 5.0, so the count is the only bound.
    match plan(&TimeRange::new(5.0, 5.5), 1e-30) {
        Err(SliceError::TooManyFrames { requested, limit }) => {
            assert_eq!(limit, MAX_FRAMES);
            assert!(requested > MAX_FRAMES as f64);
        }
        other => panic!("Expected TooManyFrames, got: {other:?}"),
    }
    assert!(matches!(
        plan(&TimeRange::new(-f64::MAX, f64::MAX), 1.0),
        Err(SliceError::TooManyFrames { .. })
    ));
}

#[test]
fn estimate_saturates_for_tiny_intervals() {
    let range = TimeRange::new(0.0, 4.0);
    assert_eq!(estimated_frame_count(&range, 1e-300).expect("valid interval"), u64::MAX);
    assert_eq!(
        estimated_frame_count(&TimeRange::new(-f64::MAX, f64::MAX), 1.0).expect("valid"),
        u64::MAX
    );
}

// ── Capture ────────────────────────────────────────────────────────

#[tokio::test]
async fn run_captures_every_timestamp_in_order() {
    let mut source = ScriptedSource::new(320, 240);
    let timestamps = [0.0, 0.5, 1.0, 1.5];

    let frames = run(&timestamps, crop(), &mut source, &SamplingOptions::new())
        .await
        .expect("run should complete");

    assert_eq!(frames.len(), 4);
    assert_eq!(source.seeks, timestamps);
    for (index, frame) in frames.iter().enumerate() {
        assert_eq!(frame.ordinal, index as u32 + 1);
        assert_eq!(frame.timestamp, timestamps[index]);
        assert_eq!(frame.pixels.dimensions(), (64, 32));
        // Each frame comes from the seek just before it.
        assert_eq!(frame.pixels.get_pixel(0, 0)[0], index as u8 + 1);
    }
}

#[tokio::test]
async fn sample_plans_then_runs() {
    let mut source = ScriptedSource::new(320, 240);
    let request = SamplingRequest::new(crop(), TimeRange::new(1.0, 3.0), 0.5);

    let frames = sample(&request, &mut source, &SamplingOptions::new())
        .await
        .expect("sample should complete");

    assert_eq!(frames.len(), 5);
    assert_eq!(source.seeks, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
}

#[tokio::test]
async fn memory_source_crops_the_frame_on_screen() {
    let early = RgbaImage::from_pixel(100, 100, Rgba([10, 0, 0, 255]));
    let mut late = RgbaImage::from_pixel(100, 100, Rgba([20, 0, 0, 255]));
    late.put_pixel(50, 50, Rgba([99, 0, 0, 255]));
    let mut source = MemorySource::new(vec![(2.0, late), (0.0, early)]).expect("frames");

    let frames = run(&[0.0, 1.9, 2.0, 5.0], Rect::new(50, 50, 20, 20), &mut source, &SamplingOptions::new())
        .await
        .expect("run should complete");

    let shades: Vec<u8> = frames.iter().map(|frame| frame.pixels.get_pixel(0, 0)[0]).collect();
    assert_eq!(shades, vec![10, 10, 99, 99]);
    assert_eq!(source.current_timestamp(), 2.0);
}

#[tokio::test]
async fn sample_with_invalid_interval_touches_nothing() {
    let mut source = ScriptedSource::new(320, 240);
    let request = SamplingRequest::new(crop(), TimeRange::new(0.0, 3.0), 0.0);

    let partial = sample(&request, &mut source, &SamplingOptions::new())
        .await
        .expect_err("interval is invalid");

    assert!(matches!(partial.error, SliceError::InvalidInterval(_)));
    assert!(partial.frames.is_empty());
    assert!(source.seeks.is_empty());
}

#[tokio::test]
async fn sample_with_unnumberable_plan_touches_nothing() {
    let mut source = ScriptedSource::new(320, 240);
    let request = SamplingRequest::new(crop(), TimeRange::new(5.0, 5.5), 1e-30);

    let partial = sample(&request, &mut source, &SamplingOptions::new())
        .await
        .expect_err("plan is too large");

    assert!(matches!(partial.error, SliceError::TooManyFrames { .. }));
    assert!(partial.frames.is_empty());
    assert!(source.seeks.is_empty());
}

// ── Partial failure ────────────────────────────────────────────────

#[tokio::test]
async fn failure_keeps_frames_captured_before_it() {
    let mut source = ScriptedSource::new(320, 240);
    source.fail_on_seek = Some(3);

    let partial = run(&[0.0, 1.0, 2.0, 3.0, 4.0], crop(), &mut source, &SamplingOptions::new())
        .await
        .expect_err("third seek fails");

    assert_eq!(partial.frames.len(), 2);
    assert_eq!(partial.last_ordinal(), 2);
    match &partial.error {
        SliceError::CaptureFailed {
            last_ordinal,
            timestamp,
            reason,
        } => {
            assert_eq!(*last_ordinal, 2);
            assert_eq!(*timestamp, 2.0);
            assert!(reason.contains("decoder stalled"), "{reason}");
        }
        other => panic!("Expected CaptureFailed, got: {other:?}"),
    }
    // Nothing after the failure is attempted.
    assert_eq!(source.seeks.len(), 3);
}

#[tokio::test]
async fn first_timestamp_failure_retains_nothing() {
    let mut source = ScriptedSource::new(320, 240);
    source.fail_on_seek = Some(1);

    let partial = run(&[0.0, 1.0], crop(), &mut source, &SamplingOptions::new())
        .await
        .expect_err("first seek fails");

    assert!(partial.frames.is_empty());
    assert_eq!(partial.last_ordinal(), 0);
}

#[tokio::test]
async fn wrong_buffer_size_is_a_capture_failure() {
    let mut source = ScriptedSource::new(320, 240);
    source.wrong_size = true;

    let partial = run(&[0.0], crop(), &mut source, &SamplingOptions::new())
        .await
        .expect_err("size mismatch");

    match partial.error {
        SliceError::CaptureFailed { reason, .. } => assert!(reason.contains("65×32"), "{reason}"),
        other => panic!("Expected CaptureFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn crop_outside_frame_is_a_capture_failure() {
    let mut source = ScriptedSource::new(60, 40);

    let partial = run(&[0.0], crop(), &mut source, &SamplingOptions::new())
        .await
        .expect_err("crop exceeds frame");

    assert!(matches!(partial.error, SliceError::CaptureFailed { .. }));
}

#[tokio::test]
async fn crop_at_far_edge_fails_without_overflow() {
    let mut source = MemorySource::new(vec![(0.0, RgbaImage::new(64, 64))]).expect("frames");
    let request = SamplingRequest::new(Rect::new(u32::MAX, 0, 10, 10), TimeRange::new(0.0, 1.0), 1.0);

    let partial = sample(&request, &mut source, &SamplingOptions::new())
        .await
        .expect_err("crop exceeds frame");

    assert!(matches!(partial.error, SliceError::CaptureFailed { .. }));
    assert!(partial.frames.is_empty());
    assert!(matches!(
        crop_image(&RgbaImage::new(64, 64), Rect::new(0, u32::MAX, 10, 10)),
        Err(SliceError::CaptureFailed { .. })
    ));
}

#[tokio::test]
async fn partial_run_splits_into_parts() {
    let mut source = ScriptedSource::new(320, 240);
    source.fail_on_seek = Some(2);

    let partial = run(&[0.0, 1.0], crop(), &mut source, &SamplingOptions::new())
        .await
        .expect_err("second seek fails");
    assert!(partial.to_string().contains("1 frame(s) retained"));

    let (error, frames) = partial.into_parts();
    assert!(matches!(error, SliceError::CaptureFailed { last_ordinal: 1, .. }));
    assert_eq!(frames.len(), 1);
}

// ── Cancellation and timeouts ──────────────────────────────────────

#[tokio::test]
async fn cancellation_stops_between_timestamps() {
    let token = CancellationToken::new();
    let mut source = ScriptedSource::new(320, 240);
    source.cancel_after = Some((2, token.clone()));
    let options = SamplingOptions::new().with_cancellation(token);

    let partial = run(&[0.0, 1.0, 2.0, 3.0], crop(), &mut source, &options)
        .await
        .expect_err("cancelled mid-run");

    assert!(matches!(partial.error, SliceError::Cancelled));
    // The capture that set the token still completes.
    assert_eq!(partial.frames.len(), 2);
    assert_eq!(source.seeks.len(), 2);
}

#[tokio::test]
async fn cancelled_before_start_captures_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let mut source = ScriptedSource::new(320, 240);
    let options = SamplingOptions::new().with_cancellation(token);

    let partial = run(&[0.0, 1.0], crop(), &mut source, &options)
        .await
        .expect_err("already cancelled");

    assert!(matches!(partial.error, SliceError::Cancelled));
    assert!(source.seeks.is_empty());
}

#[tokio::test]
async fn stalled_seek_times_out() {
    let mut source = ScriptedSource::new(320, 240);
    source.stall = true;
    let options = SamplingOptions::new().with_seek_timeout(Duration::from_millis(20));

    let partial = run(&[1.5, 2.5], crop(), &mut source, &options)
        .await
        .expect_err("seek never lands");

    match partial.error {
        SliceError::SeekTimeout {
            timestamp,
            last_ordinal,
        } => {
            assert_eq!(timestamp, 1.5);
            assert_eq!(last_ordinal, 0);
        }
        other => panic!("Expected SeekTimeout, got: {other:?}"),
    }
}

// ── Progress ───────────────────────────────────────────────────────

#[tokio::test]
async fn progress_reports_every_frame() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = SamplingOptions::new().with_progress(recorder.clone());
    let mut source = ScriptedSource::new(320, 240);

    run(&[0.0, 1.0, 2.0], crop(), &mut source, &options)
        .await
        .expect("run should complete");

    let events = recorder.events.lock().expect("progress lock");
    assert_eq!(events.len(), 3);
    for (index, info) in events.iter().enumerate() {
        assert_eq!(info.operation, OperationType::FrameSampling);
        assert_eq!(info.current, index as u64 + 1);
        assert_eq!(info.total, 3);
        assert_eq!(info.current_ordinal, Some(index as u32 + 1));
        assert_eq!(info.current_timestamp, Some(index as f64));
    }
    assert_eq!(events[2].percentage, 100.0);
}

#[tokio::test]
async fn progress_batches_but_always_reports_last_frame() {
    let recorder = Arc::new(RecordingProgress::default());
    let options = SamplingOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(2);
    let mut source = ScriptedSource::new(320, 240);

    run(&[0.0, 1.0, 2.0, 3.0, 4.0], crop(), &mut source, &options)
        .await
        .expect("run should complete");

    let events = recorder.events.lock().expect("progress lock");
    let reported: Vec<u64> = events.iter().map(|info| info.current).collect();
    assert_eq!(reported, vec![2, 4, 5]);
}

#[tokio::test]
async fn closures_work_as_progress_callbacks() {
    let seen = Arc::new(Mutex::new(0u64));
    let counter = seen.clone();
    let options = SamplingOptions::new().with_progress(Arc::new(move |info: &ProgressInfo| {
        *counter.lock().expect("counter lock") = info.current;
    }));
    let mut source = ScriptedSource::new(320, 240);

    run(&[0.0, 1.0], crop(), &mut source, &options)
        .await
        .expect("run should complete");

    assert_eq!(*seen.lock().expect("counter lock"), 2);
}
