//! Editing session tests: loading media, settings, preview, export, and the
//! preview gallery.

use std::io::Cursor;

use frameslice::session::{ASPECT_PRESETS, DEFAULT_INTERVAL, thumbnail_label};
use frameslice::{
    AspectPolicy, ExportPackager, MediaDimensions, MemorySource, Point, PointerEvent, Rect,
    SamplingOptions, SliceError, SliceSession, TimeRange,
};
use image::{Rgba, RgbaImage};
use zip::ZipArchive;

fn small() -> MediaDimensions {
    MediaDimensions::new(320, 240, 4.0).expect("valid dimensions")
}

fn session() -> SliceSession {
    SliceSession::new(small(), 640.0, 480.0).expect("valid container")
}

fn source(width: u32, height: u32) -> MemorySource {
    MemorySource::new(vec![
        (0.0, RgbaImage::from_pixel(width, height, Rgba([1, 1, 1, 255]))),
        (2.0, RgbaImage::from_pixel(width, height, Rgba([2, 2, 2, 255]))),
    ])
    .expect("frames")
}

// ── Settings ───────────────────────────────────────────────────────

#[test]
fn new_session_covers_whole_media() {
    let session = session();
    assert_eq!(session.crop().rect(), Rect::new(0, 0, 320, 240));
    assert_eq!(session.time_range().range(), TimeRange::new(0.0, 4.0));
    assert_eq!(session.interval(), DEFAULT_INTERVAL);
    assert_eq!(session.estimated_frame_count(), 5);
    assert!(session.preview_frames().is_empty());
}

#[test]
fn bad_intervals_fall_back_to_default() {
    let mut session = session();
    assert_eq!(session.set_interval(2.5), 2.5);
    assert_eq!(session.set_interval(0.0), DEFAULT_INTERVAL);
    assert_eq!(session.set_interval(-3.0), DEFAULT_INTERVAL);
    assert_eq!(session.set_interval(f64::NAN), DEFAULT_INTERVAL);
    assert_eq!(session.set_interval_text(" 0.25 "), 0.25);
    assert_eq!(session.set_interval_text("fast"), DEFAULT_INTERVAL);
}

#[tokio::test]
async fn tiny_interval_is_refused_not_sampled() {
    let mut session = session();
    assert_eq!(session.set_interval(1e-300), 1e-300);
    assert_eq!(session.estimated_frame_count(), u64::MAX);

    let partial = session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect_err("too many frames");
    assert!(matches!(partial.error, SliceError::TooManyFrames { .. }));
    assert!(session.preview_frames().is_empty());
}

#[test]
fn request_snapshots_current_settings() {
    let mut session = session();
    session.set_aspect(AspectPolicy::custom(1, 1));
    session.time_range_mut().set_start(1.0);
    session.set_interval(0.5);

    let request = session.request();
    assert_eq!(request.crop, Rect::new(40, 0, 240, 240));
    assert_eq!(request.range, TimeRange::new(1.0, 4.0));
    assert_eq!(request.interval, 0.5);

    session.set_interval(2.0);
    assert_eq!(request.interval, 0.5);
}

#[test]
fn every_aspect_preset_parses() {
    for name in ASPECT_PRESETS {
        assert!(AspectPolicy::parse(name).is_some(), "{name}");
    }
}

#[test]
fn reset_crop_keeps_policy() {
    let mut session = session();
    session.set_aspect(AspectPolicy::custom(1, 1));
    assert_eq!(session.reset_crop(), Rect::new(0, 0, 320, 240));
    assert_eq!(session.crop().policy(), AspectPolicy::Fixed(1.0));
}

#[test]
fn pointer_drags_move_the_crop() {
    let mut session = session();
    session.crop_mut().set_rect(Rect::new(100, 100, 100, 50));

    // Surface is drawn at 2× scale, so the crop center sits at (300, 250).
    session.handle_pointer(PointerEvent::Down(Point::new(300.0, 250.0)));
    let feedback = session.handle_pointer(PointerEvent::Move(Point::new(320.0, 270.0)));
    session.handle_pointer(PointerEvent::Up);

    assert_eq!(feedback.rect, Some(Rect::new(110, 110, 100, 50)));
    assert_eq!(session.crop().rect(), Rect::new(110, 110, 100, 50));
    assert!(!session.controller().is_dragging());
}

#[test]
fn resize_container_rejects_empty_surface() {
    let mut session = session();
    assert!(matches!(
        session.resize_container(0.0, 100.0),
        Err(SliceError::InvalidDimensions(_))
    ));
    assert_eq!(session.mapper().container_size(), (640.0, 480.0));
}

// ── Loading ────────────────────────────────────────────────────────

#[tokio::test]
async fn load_resets_crop_range_and_preview() {
    let mut session = session();
    session.set_aspect(AspectPolicy::custom(1, 1));
    session.time_range_mut().set_start(2.0);
    session.set_interval(2.0);
    session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect("preview should succeed");

    session
        .load(MediaDimensions::new(640, 360, 9.0).expect("valid dimensions"))
        .expect("load should succeed");

    assert_eq!(session.crop().rect(), Rect::new(0, 0, 640, 360));
    assert_eq!(session.time_range().range(), TimeRange::new(0.0, 9.0));
    assert!(session.preview_frames().is_empty());
    assert_eq!(session.interval(), 2.0);
    assert_eq!(session.crop().policy(), AspectPolicy::Fixed(1.0));
    assert_eq!(session.mapper().container_size(), (640.0, 480.0));
}

// ── Preview and export ─────────────────────────────────────────────

#[tokio::test]
async fn preview_samples_the_selection() {
    let mut session = session();
    session.set_aspect(AspectPolicy::custom(1, 1));
    session.set_interval(2.0);

    let frames = session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect("preview should succeed");

    let timestamps: Vec<f64> = frames.iter().map(|frame| frame.timestamp).collect();
    assert_eq!(timestamps, vec![0.0, 2.0, 4.0]);
    assert!(frames.iter().all(|frame| frame.pixels.dimensions() == (240, 240)));
    assert_eq!(frames[0].pixels.get_pixel(0, 0)[0], 1);
    assert_eq!(frames[1].pixels.get_pixel(0, 0)[0], 2);
    assert_eq!(session.preview_frames().len(), 3);
}

#[tokio::test]
async fn failed_preview_leaves_preview_empty() {
    let mut session = session();
    session.set_interval(2.0);
    session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect("preview should succeed");

    // Frames smaller than the crop cannot be captured.
    let partial = session
        .preview(&mut source(100, 100), &SamplingOptions::new())
        .await
        .expect_err("crop exceeds frames");

    assert!(matches!(partial.error, SliceError::CaptureFailed { .. }));
    assert!(session.preview_frames().is_empty());
}

#[tokio::test]
async fn export_generates_missing_preview() {
    let mut session = session();
    session.set_interval(2.0);

    let bytes = session
        .export(&mut source(320, 240), &SamplingOptions::new(), &ExportPackager::default())
        .await
        .expect("export should succeed");

    let archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    assert_eq!(archive.len(), 3);
    assert_eq!(session.preview_frames().len(), 3);
}

#[tokio::test]
async fn export_reuses_existing_preview() {
    let mut session = session();
    session.set_interval(2.0);
    session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect("preview should succeed");
    session.set_interval(0.5);

    let bytes = session
        .export(&mut source(320, 240), &SamplingOptions::new(), &ExportPackager::default())
        .await
        .expect("export should succeed");

    let archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    assert_eq!(archive.len(), 3);
}

// ── Gallery ────────────────────────────────────────────────────────

#[tokio::test]
async fn gallery_pages_and_wraps() {
    let mut session = session();
    session.set_aspect(AspectPolicy::custom(1, 1));
    session.set_interval(2.0);
    session
        .preview(&mut source(320, 240), &SamplingOptions::new())
        .await
        .expect("preview should succeed");

    let mut gallery = session.gallery();
    assert_eq!(gallery.len(), 3);
    assert_eq!(gallery.current().map(|frame| frame.ordinal), Some(1));

    assert_eq!(gallery.open(2).map(|frame| frame.ordinal), Some(2));
    assert_eq!(
        gallery.caption().expect("frame on display"),
        "Frame #2 / 3 | Time: 00:02.000 | Size: 240 × 240 px"
    );

    assert_eq!(gallery.show_next().map(|frame| frame.ordinal), Some(3));
    assert_eq!(gallery.show_next().map(|frame| frame.ordinal), Some(1));
    assert_eq!(gallery.show_previous().map(|frame| frame.ordinal), Some(3));

    assert!(gallery.open(9).is_none());
    assert_eq!(gallery.current().map(|frame| frame.ordinal), Some(3));

    let first = &session.preview_frames()[0];
    assert_eq!(thumbnail_label(first), "#1 (00:00.000)");
}

#[test]
fn empty_gallery_shows_nothing() {
    let session = session();
    let mut gallery = session.gallery();
    assert!(gallery.is_empty());
    assert!(gallery.current().is_none());
    assert!(gallery.show_next().is_none());
    assert!(gallery.show_previous().is_none());
    assert!(gallery.caption().is_none());
}
