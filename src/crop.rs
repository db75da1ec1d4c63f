//! Crop rectangle model.
//!
//! [`CropModel`] owns the crop [`Rect`] (in video pixels) and the active
//! [`AspectPolicy`]. Every mutation goes through one of its operations, and
//! every operation clamps its candidate in the same order:
//!
//! 1. aspect ratio (height derived from width),
//! 2. minimum size floor ([`MIN_SIZE`]),
//! 3. position clamp into the frame,
//! 4. size clamp against the frame edge, shrinking toward the fixed edge.
//!
//! The order runs once per operation and never produces an inverted or
//! out-of-frame rectangle, whatever the delta.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::geometry::{MediaDimensions, Point};

/// Smallest allowed crop side, in video pixels.
///
/// Frames narrower or shorter than this use the frame size as the floor on
/// that axis.
pub const MIN_SIZE: u32 = 20;

/// A crop region in video pixels.
///
/// Any `Rect` can be handed to [`CropModel::set_rect`]; the one stored in the
/// model always satisfies `w, h >= MIN_SIZE` and lies inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (`x + w`), saturating at `u32::MAX`.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// Bottom edge (`y + h`), saturating at `u32::MAX`.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.w as f64 / self.h as f64
    }

    /// Center point in video space.
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.w as f64 / 2.0,
            self.y as f64 + self.h as f64 / 2.0,
        )
    }

    /// Whether this rectangle satisfies the crop invariants for `dimensions`.
    pub fn fits(&self, dimensions: &MediaDimensions) -> bool {
        let (min_w, min_h) = min_size(dimensions);
        self.w >= min_w
            && self.h >= min_h
            && self.right() <= dimensions.width()
            && self.bottom() <= dimensions.height()
    }
}

impl Display for Rect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}×{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// A corner of the crop rectangle, used as a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    /// All corners in hit-test order.
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    /// Whether dragging this corner moves the left edge.
    pub fn moves_left(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::SouthWest)
    }

    /// Whether dragging this corner moves the top edge.
    pub fn moves_top(self) -> bool {
        matches!(self, Corner::NorthWest | Corner::NorthEast)
    }
}

/// Whether and how resizes preserve the crop's width-to-height ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectPolicy {
    /// No constraint.
    #[default]
    Free,
    /// The source media's own ratio.
    Original,
    /// A fixed `width / height` ratio. Non-positive or non-finite values are
    /// treated as [`Free`](AspectPolicy::Free).
    Fixed(f64),
}

impl AspectPolicy {
    /// Fixed ratio from `width:height` parts.
    ///
    /// A zero part falls back to the 16:9 default for that part.
    pub fn custom(width: u32, height: u32) -> Self {
        let width = if width == 0 { 16 } else { width };
        let height = if height == 0 { 9 } else { height };
        AspectPolicy::Fixed(width as f64 / height as f64)
    }

    /// Parse a policy name: `free`, `original`, or `W:H` (for example
    /// `16:9`, `1:1`, `9:16`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(AspectPolicy::Free),
            "original" | "source" => Some(AspectPolicy::Original),
            other => {
                let (width, height) = other.split_once(':')?;
                let width = width.trim().parse::<u32>().ok()?;
                let height = height.trim().parse::<u32>().ok()?;
                if width == 0 || height == 0 {
                    return None;
                }
                Some(AspectPolicy::custom(width, height))
            }
        }
    }

    /// The active ratio for media of the given size, `None` when
    /// unconstrained.
    pub fn ratio_for(&self, dimensions: &MediaDimensions) -> Option<f64> {
        match *self {
            AspectPolicy::Free => None,
            AspectPolicy::Original => Some(dimensions.aspect_ratio()),
            AspectPolicy::Fixed(ratio) if ratio.is_finite() && ratio > 0.0 => Some(ratio),
            AspectPolicy::Fixed(_) => None,
        }
    }
}

/// Which edge of an axis stays put while the other one follows the pointer.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// The low edge (left / top) sits at this coordinate.
    Start(f64),
    /// The high edge (right / bottom) sits at this coordinate.
    End(f64),
}

impl Anchor {
    /// Clamp the anchor so a rect of at least `min` fits between it and the
    /// frame edge at `bound`.
    fn clamped(self, min: f64, bound: f64) -> Self {
        match self {
            Anchor::Start(start) => Anchor::Start(start.max(0.0).min(bound - min)),
            Anchor::End(end) => Anchor::End(end.max(min).min(bound)),
        }
    }

    /// Largest extent that fits between the anchor and the frame edge.
    fn room(self, bound: f64) -> f64 {
        match self {
            Anchor::Start(start) => bound - start,
            Anchor::End(end) => end,
        }
    }

    fn origin(self, extent: f64) -> f64 {
        match self {
            Anchor::Start(start) => start,
            Anchor::End(end) => end - extent,
        }
    }
}

/// Owner of the crop rectangle and its aspect policy.
#[derive(Debug, Clone)]
pub struct CropModel {
    dimensions: MediaDimensions,
    rect: Rect,
    policy: AspectPolicy,
}

impl CropModel {
    /// Create a model covering the full frame with no aspect constraint.
    pub fn new(dimensions: MediaDimensions) -> Self {
        Self {
            dimensions,
            rect: full_frame(&dimensions),
            policy: AspectPolicy::Free,
        }
    }

    /// Switch to new media and select its full frame. The policy is kept.
    pub fn reset(&mut self, dimensions: MediaDimensions) {
        self.dimensions = dimensions;
        self.rect = full_frame(&dimensions);
        log::debug!("Crop reset to full frame {}", self.rect);
    }

    /// The current crop rectangle.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The current aspect policy.
    pub fn policy(&self) -> AspectPolicy {
        self.policy
    }

    /// The media the crop applies to.
    pub fn dimensions(&self) -> MediaDimensions {
        self.dimensions
    }

    /// The active ratio, `None` for [`AspectPolicy::Free`].
    pub fn ratio(&self) -> Option<f64> {
        self.policy.ratio_for(&self.dimensions)
    }

    /// Replace the rectangle with a clamped copy of `candidate`.
    ///
    /// Sizes are raised to the minimum and lowered to the frame, then the
    /// position is pulled into `[0, width - w] × [0, height - h]`. The ratio
    /// policy is not applied.
    pub fn set_rect(&mut self, candidate: Rect) -> Rect {
        self.rect = clamp_rect(candidate, &self.dimensions);
        log::trace!("Crop set to {} (candidate {candidate})", self.rect);
        self.rect
    }

    /// Translate `base` by a video-space delta, keeping its size.
    pub fn apply_move(&mut self, delta_x: f64, delta_y: f64, base: Rect) -> Rect {
        let base = clamp_rect(base, &self.dimensions);
        let max_x = (self.dimensions.width() - base.w) as f64;
        let max_y = (self.dimensions.height() - base.h) as f64;
        let x = (base.x as f64 + delta_x).max(0.0).min(max_x);
        let y = (base.y as f64 + delta_y).max(0.0).min(max_y);
        self.rect = clamp_rect(
            Rect::new(round_to_u32(x), round_to_u32(y), base.w, base.h),
            &self.dimensions,
        );
        self.rect
    }

    /// Resize `base` by dragging `corner` through a video-space delta.
    ///
    /// The two edges adjacent to `corner` follow the delta, the opposite two
    /// stay fixed. With a locked ratio the height is derived from the new
    /// width. Dragging an edge past its opposite edge stops at the minimum
    /// size instead of flipping the rectangle.
    pub fn apply_resize(&mut self, corner: Corner, delta_x: f64, delta_y: f64, base: Rect) -> Rect {
        let base = clamp_rect(base, &self.dimensions);
        let (x, y, w, h) = (base.x as f64, base.y as f64, base.w as f64, base.h as f64);

        let (anchor_x, width) = if corner.moves_left() {
            (Anchor::End(x + w), w - delta_x)
        } else {
            (Anchor::Start(x), w + delta_x)
        };
        let (anchor_y, height) = if corner.moves_top() {
            (Anchor::End(y + h), h - delta_y)
        } else {
            (Anchor::Start(y), h + delta_y)
        };

        self.rect = self.fit(anchor_x, anchor_y, width, height);
        self.rect
    }

    /// Select the bounding box of two video-space points.
    ///
    /// Points outside the frame are pulled onto its edge first. The box grows
    /// from its top-left corner when the minimum size or a locked ratio
    /// changes its extent.
    pub fn apply_new_selection(&mut self, pointer_down: Point, pointer_now: Point) -> Rect {
        let frame_w = self.dimensions.width() as f64;
        let frame_h = self.dimensions.height() as f64;
        let clip = |point: Point| {
            Point::new(
                point.x.max(0.0).min(frame_w),
                point.y.max(0.0).min(frame_h),
            )
        };
        let (down, now) = (clip(pointer_down), clip(pointer_now));

        self.rect = self.fit(
            Anchor::Start(down.x.min(now.x)),
            Anchor::Start(down.y.min(now.y)),
            (now.x - down.x).abs(),
            (now.y - down.y).abs(),
        );
        self.rect
    }

    /// Switch the aspect policy and conform the rectangle to it.
    ///
    /// The rectangle keeps its center and shrinks along whichever side
    /// over-satisfies the new ratio, then is pulled back into the frame.
    /// Switching to [`AspectPolicy::Free`] leaves the rectangle unchanged.
    pub fn apply_ratio(&mut self, policy: AspectPolicy) -> Rect {
        self.policy = policy;
        let Some(ratio) = self.ratio() else {
            return self.rect;
        };

        let (min_w, min_h) = min_size_f64(&self.dimensions);
        let center = self.rect.center();
        let (mut w, mut h) = (self.rect.w as f64, self.rect.h as f64);
        if w / h > ratio {
            w = h * ratio;
        } else {
            h = w / ratio;
        }
        w = w.max(min_w);
        h = h.max(min_h);

        let frame_w = self.dimensions.width() as f64;
        let frame_h = self.dimensions.height() as f64;
        let x = (center.x - w / 2.0).max(0.0).min(frame_w - w);
        let y = (center.y - h / 2.0).max(0.0).min(frame_h - h);

        self.rect = round_edges(x, y, w, h, &self.dimensions);
        log::debug!("Applied ratio {ratio:.4}: crop is now {}", self.rect);
        self.rect
    }

    /// Shared clamp pipeline for operations that grow a rect from anchors.
    fn fit(&self, anchor_x: Anchor, anchor_y: Anchor, width: f64, height: f64) -> Rect {
        let (min_w, min_h) = min_size_f64(&self.dimensions);
        let frame_w = self.dimensions.width() as f64;
        let frame_h = self.dimensions.height() as f64;
        let ratio = self.ratio();

        let (mut w, mut h) = (width, height);
        if let Some(ratio) = ratio {
            h = w / ratio;
        }

        w = w.max(min_w);
        h = h.max(min_h);

        let anchor_x = anchor_x.clamped(min_w, frame_w);
        let anchor_y = anchor_y.clamped(min_h, frame_h);

        let room_w = anchor_x.room(frame_w);
        let room_h = anchor_y.room(frame_h);
        let clamped = w > room_w || h > room_h;
        w = w.min(room_w);
        h = h.min(room_h);

        // A frame edge cut one side short: shrink the other side to match.
        if let Some(ratio) = ratio.filter(|_| clamped) {
            if w / h > ratio {
                w = (h * ratio).max(min_w);
            } else {
                h = (w / ratio).max(min_h);
            }
        }

        round_edges(anchor_x.origin(w), anchor_y.origin(h), w, h, &self.dimensions)
    }
}

fn full_frame(dimensions: &MediaDimensions) -> Rect {
    Rect::new(0, 0, dimensions.width(), dimensions.height())
}

fn min_size(dimensions: &MediaDimensions) -> (u32, u32) {
    (
        MIN_SIZE.min(dimensions.width()),
        MIN_SIZE.min(dimensions.height()),
    )
}

fn min_size_f64(dimensions: &MediaDimensions) -> (f64, f64) {
    let (min_w, min_h) = min_size(dimensions);
    (min_w as f64, min_h as f64)
}

/// Integer clamp: size into `[min, frame]`, then position into the frame.
fn clamp_rect(candidate: Rect, dimensions: &MediaDimensions) -> Rect {
    let (min_w, min_h) = min_size(dimensions);
    let w = candidate.w.clamp(min_w, dimensions.width());
    let h = candidate.h.clamp(min_h, dimensions.height());
    Rect::new(
        candidate.x.min(dimensions.width() - w),
        candidate.y.min(dimensions.height() - h),
        w,
        h,
    )
}

/// Round edges rather than origin and size so `x + w` never overshoots.
fn round_edges(x: f64, y: f64, w: f64, h: f64, dimensions: &MediaDimensions) -> Rect {
    let left = round_to_u32(x);
    let top = round_to_u32(y);
    let right = round_to_u32(x + w);
    let bottom = round_to_u32(y + h);
    clamp_rect(
        Rect::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        ),
        dimensions,
    )
}

fn round_to_u32(value: f64) -> u32 {
    // `as` saturates: negatives and NaN become 0.
    value.round() as u32
}
