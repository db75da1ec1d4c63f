//! Video-space ↔ presentation-space coordinate mapping.
//!
//! A loaded video is drawn onto a container surface with *contain-fit*
//! scaling: it is scaled to fit entirely inside the container, preserving
//! its aspect ratio, and centered on the shorter axis (letterbox or
//! pillarbox). [`CoordinateMapper`] owns that geometry and converts points
//! in both directions.
//!
//! # Example
//!
//! ```
//! use frameslice::{CoordinateMapper, MediaDimensions, Point};
//!
//! let dimensions = MediaDimensions::new(1920, 1080, 10.0)?;
//! let mapper = CoordinateMapper::new(dimensions, 960.0, 720.0)?;
//!
//! // 16:9 inside 4:3 → letterboxed with a vertical offset.
//! let geometry = mapper.geometry();
//! assert_eq!(geometry.display_width, 960.0);
//! assert_eq!(geometry.offset_y, 90.0);
//!
//! let on_screen = mapper.to_presentation(Point::new(1920.0, 1080.0));
//! assert_eq!(on_screen, Point::new(960.0, 630.0));
//! # Ok::<(), frameslice::SliceError>(())
//! ```

use crate::crop::Rect;
use crate::error::SliceError;

/// Side of the square hit region around each corner handle, in
/// presentation pixels.
pub const HANDLE_HIT: f64 = 16.0;

/// Side of the drawn corner handle squares, in presentation pixels.
pub const HANDLE_DRAW: f64 = 12.0;

/// A 2D point. Which space it lives in is determined by the API that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Native size and length of the loaded media.
///
/// Set once when media loads and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct MediaDimensions {
    width: u32,
    height: u32,
    duration: f64,
}

impl MediaDimensions {
    /// Validate and create media dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDimensions`] if either side is zero or the
    /// duration is not a positive finite number of seconds.
    pub fn new(width: u32, height: u32, duration: f64) -> Result<Self, SliceError> {
        if width == 0 || height == 0 {
            return Err(SliceError::InvalidDimensions(format!(
                "media frame must be non-empty, got {width}×{height}"
            )));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SliceError::InvalidDimensions(format!(
                "media duration must be positive, got {duration}"
            )));
        }
        Ok(Self {
            width,
            height,
            duration,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Media length in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Where the media lands on the container after contain-fit scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationGeometry {
    /// Drawn width of the media, in presentation pixels.
    pub display_width: f64,
    /// Drawn height of the media, in presentation pixels.
    pub display_height: f64,
    /// Horizontal gap between the container's left edge and the media.
    pub offset_x: f64,
    /// Vertical gap between the container's top edge and the media.
    pub offset_y: f64,
}

/// An axis-aligned rectangle in presentation space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    /// Whether `point` lies inside the rectangle, edges included.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Corner points in NW, NE, SW, SE order.
    pub fn corners(&self) -> [Point; 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            Point::new(self.x, self.y),
            Point::new(right, self.y),
            Point::new(self.x, bottom),
            Point::new(right, bottom),
        ]
    }
}

/// Compute the contain-fit placement of a `dimensions`-sized frame inside a
/// `container_width × container_height` surface.
///
/// Both container sides must be positive; [`CoordinateMapper::new`] checks
/// this before calling.
pub fn compute_presentation_geometry(
    dimensions: &MediaDimensions,
    container_width: f64,
    container_height: f64,
) -> PresentationGeometry {
    let video_ratio = dimensions.aspect_ratio();
    let container_ratio = container_width / container_height;

    if video_ratio > container_ratio {
        let display_height = container_width / video_ratio;
        PresentationGeometry {
            display_width: container_width,
            display_height,
            offset_x: 0.0,
            offset_y: (container_height - display_height) / 2.0,
        }
    } else {
        let display_width = container_height * video_ratio;
        PresentationGeometry {
            display_width,
            display_height: container_height,
            offset_x: (container_width - display_width) / 2.0,
            offset_y: 0.0,
        }
    }
}

/// Affine mapping between video pixels and the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    dimensions: MediaDimensions,
    container_width: f64,
    container_height: f64,
    geometry: PresentationGeometry,
}

impl CoordinateMapper {
    /// Create a mapper for media drawn into a container of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidDimensions`] if either container side is
    /// not a positive finite number.
    pub fn new(
        dimensions: MediaDimensions,
        container_width: f64,
        container_height: f64,
    ) -> Result<Self, SliceError> {
        validate_container(container_width, container_height)?;
        Ok(Self {
            dimensions,
            container_width,
            container_height,
            geometry: compute_presentation_geometry(
                &dimensions,
                container_width,
                container_height,
            ),
        })
    }

    /// Recompute the geometry after the container was resized.
    ///
    /// # Errors
    ///
    /// Same as [`new`](CoordinateMapper::new); the previous geometry is kept
    /// on error.
    pub fn resize(&mut self, container_width: f64, container_height: f64) -> Result<(), SliceError> {
        validate_container(container_width, container_height)?;
        self.container_width = container_width;
        self.container_height = container_height;
        self.geometry =
            compute_presentation_geometry(&self.dimensions, container_width, container_height);
        log::trace!(
            "Container resized to {container_width}×{container_height}: {:?}",
            self.geometry
        );
        Ok(())
    }

    /// The media this mapper was built for.
    pub fn dimensions(&self) -> MediaDimensions {
        self.dimensions
    }

    /// Current container size as `(width, height)`.
    pub fn container_size(&self) -> (f64, f64) {
        (self.container_width, self.container_height)
    }

    /// Current contain-fit placement.
    pub fn geometry(&self) -> PresentationGeometry {
        self.geometry
    }

    /// Presentation pixels per video pixel, as `(x, y)`.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.geometry.display_width / self.dimensions.width() as f64,
            self.geometry.display_height / self.dimensions.height() as f64,
        )
    }

    /// Map a video-space point onto the presentation surface.
    pub fn to_presentation(&self, point: Point) -> Point {
        let (scale_x, scale_y) = self.scale();
        Point::new(
            point.x * scale_x + self.geometry.offset_x,
            point.y * scale_y + self.geometry.offset_y,
        )
    }

    /// Map a presentation-space point back into video pixels.
    ///
    /// Points in the letterbox bars map outside `[0, width] × [0, height]`;
    /// the crop model clamps them.
    pub fn to_video(&self, point: Point) -> Point {
        let scale_x = self.dimensions.width() as f64 / self.geometry.display_width;
        let scale_y = self.dimensions.height() as f64 / self.geometry.display_height;
        Point::new(
            (point.x - self.geometry.offset_x) * scale_x,
            (point.y - self.geometry.offset_y) * scale_y,
        )
    }

    /// The on-surface rectangle covered by a video-space crop rectangle.
    pub fn rect_to_presentation(&self, rect: &Rect) -> SurfaceRect {
        let origin = self.to_presentation(Point::new(rect.x as f64, rect.y as f64));
        let end = self.to_presentation(Point::new(
            rect.right() as f64,
            rect.bottom() as f64,
        ));
        SurfaceRect {
            x: origin.x,
            y: origin.y,
            width: end.x - origin.x,
            height: end.y - origin.y,
        }
    }
}

fn validate_container(container_width: f64, container_height: f64) -> Result<(), SliceError> {
    let valid = |side: f64| side.is_finite() && side > 0.0;
    if valid(container_width) && valid(container_height) {
        Ok(())
    } else {
        Err(SliceError::InvalidDimensions(format!(
            "container must be non-empty, got {container_width}×{container_height}"
        )))
    }
}

/// Rule-of-thirds guide lines across a crop overlay.
///
/// Returns two vertical lines followed by two horizontal lines, each as a
/// `(from, to)` pair.
pub fn thirds_guides(rect: &SurfaceRect) -> [(Point, Point); 4] {
    let line = |i: f64| {
        let x = rect.x + rect.width * i / 3.0;
        let y = rect.y + rect.height * i / 3.0;
        (
            (Point::new(x, rect.y), Point::new(x, rect.y + rect.height)),
            (Point::new(rect.x, y), Point::new(rect.x + rect.width, y)),
        )
    };
    let (first_vertical, first_horizontal) = line(1.0);
    let (second_vertical, second_horizontal) = line(2.0);
    [
        first_vertical,
        second_vertical,
        first_horizontal,
        second_horizontal,
    ]
}

/// Squares drawn centered on each corner of a crop overlay, NW, NE, SW, SE.
pub fn handle_squares(rect: &SurfaceRect) -> [SurfaceRect; 4] {
    rect.corners().map(|corner| SurfaceRect {
        x: corner.x - HANDLE_DRAW / 2.0,
        y: corner.y - HANDLE_DRAW / 2.0,
        width: HANDLE_DRAW,
        height: HANDLE_DRAW,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pillarbox_for_tall_video() {
        let dimensions = MediaDimensions::new(1080, 1920, 1.0).unwrap();
        let geometry = compute_presentation_geometry(&dimensions, 800.0, 600.0);
        assert_eq!(geometry.display_height, 600.0);
        assert!((geometry.display_width - 337.5).abs() < 1e-9);
        assert!((geometry.offset_x - 231.25).abs() < 1e-9);
        assert_eq!(geometry.offset_y, 0.0);
    }

    #[test]
    fn equal_ratios_fill_without_offset() {
        let dimensions = MediaDimensions::new(1280, 720, 1.0).unwrap();
        let geometry = compute_presentation_geometry(&dimensions, 640.0, 360.0);
        assert_eq!(geometry.display_width, 640.0);
        assert_eq!(geometry.display_height, 360.0);
        assert_eq!(geometry.offset_x, 0.0);
        assert_eq!(geometry.offset_y, 0.0);
    }

    #[test]
    fn thirds_split_the_rect() {
        let rect = SurfaceRect {
            x: 0.0,
            y: 0.0,
            width: 90.0,
            height: 30.0,
        };
        let guides = thirds_guides(&rect);
        assert_eq!(guides[0].0.x, 30.0);
        assert_eq!(guides[1].0.x, 60.0);
        assert_eq!(guides[2].0.y, 10.0);
        assert_eq!(guides[3].1, Point::new(90.0, 20.0));
    }
}
