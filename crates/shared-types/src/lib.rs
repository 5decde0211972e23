//! Shared types for the chart canvas crates
//!
//! Value types that cross the boundary between the configuration layer, the
//! viewport controller and the GPU renderer: data/visible ranges, the chart
//! region, canvas size, colors, host input events and error types.

use serde::{Deserialize, Serialize};

pub mod color;
pub mod errors;
pub mod events;

pub use color::Rgba;
pub use errors::{ChartCanvasError, ChartCanvasResult, GeometryIssue};
pub use events::{
    ChartClickEvent, ChartEvent, ChartInputEvent, Modifiers, PhysicalPosition, PointerId,
};

/// Axis aligned rectangle in data units, stored as `[x1, y1, x2, y2]`.
///
/// Used both for the immutable pan/zoom bound (`DataRange`) and for the
/// currently displayed window (`VisibleRange`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds2D {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Absolute bound for panning and zooming.
pub type DataRange = Bounds2D;

/// Sub-rectangle of the `DataRange` currently mapped onto the chart region.
pub type VisibleRange = Bounds2D;

impl Bounds2D {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn origin(&self) -> [f64; 2] {
        [self.x1, self.y1]
    }

    pub fn size(&self) -> [f64; 2] {
        [self.width(), self.height()]
    }

    /// Both extents strictly positive and every edge finite.
    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// True when `other` lies entirely inside `self`, with a small relative
    /// tolerance for floating point drift at the edges.
    pub fn contains(&self, other: &Bounds2D) -> bool {
        let eps_x = self.width().abs() * 1e-9;
        let eps_y = self.height().abs() * 1e-9;
        other.x1 >= self.x1 - eps_x
            && other.x2 <= self.x2 + eps_x
            && other.y1 >= self.y1 - eps_y
            && other.y2 <= self.y2 + eps_y
    }
}

impl From<[f64; 4]> for Bounds2D {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Bounds2D> for [f64; 4] {
    fn from(b: Bounds2D) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Normalized `[0,1]` sub-rectangle of the canvas reserved for plotted
/// content, stored as `[left, top, right, bottom]` with y measured from the
/// top edge of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct ChartRegion {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ChartRegion {
    pub const FULL: ChartRegion = ChartRegion {
        left: 0.0,
        top: 0.0,
        right: 1.0,
        bottom: 1.0,
    };

    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.left)
            && in_unit(self.top)
            && in_unit(self.right)
            && in_unit(self.bottom)
            && self.left < self.right
            && self.top < self.bottom
    }

    /// Bottom-left corner of the region in clip space.
    pub fn clip_origin(&self) -> [f64; 2] {
        [self.left * 2.0 - 1.0, 1.0 - self.bottom * 2.0]
    }

    /// Extent of the region in clip space.
    pub fn clip_size(&self) -> [f64; 2] {
        [self.width() * 2.0, self.height() * 2.0]
    }
}

impl Default for ChartRegion {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<[f64; 4]> for ChartRegion {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<ChartRegion> for [f64; 4] {
    fn from(r: ChartRegion) -> Self {
        [r.left, r.top, r.right, r.bottom]
    }
}

/// Drawable canvas size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_f64(&self) -> [f64; 2] {
        [self.width as f64, self.height as f64]
    }
}

/// Map a layer's z-order onto a bounded depth value in `(0.05, 0.95)`.
///
/// The mapping is strictly increasing, so a larger z-order ends up in front
/// of a smaller one. It is evaluated in `f64`; the `f32` result keeps
/// distinct z-orders apart up to a magnitude of about 8, past which depths
/// meet at the bounds and only the group draw order separates layers.
pub fn depth_from_z_order(z_order: f32) -> f32 {
    (0.5 + 0.45 * (z_order as f64).tanh()) as f32
}
