//! CPU-side geometry for the renderable groups.
//!
//! Builders turn caller input into vertex/index buffers once per input
//! change; everything that depends on the visible range is left to the
//! vertex shaders. Malformed items are skipped and reported as
//! [`GeometryIssue`]s.

use std::hash::{Hash, Hasher};

use chart_canvas_shared::{GeometryIssue, Rgba};
use serde::{Deserialize, Serialize};

pub mod areas;
pub mod lines;
pub mod paths;
pub mod points;
pub mod triangulate;

pub use areas::{build_area_buffers, AreaBuffers, AreaVertex};
pub use lines::{build_line_buffers, clip_line_to_unit_box, LineBuffers, LineVertex};
pub use paths::{build_path_buffers, HistogramLayout, PathBuffers, PathVertex};
pub use points::{build_point_buffers, PointBuffers, PointVertex};
pub use triangulate::{triangulate, PolygonMesh};

/// Scatter points sharing one marker style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per-point fill override; transparent entries use the group color.
    #[serde(default)]
    pub fill_colors: Option<Vec<Rgba>>,
    /// Per-point border override; transparent entries use the group color.
    #[serde(default)]
    pub border_colors: Option<Vec<Rgba>>,
}

/// Straight line through `(x, y)` along `(dx, dy)`, drawn across the whole
/// visible window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub width: Option<f32>,
}

impl Line {
    pub fn horizontal(y: f64) -> Self {
        Self {
            y,
            dx: 1.0,
            ..Default::default()
        }
    }

    pub fn vertical(x: f64) -> Self {
        Self {
            x,
            dy: 1.0,
            ..Default::default()
        }
    }
}

/// Polyline with optional per-point color and stroke width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(default)]
    pub colors: Option<Vec<Rgba>>,
    #[serde(default)]
    pub widths: Option<Vec<f32>>,
}

impl Path {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Polygon with optional holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilledArea {
    pub contour: Vec<[f64; 2]>,
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub color: Option<Rgba>,
}

/// Content hashing for change detection.
pub trait ContentHash {
    fn hash_content<H: Hasher>(&self, state: &mut H);
}

fn hash_f64s<H: Hasher>(values: &[f64], state: &mut H) {
    values.len().hash(state);
    for v in values {
        v.to_bits().hash(state);
    }
}

impl ContentHash for PointSet {
    fn hash_content<H: Hasher>(&self, state: &mut H) {
        hash_f64s(&self.x, state);
        hash_f64s(&self.y, state);
        self.fill_colors.hash(state);
        self.border_colors.hash(state);
    }
}

impl ContentHash for Line {
    fn hash_content<H: Hasher>(&self, state: &mut H) {
        hash_f64s(&[self.x, self.y, self.dx, self.dy], state);
        self.color.hash(state);
        self.width.map(f32::to_bits).hash(state);
    }
}

impl ContentHash for Path {
    fn hash_content<H: Hasher>(&self, state: &mut H) {
        hash_f64s(&self.x, state);
        hash_f64s(&self.y, state);
        self.colors.hash(state);
        self.widths
            .as_ref()
            .map(|w| w.iter().map(|v| v.to_bits()).collect::<Vec<_>>())
            .hash(state);
    }
}

impl ContentHash for FilledArea {
    fn hash_content<H: Hasher>(&self, state: &mut H) {
        let flat = |ring: &[[f64; 2]]| ring.iter().flatten().copied().collect::<Vec<f64>>();
        hash_f64s(&flat(&self.contour), state);
        self.holes.len().hash(state);
        for hole in &self.holes {
            hash_f64s(&flat(hole), state);
        }
        self.color.hash(state);
    }
}

/// Hash of a whole batch; groups rebuild their buffers only when it changes.
pub fn content_key<T: ContentHash>(items: &[T]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    items.len().hash(&mut hasher);
    for item in items {
        item.hash_content(&mut hasher);
    }
    hasher.finish()
}

/// Check an optional per-point array against the point count.
pub(crate) fn check_override_len<T>(
    index: usize,
    field: &'static str,
    values: &Option<Vec<T>>,
    expected: usize,
) -> Result<(), GeometryIssue> {
    match values {
        Some(v) if v.len() != expected => Err(GeometryIssue::MismatchedLengths {
            index,
            field,
            expected,
            actual: v.len(),
        }),
        _ => Ok(()),
    }
}

/// Index of the first non-finite coordinate pair, if any.
pub(crate) fn first_non_finite(x: &[f64], y: &[f64]) -> Option<usize> {
    x.iter()
        .zip(y)
        .position(|(a, b)| !a.is_finite() || !b.is_finite())
}

pub(crate) fn log_issues(group: &str, issues: &[GeometryIssue]) {
    for issue in issues {
        log::warn!("[{}] Skipping malformed input: {}", group, issue);
    }
}
