//! Variable-width polylines with beveled joints and zoom-stable dashes.
//!
//! Every point becomes a left/right vertex pair. Joints are extruded in the
//! vertex stage from the incoming and outgoing tangents, after correcting
//! them for the anisotropic pixel scale of the current view.
//!
//! Dash phase needs the pixel distance along the path, which changes with
//! every zoom. Instead of recomputing it on the CPU, each point carries a
//! cumulative arc length histogram: data-space length bucketed by segment
//! direction between 0° and 90°. The vertex stage turns the histogram back
//! into pixels with `Σ len_b · |dir_b ∘ pixel_scale|`, which is exact for
//! segments lying on a bucket direction and close for the rest.

use std::f64::consts::FRAC_PI_2;

use chart_canvas_config::RenderTuning;
use chart_canvas_shared::{GeometryIssue, Rgba};
use nalgebra_glm as glm;

use super::{check_override_len, first_non_finite, Path};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathVertex {
    pub position: [f32; 2],
    pub tangent_in: [f32; 2],
    pub tangent_out: [f32; 2],
    /// Transparent means the group color.
    pub color: [u8; 4],
    /// Zero means the group width.
    pub width: f32,
    /// +1 left of the path, -1 right of it.
    pub side: f32,
    /// Row-major point index into the histogram texture.
    pub point_index: u32,
}

impl PathVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Unorm8x4,
        4 => Float32,
        5 => Float32,
        6 => Uint32
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PathVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Placement of the per-point histograms in the R32Float texture.
///
/// Each point takes `buckets` consecutive texels; rows wrap after
/// `points_per_row` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramLayout {
    pub buckets: u32,
    pub points_per_row: u32,
    pub width: u32,
    pub height: u32,
}

impl HistogramLayout {
    pub fn new(point_count: u32, buckets: u32, max_width: u32) -> Self {
        let buckets = buckets.max(2);
        let points_per_row = (max_width / buckets).max(1);
        let columns = point_count.clamp(1, points_per_row);
        Self {
            buckets,
            points_per_row,
            width: columns * buckets,
            height: point_count.max(1).div_ceil(points_per_row),
        }
    }

    /// Texel of `bucket` for the point at `point_index`.
    pub fn texel(&self, point_index: u32, bucket: u32) -> (u32, u32) {
        (
            (point_index % self.points_per_row) * self.buckets + bucket,
            point_index / self.points_per_row,
        )
    }

    pub fn texel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Unit direction represented by `bucket`, evenly spread over 0°..=90°.
    pub fn bucket_direction(&self, bucket: u32) -> glm::DVec2 {
        let angle = bucket as f64 / (self.buckets - 1) as f64 * FRAC_PI_2;
        glm::vec2(angle.cos(), angle.sin())
    }

    /// Bucket nearest to the direction of a data-space segment.
    pub fn bucket_of(&self, segment: glm::DVec2) -> u32 {
        let angle = segment.y.abs().atan2(segment.x.abs()) / FRAC_PI_2;
        ((angle * (self.buckets - 1) as f64 + 0.5).floor() as u32).min(self.buckets - 1)
    }
}

#[derive(Debug, Clone)]
pub struct PathBuffers {
    pub vertices: Vec<PathVertex>,
    pub indices: Vec<u32>,
    /// Normalized histogram texels laid out by `layout`.
    pub histogram: Vec<f32>,
    /// Scale that restores data-space lengths from `histogram`.
    pub histogram_max: f32,
    pub layout: HistogramLayout,
    pub path_count: usize,
    pub issues: Vec<GeometryIssue>,
}

impl PathBuffers {
    /// CPU mirror of the vertex stage: pixel distance from the start of the
    /// path to the point at `point_index`.
    pub fn arc_length_px(&self, point_index: u32, pixel_scale: glm::DVec2) -> f64 {
        (0..self.layout.buckets)
            .map(|b| {
                let (x, y) = self.layout.texel(point_index, b);
                let len = self.histogram[(y * self.layout.width + x) as usize] as f64
                    * self.histogram_max as f64;
                len * self.layout.bucket_direction(b).component_mul(&pixel_scale).norm()
            })
            .sum()
    }
}

fn unit_or_zero(v: glm::DVec2) -> glm::DVec2 {
    let len = v.norm();
    if len > 0.0 {
        v / len
    } else {
        v
    }
}

/// Joint offset in pixels for one side of a path vertex.
///
/// Tangents are in data space and get corrected by `pixel_scale` before the
/// bevel is computed. The miter length is limited to three half-widths.
/// When either tangent is zero the offset is the plain unit normal of the
/// other one.
pub fn bevel_offset(
    tangent_in: glm::DVec2,
    tangent_out: glm::DVec2,
    width: f64,
    side: f64,
    pixel_scale: glm::DVec2,
) -> glm::DVec2 {
    let a = unit_or_zero(tangent_in.component_mul(&pixel_scale));
    let b = unit_or_zero(tangent_out.component_mul(&pixel_scale));
    let half = side * width * 0.5;

    // A repeated point has no direction on one side; treat it like a path end.
    if a == glm::DVec2::zeros() || b == glm::DVec2::zeros() {
        let t = a + b;
        return glm::vec2(-t.y, t.x) * half;
    }

    let dist_inv = (0.5 * (1.01 + a.dot(&b))).sqrt().max(1.0 / 3.0);
    let sum = a + b;
    let t = if sum.norm() > 1e-12 { sum.normalize() } else { a };
    glm::vec2(-t.y, t.x) * (half / dist_inv)
}

/// Build ribbons and dash histograms for a batch of paths.
pub fn build_path_buffers(paths: &[Path], tuning: &RenderTuning) -> PathBuffers {
    let mut issues = Vec::new();
    let accepted: Vec<&Path> = paths
        .iter()
        .enumerate()
        .filter_map(|(index, path)| match validate_path(index, path) {
            Ok(()) => Some(path),
            Err(issue) => {
                issues.push(issue);
                None
            }
        })
        .collect();

    let total_points: usize = accepted.iter().map(|p| p.x.len()).sum();
    let layout = HistogramLayout::new(
        total_points as u32,
        tuning.histogram_buckets,
        tuning.max_histogram_texture_width,
    );
    let mut raw = vec![0.0f64; layout.texel_count()];
    let mut vertices = Vec::with_capacity(total_points * 2);
    let mut indices = Vec::with_capacity(total_points.saturating_sub(1) * 6);

    let mut point_base = 0u32;
    for path in &accepted {
        let n = path.x.len();
        let points: Vec<glm::DVec2> = path.x.iter().zip(&path.y).map(|(&x, &y)| glm::vec2(x, y)).collect();
        let closed = n > 2 && (points[0] - points[n - 1]).norm() < tuning.closed_path_epsilon;

        let segments: Vec<glm::DVec2> = points.windows(2).map(|w| w[1] - w[0]).collect();
        let dirs: Vec<glm::DVec2> = segments.iter().map(|&s| unit_or_zero(s)).collect();

        let mut cumulative = vec![0.0f64; layout.buckets as usize];
        let vertex_base = vertices.len() as u32;
        for i in 0..n {
            // Open ends reuse the neighbouring segment's direction for both
            // tangents. With a zero tangent `bevel_offset` would give the same
            // plain normal, so only the vertex data differs.
            let tangent_in = if i > 0 {
                dirs[i - 1]
            } else if closed {
                dirs[n - 2]
            } else {
                dirs[0]
            };
            let tangent_out = if i < n - 1 {
                dirs[i]
            } else if closed {
                dirs[0]
            } else {
                dirs[n - 2]
            };

            if i > 0 {
                let segment = segments[i - 1];
                cumulative[layout.bucket_of(segment) as usize] += segment.norm();
            }
            let point_index = point_base + i as u32;
            for (b, len) in cumulative.iter().enumerate() {
                let (x, y) = layout.texel(point_index, b as u32);
                raw[(y * layout.width + x) as usize] = *len;
            }

            let color = path.colors.as_ref().map_or(Rgba::TRANSPARENT, |c| c[i]);
            let width = path.widths.as_ref().map_or(0.0, |w| w[i].max(0.0));
            for side in [1.0f32, -1.0] {
                vertices.push(PathVertex {
                    position: [points[i].x as f32, points[i].y as f32],
                    tangent_in: [tangent_in.x as f32, tangent_in.y as f32],
                    tangent_out: [tangent_out.x as f32, tangent_out.y as f32],
                    color: color.0,
                    width,
                    side,
                    point_index,
                });
            }
        }

        for i in 0..(n as u32 - 1) {
            let v = vertex_base + 2 * i;
            indices.extend_from_slice(&[v, v + 1, v + 2, v + 1, v + 3, v + 2]);
        }
        point_base += n as u32;
    }

    let max = raw.iter().copied().fold(0.0f64, f64::max).max(1e-8);
    let histogram = raw.iter().map(|v| (v / max) as f32).collect();

    PathBuffers {
        vertices,
        indices,
        histogram,
        histogram_max: max as f32,
        layout,
        path_count: accepted.len(),
        issues,
    }
}

fn validate_path(index: usize, path: &Path) -> Result<(), GeometryIssue> {
    if path.x.len() != path.y.len() {
        return Err(GeometryIssue::MismatchedLengths {
            index,
            field: "y",
            expected: path.x.len(),
            actual: path.y.len(),
        });
    }
    if path.x.len() < 2 {
        return Err(GeometryIssue::TooFewPoints {
            index,
            len: path.x.len(),
            min: 2,
        });
    }
    if let Some(point) = first_non_finite(&path.x, &path.y) {
        return Err(GeometryIssue::NonFiniteCoordinate { index, point });
    }
    check_override_len(index, "colors", &path.colors, path.x.len())?;
    check_override_len(index, "widths", &path.widths, path.x.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> RenderTuning {
        RenderTuning::default()
    }

    #[test]
    fn test_vertex_and_index_counts() {
        let path = Path::new(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 0.0, 1.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        assert_eq!(buffers.vertices.len(), 8);
        assert_eq!(buffers.indices.len(), 18);
        assert_eq!(&buffers.indices[..6], &[0, 1, 2, 1, 3, 2]);
        assert_eq!(buffers.vertices[0].side, 1.0);
        assert_eq!(buffers.vertices[1].side, -1.0);
    }

    #[test]
    fn test_degenerate_path_in_batch() {
        let paths = vec![
            Path::new(vec![0.0, 1.0], vec![0.0, 1.0]),
            Path::new(vec![0.0], vec![0.0]),
            Path::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]),
            Path::new(vec![5.0, 6.0], vec![5.0, 5.0]),
        ];
        let buffers = build_path_buffers(&paths, &tuning());
        assert_eq!(buffers.path_count, 3);
        assert_eq!(buffers.issues.len(), 1);
        assert_eq!(buffers.issues[0].index(), 1);
        assert_eq!(buffers.vertices.len(), 2 * (2 + 3 + 2));
        assert_eq!(buffers.vertices.last().unwrap().point_index, 6);
    }

    #[test]
    fn test_mismatched_overrides_drop_path() {
        let mut path = Path::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]);
        path.widths = Some(vec![1.0, 2.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        assert_eq!(buffers.path_count, 0);
        assert!(buffers.vertices.is_empty());
        assert!(matches!(
            buffers.issues[0],
            GeometryIssue::MismatchedLengths { field: "widths", .. }
        ));
    }

    #[test]
    fn test_closed_path_wraps_tangents() {
        let path = Path::new(vec![0.0, 1.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 1.0, 0.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        let first = buffers.vertices[0];
        let last = buffers.vertices[buffers.vertices.len() - 1];
        assert_eq!(first.tangent_in, [0.0, -1.0]);
        assert_eq!(first.tangent_out, [1.0, 0.0]);
        assert_eq!(last.tangent_out, [1.0, 0.0]);
    }

    #[test]
    fn test_open_path_end_tangents() {
        let path = Path::new(vec![0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        assert_eq!(buffers.vertices[0].tangent_in, buffers.vertices[0].tangent_out);
        let last = buffers.vertices[5];
        assert_eq!(last.tangent_in, [0.0, 1.0]);
        assert_eq!(last.tangent_out, [0.0, 1.0]);
    }

    #[test]
    fn test_arc_length_matches_pixels_under_anisotropic_scale() {
        // Horizontal then vertical segment: both lie on bucket directions.
        let path = Path::new(vec![0.0, 2.0, 2.0], vec![0.0, 0.0, 3.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        let scale = glm::vec2(10.0, 40.0);
        assert_eq!(buffers.arc_length_px(0, scale), 0.0);
        assert!((buffers.arc_length_px(1, scale) - 20.0).abs() < 1e-4);
        assert!((buffers.arc_length_px(2, scale) - 140.0).abs() < 1e-4);
    }

    #[test]
    fn test_diagonal_bucket_is_exact_at_45_degrees() {
        let layout = HistogramLayout::new(2, 5, 4096);
        assert_eq!(layout.bucket_of(glm::vec2(1.0, 1.0)), 2);
        assert_eq!(layout.bucket_of(glm::vec2(-3.0, 0.0)), 0);
        assert_eq!(layout.bucket_of(glm::vec2(0.0, -2.0)), 4);

        let path = Path::new(vec![0.0, 1.0], vec![0.0, 1.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        let scale = glm::vec2(3.0, 4.0);
        assert!((buffers.arc_length_px(1, scale) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_histogram_rows_wrap() {
        let layout = HistogramLayout::new(10, 4, 16);
        assert_eq!(layout.points_per_row, 4);
        assert_eq!(layout.width, 16);
        assert_eq!(layout.height, 3);
        assert_eq!(layout.texel(5, 2), (6, 1));
    }

    #[test]
    fn test_bevel_straight_and_right_angle() {
        let scale = glm::vec2(1.0, 1.0);
        let straight = bevel_offset(glm::vec2(1.0, 0.0), glm::vec2(1.0, 0.0), 4.0, 1.0, scale);
        // sqrt(0.5 * 2.01) is slightly above 1
        assert!((straight.y - 2.0 / (1.005f64).sqrt()).abs() < 1e-9);
        assert!(straight.x.abs() < 1e-12);

        let corner = bevel_offset(glm::vec2(1.0, 0.0), glm::vec2(0.0, 1.0), 4.0, -1.0, scale);
        let expected = 2.0 / (0.505f64).sqrt();
        assert!((corner.norm() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_point_does_not_widen_stroke() {
        let path = Path::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0, 0.0, 0.0, 0.0]);
        let buffers = build_path_buffers(&[path], &tuning());
        let scale = glm::vec2(1.0, 1.0);
        let offsets: Vec<f64> = buffers
            .vertices
            .iter()
            .map(|v| {
                let tin = glm::vec2(v.tangent_in[0] as f64, v.tangent_in[1] as f64);
                let tout = glm::vec2(v.tangent_out[0] as f64, v.tangent_out[1] as f64);
                bevel_offset(tin, tout, 4.0, v.side as f64, scale).norm()
            })
            .collect();
        assert!(offsets.iter().all(|&len| len <= 2.0 + 1e-9), "{:?}", offsets);
        // Both vertices of the repeated point sit exactly one half-width out.
        for len in &offsets[2..6] {
            assert!((len - 2.0).abs() < 1e-9);
        }

        let lone = bevel_offset(glm::vec2(0.0, 0.0), glm::vec2(0.0, 3.0), 4.0, 1.0, scale);
        assert!((lone - glm::vec2(-2.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_bevel_sharp_turn_is_limited() {
        let offset = bevel_offset(
            glm::vec2(1.0, 0.0),
            glm::vec2(-1.0, 0.001),
            2.0,
            1.0,
            glm::vec2(1.0, 1.0),
        );
        assert!(offset.norm() <= 3.0 + 1e-9);
    }
}
