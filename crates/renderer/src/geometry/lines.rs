//! Infinite straight lines drawn across the visible window.
//!
//! Each line is stored once as an anchor plus direction; the vertex stage
//! intersects it with the region and extrudes a ribbon in pixel space, so
//! panning and zooming never touch these buffers.

use chart_canvas_shared::{GeometryIssue, Rgba};
use nalgebra_glm as glm;

use super::Line;
use crate::transform::ChartTransform;

pub const LINE_INDICES: [u32; 6] = [0, 2, 1, 3, 2, 0];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub point: [f32; 2],
    pub direction: [f32; 2],
    /// Transparent means the group color.
    pub color: [u8; 4],
    /// Zero means the group width.
    pub width: f32,
    /// 0 = start+normal, 1 = start-normal, 2 = end-normal, 3 = end+normal.
    pub corner: u32,
}

impl LineVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Unorm8x4,
        3 => Float32,
        4 => Uint32
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// CPU mirror of the vertex stage: region-relative position of this
    /// corner and its dash distance in pixels. `None` when the line misses
    /// the visible window.
    pub fn project(&self, transform: &ChartTransform, width: f32) -> Option<(glm::DVec2, f64)> {
        let point = transform.data_to_relative(glm::vec2(self.point[0] as f64, self.point[1] as f64));
        let direction = glm::vec2(
            self.direction[0] as f64 / transform.visible.width(),
            self.direction[1] as f64 / transform.visible.height(),
        );
        let (entry, exit) = clip_line_to_unit_box(point, direction)?;

        let [cw, ch] = transform.canvas.as_f64();
        let region_px = glm::vec2(transform.region.width() * cw, transform.region.height() * ch);
        let span = (exit - entry).component_mul(&region_px);
        let length = span.norm();
        let tangent = if length > 0.0 { span / length } else { glm::vec2(1.0, 0.0) };
        let normal = glm::vec2(-tangent.y, tangent.x);

        let width = if self.width > 0.0 { self.width } else { width };
        let half = normal * (width as f64 * 0.5);
        let (base, offset, distance) = match self.corner {
            0 => (entry, half, 0.0),
            1 => (entry, -half, 0.0),
            2 => (exit, -half, length),
            _ => (exit, half, length),
        };
        Some((base + offset.component_div(&region_px), distance))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineBuffers {
    pub vertices: Vec<LineVertex>,
    pub indices: Vec<u32>,
    pub issues: Vec<GeometryIssue>,
}

impl LineBuffers {
    pub fn line_count(&self) -> usize {
        self.vertices.len() / 4
    }
}

/// Intersect the infinite line `point + t·direction` with the unit box.
/// Returns the entry and exit points ordered along `direction`.
pub fn clip_line_to_unit_box(point: glm::DVec2, direction: glm::DVec2) -> Option<(glm::DVec2, glm::DVec2)> {
    let mut t0 = f64::NEG_INFINITY;
    let mut t1 = f64::INFINITY;
    for axis in 0..2 {
        let (p, d) = (point[axis], direction[axis]);
        if d == 0.0 {
            if !(0.0..=1.0).contains(&p) {
                return None;
            }
            continue;
        }
        let (a, b) = (-p / d, (1.0 - p) / d);
        t0 = t0.max(a.min(b));
        t1 = t1.min(a.max(b));
    }
    if !t0.is_finite() || !t1.is_finite() || t0 > t1 {
        return None;
    }
    Some((point + direction * t0, point + direction * t1))
}

pub fn build_line_buffers(lines: &[Line]) -> LineBuffers {
    let mut out = LineBuffers::default();

    for (index, line) in lines.iter().enumerate() {
        if ![line.x, line.y, line.dx, line.dy].iter().all(|v| v.is_finite()) {
            out.issues.push(GeometryIssue::NonFiniteCoordinate { index, point: 0 });
            continue;
        }
        if line.dx == 0.0 && line.dy == 0.0 {
            out.issues.push(GeometryIssue::ZeroDirection { index });
            continue;
        }

        // Opposite directions describe the same line; keep one orientation so
        // the dash phase starts from the same end.
        let (dx, dy) = if line.dx > 0.0 { (-line.dx, -line.dy) } else { (line.dx, line.dy) };
        let color = line.color.unwrap_or(Rgba::TRANSPARENT);
        let width = line.width.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(0.0);

        let base = out.vertices.len() as u32;
        out.vertices.extend((0..4).map(|corner| LineVertex {
            point: [line.x as f32, line.y as f32],
            direction: [dx as f32, dy as f32],
            color: color.0,
            width,
            corner,
        }));
        out.indices.extend(LINE_INDICES.iter().map(|i| base + i));
    }

    out
}
