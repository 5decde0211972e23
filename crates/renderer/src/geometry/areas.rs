//! Filled polygons, tessellated once on the CPU.

use chart_canvas_shared::{GeometryIssue, Rgba};

use super::triangulate::triangulate;
use super::FilledArea;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AreaVertex {
    pub position: [f32; 2],
    /// Transparent means the group color.
    pub color: [u8; 4],
}

impl AreaVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Unorm8x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<AreaVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AreaBuffers {
    pub vertices: Vec<AreaVertex>,
    pub indices: Vec<u32>,
    pub area_count: usize,
    pub issues: Vec<GeometryIssue>,
}

impl AreaBuffers {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn first_non_finite_vertex(ring: &[[f64; 2]]) -> Option<usize> {
    ring.iter().position(|p| !p[0].is_finite() || !p[1].is_finite())
}

/// Triangulate every area. Areas with fewer than three contour points or
/// non-finite coordinates are skipped; holes with fewer than three points
/// are dropped from their area, which is still filled.
pub fn build_area_buffers(areas: &[FilledArea]) -> AreaBuffers {
    let mut out = AreaBuffers::default();

    for (index, area) in areas.iter().enumerate() {
        if area.contour.len() < 3 {
            out.issues.push(GeometryIssue::TooFewPoints {
                index,
                len: area.contour.len(),
                min: 3,
            });
            continue;
        }
        if let Some(point) = first_non_finite_vertex(&area.contour) {
            out.issues.push(GeometryIssue::NonFiniteCoordinate { index, point });
            continue;
        }

        let mut holes = Vec::with_capacity(area.holes.len());
        let mut offset = area.contour.len();
        let mut bad_point = None;
        for (hole_index, hole) in area.holes.iter().enumerate() {
            if hole.len() < 3 {
                out.issues.push(GeometryIssue::DegenerateHole {
                    index,
                    hole: hole_index,
                    len: hole.len(),
                });
                continue;
            }
            if let Some(point) = first_non_finite_vertex(hole) {
                bad_point = Some(offset + point);
                break;
            }
            offset += hole.len();
            holes.push(hole.clone());
        }
        if let Some(point) = bad_point {
            out.issues.push(GeometryIssue::NonFiniteCoordinate { index, point });
            continue;
        }

        let mesh = match triangulate(&area.contour, &holes) {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("[build_area_buffers] Area {} failed to tessellate: {}", index, e);
                out.issues.push(GeometryIssue::Tessellation {
                    index,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let color = area.color.unwrap_or(Rgba::TRANSPARENT).0;
        let base = out.vertices.len() as u32;
        out.vertices.extend(mesh.positions.iter().map(|p| AreaVertex {
            position: [p[0] as f32, p[1] as f32],
            color,
        }));
        out.indices
            .extend(mesh.triangles.iter().flatten().map(|i| base + i));
        out.area_count += 1;
    }

    out
}
