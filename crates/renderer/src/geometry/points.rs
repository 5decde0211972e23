//! Point marker quads: four vertices and two triangles per point.

use chart_canvas_shared::{GeometryIssue, Rgba};

use super::{check_override_len, first_non_finite, PointSet};

/// Quad corner coordinates in marker space, `(0,0)` bottom-left.
pub const QUAD_CORNERS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
/// Two triangles over [`QUAD_CORNERS`].
pub const QUAD_INDICES: [u32; 6] = [0, 2, 1, 2, 3, 1];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 2],
    pub corner: [f32; 2],
    pub fill: [u8; 4],
    pub border: [u8; 4],
}

impl PointVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Unorm8x4, 3 => Unorm8x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PointBuffers {
    pub vertices: Vec<PointVertex>,
    pub indices: Vec<u32>,
    pub issues: Vec<GeometryIssue>,
}

impl PointBuffers {
    pub fn point_count(&self) -> usize {
        self.vertices.len() / 4
    }
}

/// Build quads for every valid point set. A set whose x/y lengths differ or
/// that contains non-finite coordinates is dropped whole; mismatched color
/// overrides are ignored in favor of the group colors.
pub fn build_point_buffers(sets: &[PointSet]) -> PointBuffers {
    let mut out = PointBuffers::default();

    for (index, set) in sets.iter().enumerate() {
        if set.x.len() != set.y.len() {
            out.issues.push(GeometryIssue::MismatchedLengths {
                index,
                field: "y",
                expected: set.x.len(),
                actual: set.y.len(),
            });
            continue;
        }
        if let Some(point) = first_non_finite(&set.x, &set.y) {
            out.issues.push(GeometryIssue::NonFiniteCoordinate { index, point });
            continue;
        }

        let n = set.x.len();
        let fills = usable_overrides(index, "fill_colors", &set.fill_colors, n, &mut out.issues);
        let borders = usable_overrides(index, "border_colors", &set.border_colors, n, &mut out.issues);

        for i in 0..n {
            let base = out.vertices.len() as u32;
            let position = [set.x[i] as f32, set.y[i] as f32];
            let fill = fills.map_or(Rgba::TRANSPARENT, |c| c[i]);
            let border = borders.map_or(Rgba::TRANSPARENT, |c| c[i]);
            out.vertices.extend(QUAD_CORNERS.iter().map(|&corner| PointVertex {
                position,
                corner,
                fill: fill.0,
                border: border.0,
            }));
            out.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        }
    }

    out
}

fn usable_overrides<'a>(
    index: usize,
    field: &'static str,
    values: &'a Option<Vec<Rgba>>,
    expected: usize,
    issues: &mut Vec<GeometryIssue>,
) -> Option<&'a [Rgba]> {
    match check_override_len(index, field, values, expected) {
        Ok(()) => values.as_deref(),
        Err(issue) => {
            issues.push(issue);
            None
        }
    }
}
