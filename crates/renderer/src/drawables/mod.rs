//! GPU renderable groups composed by the chart surface.
//!
//! Every group owns its pipeline, style uniform and geometry buffers. Input
//! changes are detected by content hash and rebuilt in `prepare`, between
//! frames; `render` only records a pass against the shared view uniform.

use chart_canvas_shared::GeometryIssue;
use wgpu::{CommandEncoder, TextureView};

use crate::textures::TextureCache;
use crate::transform::ChartTransform;

pub mod filled_areas;
pub mod lines;
pub mod point_markers;
pub mod shared_utils;
pub mod styled_paths;

pub use filled_areas::{AreaFill, AreaUniform, FillTexture, FilledAreaGroup, FilledAreaStyle};
pub use lines::{LineGroup, LineStyle, LineUniform};
pub use point_markers::{PointMarkerGroup, PointMarkerStyle, PointUniform};
pub use styled_paths::{PathStyle, PathUniform, StyledPathGroup};

/// Per-frame state handed to every group.
pub struct FrameContext<'a> {
    pub transform: &'a ChartTransform,
    pub view_bind_group: &'a wgpu::BindGroup,
}

/// A group of primitives the chart surface can draw.
pub trait ChartRenderable {
    /// Rebuild buffers and swap textures. Called once per frame before any
    /// group renders.
    fn prepare(&mut self, _textures: &mut TextureCache) {}

    /// Record this group's draw into its own pass on top of earlier groups.
    fn render(
        &mut self,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        depth_view: &TextureView,
        frame: &FrameContext<'_>,
    );

    fn name(&self) -> &str;

    /// Stacking order; larger values draw on top.
    fn z_order(&self) -> f32 {
        0.0
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Whether there is anything to draw yet.
    fn is_ready(&self) -> bool {
        true
    }

    /// Items dropped by the last rebuild.
    fn issues(&self) -> &[GeometryIssue] {
        &[]
    }
}

/// Indices of `z_orders` in draw order: ascending, ties in insertion order.
pub fn draw_order(z_orders: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..z_orders.len()).collect();
    order.sort_by(|&a, &b| z_orders[a].total_cmp(&z_orders[b]));
    order
}
