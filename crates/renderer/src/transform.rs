//! Coordinate transform between data space, region-relative space, clip
//! space and canvas pixels.
//!
//! * data: the caller's units, bounded by the visible range
//! * relative: `[0,1]²` inside the chart region, y pointing up
//! * clip: normalized device coordinates of the whole canvas
//! * canvas: physical pixels, origin at the top-left corner, y pointing down

use chart_canvas_shared::{CanvasSize, ChartRegion, PhysicalPosition, VisibleRange};
use nalgebra_glm as glm;

/// View parameters uploaded once per frame and shared by every group.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    pub visible_origin: [f32; 2],
    pub visible_size_inv: [f32; 2],
    /// Bottom-left corner of the chart region in clip space.
    pub region_origin: [f32; 2],
    /// Size of the chart region in clip space.
    pub region_size: [f32; 2],
    pub canvas_size: [f32; 2],
    pub canvas_size_inv: [f32; 2],
}

/// Snapshot of everything needed to map between the four coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartTransform {
    pub visible: VisibleRange,
    pub region: ChartRegion,
    pub canvas: CanvasSize,
}

impl ChartTransform {
    pub fn new(visible: VisibleRange, region: ChartRegion, canvas: CanvasSize) -> Self {
        Self {
            visible,
            region,
            canvas,
        }
    }

    pub fn data_to_relative(&self, p: glm::DVec2) -> glm::DVec2 {
        glm::vec2(
            (p.x - self.visible.x1) / self.visible.width(),
            (p.y - self.visible.y1) / self.visible.height(),
        )
    }

    pub fn relative_to_data(&self, rel: glm::DVec2) -> glm::DVec2 {
        glm::vec2(
            self.visible.x1 + rel.x * self.visible.width(),
            self.visible.y1 + rel.y * self.visible.height(),
        )
    }

    pub fn data_to_clip(&self, p: glm::DVec2) -> glm::DVec2 {
        let rel = self.data_to_relative(p);
        let [ox, oy] = self.region.clip_origin();
        let [sx, sy] = self.region.clip_size();
        glm::vec2(rel.x * sx + ox, rel.y * sy + oy)
    }

    pub fn clip_to_data(&self, clip: glm::DVec2) -> glm::DVec2 {
        let [ox, oy] = self.region.clip_origin();
        let [sx, sy] = self.region.clip_size();
        self.relative_to_data(glm::vec2((clip.x - ox) / sx, (clip.y - oy) / sy))
    }

    /// Region-relative position of a canvas pixel, `None` outside the chart
    /// region or before the canvas has a size.
    pub fn canvas_to_relative(&self, position: PhysicalPosition) -> Option<glm::DVec2> {
        canvas_to_region_relative(position, &self.region, self.canvas)
    }

    pub fn canvas_to_data(&self, position: PhysicalPosition) -> Option<glm::DVec2> {
        self.canvas_to_relative(position)
            .map(|rel| self.relative_to_data(rel))
    }

    pub fn data_to_canvas(&self, p: glm::DVec2) -> PhysicalPosition {
        let rel = self.data_to_relative(p);
        let [w, h] = self.canvas.as_f64();
        PhysicalPosition::new(
            (self.region.left + rel.x * self.region.width()) * w,
            (self.region.top + (1.0 - rel.y) * self.region.height()) * h,
        )
    }

    /// Screen pixels per data unit along each axis.
    ///
    /// Differs between axes whenever the zoom is anisotropic; tangents and
    /// arc lengths computed in data space are multiplied by this before any
    /// pixel measurement.
    pub fn pixel_scale(&self) -> glm::DVec2 {
        let [w, h] = self.canvas.as_f64();
        glm::vec2(
            self.region.width() * w / self.visible.width(),
            self.region.height() * h / self.visible.height(),
        )
    }

    pub fn view_uniform(&self) -> ViewUniform {
        let [ox, oy] = self.region.clip_origin();
        let [sx, sy] = self.region.clip_size();
        let [w, h] = self.canvas.as_f64();
        let inv = |v: f64| if v > 0.0 { (1.0 / v) as f32 } else { 0.0 };
        ViewUniform {
            visible_origin: [self.visible.x1 as f32, self.visible.y1 as f32],
            visible_size_inv: [inv(self.visible.width()), inv(self.visible.height())],
            region_origin: [ox as f32, oy as f32],
            region_size: [sx as f32, sy as f32],
            canvas_size: [w as f32, h as f32],
            canvas_size_inv: [inv(w), inv(h)],
        }
    }
}

/// Convert a canvas pixel into `[0,1]²` chart region coordinates with y up.
pub fn canvas_to_region_relative(
    position: PhysicalPosition,
    region: &ChartRegion,
    canvas: CanvasSize,
) -> Option<glm::DVec2> {
    if canvas.is_empty() {
        return None;
    }
    let [w, h] = canvas.as_f64();
    let rel_x = (position.x / w - region.left) / region.width();
    let rel_y = 1.0 - (position.y / h - region.top) / region.height();
    if !(0.0..=1.0).contains(&rel_x) || !(0.0..=1.0).contains(&rel_y) {
        return None;
    }
    Some(glm::vec2(rel_x, rel_y))
}
