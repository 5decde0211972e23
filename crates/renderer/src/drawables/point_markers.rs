//! Scatter markers drawn as constant-size textured quads.

use std::rc::Rc;

use chart_canvas_shared::{depth_from_z_order, ChartCanvasResult, GeometryIssue, Rgba};

use super::shared_utils::{
    begin_group_pass, create_chart_pipeline, create_chart_shader, create_style_bind_group_layout,
    create_uniform_buffer, GpuMesh,
};
use super::{ChartRenderable, FrameContext};
use crate::geometry::{build_point_buffers, content_key, log_issues, PointSet, PointVertex};
use crate::gpu_context::GpuContext;
use crate::textures::gpu::create_sampler;
use crate::textures::marker_atlas::marker_cache_key;
use crate::textures::{
    AtlasPoll, GpuTexture, MarkerAtlas, MarkerAtlasState, MarkerShape, MarkerSpec, PendingMarkerAtlas,
    TextureCache, UvRect,
};

const SHADER: &str = include_str!("../shaders/point_markers.wgsl");
const MARKER_KEY: &str = "marker";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMarkerStyle {
    pub marker: MarkerSpec,
    pub fill: Rgba,
    pub border: Rgba,
    pub z_order: f32,
}

impl Default for PointMarkerStyle {
    fn default() -> Self {
        Self {
            marker: MarkerSpec::new(MarkerShape::Circle, 8.0, 1.0),
            fill: Rgba::from_packed(0x1f77b4ff),
            border: Rgba::BLACK,
            z_order: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniform {
    pub fill: [f32; 4],
    pub border: [f32; 4],
    pub uv_rect: [f32; 4],
    pub size: [f32; 2],
    pub depth: f32,
    pub _pad: u32,
}

impl PointMarkerStyle {
    /// Quad size matches the rasterized glyph so texels land on pixels.
    pub fn uniform(&self, uv: UvRect) -> PointUniform {
        let size = self.marker.bitmap_size() as f32;
        PointUniform {
            fill: self.fill.to_f32_array(),
            border: self.border.to_f32_array(),
            uv_rect: uv.to_array(),
            size: [size, size],
            depth: depth_from_z_order(self.z_order),
            _pad: 0,
        }
    }

    fn atlas_request(&self) -> Vec<(String, MarkerSpec)> {
        vec![(MARKER_KEY.to_string(), self.marker)]
    }
}

enum AtlasSlot {
    Missing,
    Pending(PendingMarkerAtlas),
    Ready {
        atlas: Rc<MarkerAtlas>,
        texture: Rc<GpuTexture>,
    },
}

pub struct PointMarkerGroup {
    name: String,
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    style_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blank: GpuTexture,
    style: PointMarkerStyle,
    style_buffer: wgpu::Buffer,
    style_dirty: bool,
    bind_group: Option<wgpu::BindGroup>,
    atlas: AtlasSlot,
    points: Vec<PointSet>,
    points_key: u64,
    built_key: Option<u64>,
    mesh: Option<GpuMesh>,
    issues: Vec<GeometryIssue>,
}

impl PointMarkerGroup {
    pub fn new(ctx: &GpuContext, name: impl Into<String>, style: PointMarkerStyle) -> ChartCanvasResult<Self> {
        let device = ctx.device.clone();
        let shader = create_chart_shader(&device, "point_marker_shader", SHADER);
        let style_layout = create_style_bind_group_layout(&device, "point_marker_style_layout", false);
        let pipeline = create_chart_pipeline(
            &device,
            "point_marker_pipeline",
            &shader,
            &[&ctx.view_layout, &style_layout],
            PointVertex::layout(),
            ctx.color_format,
        );
        let style_buffer = create_uniform_buffer(&device, "point_marker_style", &style.uniform(UvRect::FULL));

        Ok(Self {
            name: name.into(),
            sampler: create_sampler(&device, wgpu::AddressMode::ClampToEdge),
            blank: GpuTexture::blank(&device, &ctx.queue)?,
            queue: ctx.queue.clone(),
            device,
            pipeline,
            style_layout,
            style,
            style_buffer,
            style_dirty: false,
            bind_group: None,
            atlas: AtlasSlot::Missing,
            points: Vec::new(),
            points_key: content_key::<PointSet>(&[]),
            built_key: None,
            mesh: None,
            issues: Vec::new(),
        })
    }

    pub fn set_points(&mut self, points: Vec<PointSet>) {
        self.points_key = content_key(&points);
        self.points = points;
    }

    pub fn style(&self) -> &PointMarkerStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: PointMarkerStyle) {
        if style.marker != self.style.marker {
            // dropping a pending handle cancels its build
            self.atlas = AtlasSlot::Missing;
            self.bind_group = None;
        }
        self.style = style;
        self.style_dirty = true;
    }

    fn uv(&self) -> UvRect {
        match &self.atlas {
            AtlasSlot::Ready { atlas, .. } => atlas.uv(MARKER_KEY).unwrap_or(UvRect::FULL),
            _ => UvRect::FULL,
        }
    }

    fn upload_atlas(&mut self, textures: &mut TextureCache, key: u64, atlas: Rc<MarkerAtlas>) {
        let (device, queue) = (&self.device, &self.queue);
        match textures.gpu_texture(key, || GpuTexture::from_marker_atlas(device, queue, &atlas)) {
            Some(texture) => {
                log::debug!("[PointMarkerGroup] '{}' marker atlas ready", self.name);
                self.atlas = AtlasSlot::Ready { atlas, texture };
            }
            None => self.atlas = AtlasSlot::Missing,
        }
        self.bind_group = None;
        self.style_dirty = true;
    }

    fn update_atlas(&mut self, textures: &mut TextureCache) {
        let request = self.style.atlas_request();
        match std::mem::replace(&mut self.atlas, AtlasSlot::Missing) {
            AtlasSlot::Missing => match textures.marker_atlas(request.clone()) {
                MarkerAtlasState::Ready(atlas) => {
                    self.upload_atlas(textures, marker_cache_key(&request), atlas)
                }
                MarkerAtlasState::Pending(pending) => self.atlas = AtlasSlot::Pending(pending),
            },
            AtlasSlot::Pending(mut pending) => match pending.poll() {
                AtlasPoll::Ready(atlas) => {
                    let key = pending.key();
                    let atlas = textures.store_marker_atlas(key, atlas);
                    self.upload_atlas(textures, key, atlas);
                }
                AtlasPoll::Pending => self.atlas = AtlasSlot::Pending(pending),
                AtlasPoll::Cancelled => {
                    log::warn!("[PointMarkerGroup] '{}' marker atlas build was cancelled", self.name);
                }
            },
            ready @ AtlasSlot::Ready { .. } => self.atlas = ready,
        }
    }

    fn rebuild_geometry(&mut self) {
        let buffers = build_point_buffers(&self.points);
        log_issues("PointMarkerGroup", &buffers.issues);
        log::debug!(
            "[PointMarkerGroup] '{}' rebuilt {} points",
            self.name,
            buffers.point_count()
        );
        self.mesh = GpuMesh::upload(&self.device, "point_markers", &buffers.vertices, &buffers.indices);
        self.issues = buffers.issues;
        self.built_key = Some(self.points_key);
    }

    fn create_bind_group(&self) -> wgpu::BindGroup {
        let view = match &self.atlas {
            AtlasSlot::Ready { texture, .. } => &texture.view,
            _ => &self.blank.view,
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("point_marker_bind_group"),
            layout: &self.style_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.style_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

impl ChartRenderable for PointMarkerGroup {
    fn prepare(&mut self, textures: &mut TextureCache) {
        self.update_atlas(textures);

        if self.built_key != Some(self.points_key) {
            self.rebuild_geometry();
        }
        if self.style_dirty {
            let uniform = self.style.uniform(self.uv());
            self.queue
                .write_buffer(&self.style_buffer, 0, bytemuck::bytes_of(&uniform));
            self.style_dirty = false;
        }
        if self.bind_group.is_none() {
            self.bind_group = Some(self.create_bind_group());
        }
    }

    fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        frame: &FrameContext<'_>,
    ) {
        let (Some(mesh), Some(bind_group)) = (&self.mesh, &self.bind_group) else {
            return;
        };
        let mut pass = begin_group_pass(encoder, "Point Marker Group", view, depth_view);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, frame.view_bind_group, &[]);
        pass.set_bind_group(1, bind_group, &[]);
        mesh.draw(&mut pass);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn z_order(&self) -> f32 {
        self.style.z_order
    }

    fn is_ready(&self) -> bool {
        self.mesh.is_some()
    }

    fn issues(&self) -> &[GeometryIssue] {
        &self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<PointUniform>(), 64);
    }

    #[test]
    fn test_uniform_from_style() {
        let style = PointMarkerStyle {
            marker: MarkerSpec::new(MarkerShape::Diamond, 9.5, 1.0),
            z_order: 1.0,
            ..Default::default()
        };
        let uv = UvRect {
            u1: 0.0,
            v1: 0.0,
            u2: 0.25,
            v2: 0.5,
        };
        let uniform = style.uniform(uv);
        assert_eq!(uniform.size, [12.0, 12.0]);
        assert_eq!(uniform.uv_rect, [0.0, 0.0, 0.25, 0.5]);
        assert_eq!(uniform.border, [0.0, 0.0, 0.0, 1.0]);
        assert!(uniform.depth > depth_from_z_order(0.0));
    }
}
