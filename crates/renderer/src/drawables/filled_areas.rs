//! Triangulated polygons filled with a color, an image or a tinted pattern.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chart_canvas_shared::{depth_from_z_order, ChartCanvasResult, GeometryIssue, Rgba};

use super::shared_utils::{
    begin_group_pass, create_chart_pipeline, create_chart_shader, create_style_bind_group_layout,
    create_uniform_buffer, GpuMesh,
};
use super::{ChartRenderable, FrameContext};
use crate::geometry::{build_area_buffers, content_key, log_issues, AreaVertex, FilledArea};
use crate::gpu_context::GpuContext;
use crate::textures::gpu::create_sampler;
use crate::textures::{GpuTexture, TextureCache};

const SHADER: &str = include_str!("../shaders/filled_areas.wgsl");

/// RGBA8 bitmap tiled across the chart region.
#[derive(Debug, Clone, PartialEq)]
pub struct FillTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Tile size in screen pixels.
    pub repeat_period: [f32; 2],
}

impl FillTexture {
    fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        "fill".hash(&mut hasher);
        (self.width, self.height).hash(&mut hasher);
        self.pixels.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AreaFill {
    #[default]
    Color,
    /// Texture drawn as is.
    Image(FillTexture),
    /// Texture red channel used as alpha for the area color.
    Pattern(FillTexture),
}

impl AreaFill {
    fn texture(&self) -> Option<&FillTexture> {
        match self {
            AreaFill::Color => None,
            AreaFill::Image(t) | AreaFill::Pattern(t) => Some(t),
        }
    }

    fn mode(&self) -> u32 {
        match self {
            AreaFill::Color => 0,
            AreaFill::Image(_) => 1,
            AreaFill::Pattern(_) => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledAreaStyle {
    pub color: Rgba,
    pub fill: AreaFill,
    pub z_order: f32,
}

impl Default for FilledAreaStyle {
    fn default() -> Self {
        Self {
            color: Rgba::from_packed(0x1f77b480),
            fill: AreaFill::Color,
            z_order: -1.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AreaUniform {
    pub color: [f32; 4],
    pub repeat_period: [f32; 2],
    pub depth: f32,
    pub mode: u32,
}

impl FilledAreaStyle {
    pub fn uniform(&self) -> AreaUniform {
        AreaUniform {
            color: self.color.to_f32_array(),
            repeat_period: self.fill.texture().map_or([1.0, 1.0], |t| t.repeat_period),
            depth: depth_from_z_order(self.z_order),
            mode: self.fill.mode(),
        }
    }
}

pub struct FilledAreaGroup {
    name: String,
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    style_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blank: GpuTexture,
    style: FilledAreaStyle,
    style_buffer: wgpu::Buffer,
    style_dirty: bool,
    texture: Option<Rc<GpuTexture>>,
    texture_resolved: bool,
    bind_group: Option<wgpu::BindGroup>,
    areas: Vec<FilledArea>,
    areas_key: u64,
    built_key: Option<u64>,
    mesh: Option<GpuMesh>,
    issues: Vec<GeometryIssue>,
}

impl FilledAreaGroup {
    pub fn new(ctx: &GpuContext, name: impl Into<String>, style: FilledAreaStyle) -> ChartCanvasResult<Self> {
        let device = ctx.device.clone();
        let shader = create_chart_shader(&device, "filled_area_shader", SHADER);
        let style_layout = create_style_bind_group_layout(&device, "filled_area_style_layout", false);
        let pipeline = create_chart_pipeline(
            &device,
            "filled_area_pipeline",
            &shader,
            &[&ctx.view_layout, &style_layout],
            AreaVertex::layout(),
            ctx.color_format,
        );
        let style_buffer = create_uniform_buffer(&device, "filled_area_style", &style.uniform());

        Ok(Self {
            name: name.into(),
            sampler: create_sampler(&device, wgpu::AddressMode::Repeat),
            blank: GpuTexture::blank(&device, &ctx.queue)?,
            queue: ctx.queue.clone(),
            device,
            pipeline,
            style_layout,
            style,
            style_buffer,
            style_dirty: false,
            texture: None,
            texture_resolved: false,
            bind_group: None,
            areas: Vec::new(),
            areas_key: content_key::<FilledArea>(&[]),
            built_key: None,
            mesh: None,
            issues: Vec::new(),
        })
    }

    pub fn set_areas(&mut self, areas: Vec<FilledArea>) {
        self.areas_key = content_key(&areas);
        self.areas = areas;
    }

    pub fn style(&self) -> &FilledAreaStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: FilledAreaStyle) {
        if style.fill.texture() != self.style.fill.texture() {
            self.texture_resolved = false;
        }
        self.style = style;
        self.style_dirty = true;
    }

    fn resolve_texture(&mut self, textures: &mut TextureCache) {
        let (device, queue) = (&self.device, &self.queue);
        self.texture = self.style.fill.texture().and_then(|fill| {
            textures.gpu_texture(fill.cache_key(), || {
                GpuTexture::from_texels(
                    device,
                    queue,
                    "area_fill_texture",
                    fill.width,
                    fill.height,
                    wgpu::TextureFormat::Rgba8Unorm,
                    &fill.pixels,
                )
            })
        });
        if self.style.fill.texture().is_some() && self.texture.is_none() {
            log::warn!("[FilledAreaGroup] '{}' falls back to its color fill", self.name);
            self.style.fill = AreaFill::Color;
        }
        self.texture_resolved = true;
        self.bind_group = None;
        self.style_dirty = true;
    }

    fn create_bind_group(&self) -> wgpu::BindGroup {
        let view = match &self.texture {
            Some(texture) => &texture.view,
            None => &self.blank.view,
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("filled_area_bind_group"),
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

impl ChartRenderable for FilledAreaGroup {
    fn prepare(&mut self, textures: &mut TextureCache) {
        if !self.texture_resolved {
            self.resolve_texture(textures);
        }

        if self.built_key != Some(self.areas_key) {
            let buffers = build_area_buffers(&self.areas);
            log_issues("FilledAreaGroup", &buffers.issues);
            log::debug!(
                "[FilledAreaGroup] '{}' triangulated {} areas into {} triangles",
                self.name,
                buffers.area_count,
                buffers.triangle_count()
            );
            self.mesh = GpuMesh::upload(&self.device, "filled_areas", &buffers.vertices, &buffers.indices);
            self.issues = buffers.issues;
            self.built_key = Some(self.areas_key);
        }

        if self.style_dirty {
            self.queue
                .write_buffer(&self.style_buffer, 0, bytemuck::bytes_of(&self.style.uniform()));
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
        let mut pass = begin_group_pass(encoder, "Filled Area Group", view, depth_view);
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

    fn checker() -> FillTexture {
        FillTexture {
            width: 2,
            height: 2,
            pixels: vec![255, 0, 0, 255, 0, 0, 0, 0, 0, 0, 0, 0, 255, 0, 0, 255],
            repeat_period: [8.0, 8.0],
        }
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<AreaUniform>(), 32);
    }

    #[test]
    fn test_fill_modes() {
        let mut style = FilledAreaStyle::default();
        assert_eq!(style.uniform().mode, 0);
        assert_eq!(style.uniform().repeat_period, [1.0, 1.0]);

        style.fill = AreaFill::Image(checker());
        assert_eq!(style.uniform().mode, 1);

        style.fill = AreaFill::Pattern(checker());
        let uniform = style.uniform();
        assert_eq!(uniform.mode, 2);
        assert_eq!(uniform.repeat_period, [8.0, 8.0]);
    }

    #[test]
    fn test_fill_texture_key_tracks_pixels() {
        let a = checker();
        let mut b = checker();
        assert_eq!(a.cache_key(), b.cache_key());
        b.pixels[0] = 0;
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
