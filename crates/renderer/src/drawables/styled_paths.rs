//! Polylines with per-point color and width, beveled joints and dashes that
//! stay put under anisotropic zoom.

use std::rc::Rc;

use chart_canvas_config::RenderTuning;
use chart_canvas_shared::{depth_from_z_order, ChartCanvasResult, GeometryIssue, Rgba};

use super::shared_utils::{
    begin_group_pass, create_chart_pipeline, create_chart_shader, create_style_bind_group_layout,
    create_uniform_buffer, resolve_dash_texture, GpuMesh,
};
use super::{ChartRenderable, FrameContext};
use crate::geometry::{build_path_buffers, content_key, log_issues, Path, PathBuffers, PathVertex};
use crate::gpu_context::GpuContext;
use crate::textures::gpu::create_sampler;
use crate::textures::{DashEntry, GpuTexture, TextureCache};

const SHADER: &str = include_str!("../shaders/styled_paths.wgsl");

#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub color: Rgba,
    pub width: f32,
    /// Alternating dash/gap runs in pixels; empty for a solid stroke.
    pub dash: Vec<f32>,
    pub z_order: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            width: 2.0,
            dash: Vec::new(),
            z_order: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PathUniform {
    pub color: [f32; 4],
    pub width: f32,
    pub depth: f32,
    pub pattern_size: f32,
    pub dash_row_v: f32,
    pub hist_max: f32,
    pub hist_per_row: u32,
    pub bucket_count: u32,
    pub _pad: u32,
}

impl PathStyle {
    pub fn with_default_dash(mut self, tuning: &RenderTuning) -> Self {
        self.dash = tuning.default_path_dash.clone();
        self
    }

    pub fn uniform(&self, dash: Option<&DashEntry>, buffers: Option<&PathBuffers>) -> PathUniform {
        PathUniform {
            color: self.color.to_f32_array(),
            width: self.width,
            depth: depth_from_z_order(self.z_order),
            pattern_size: dash.map_or(0.0, |d| d.pattern_length),
            dash_row_v: dash.map_or(0.0, DashEntry::row_v),
            hist_max: buffers.map_or(1.0, |b| b.histogram_max),
            hist_per_row: buffers.map_or(1, |b| b.layout.points_per_row),
            bucket_count: buffers.map_or(2, |b| b.layout.buckets),
            _pad: 0,
        }
    }
}

pub struct StyledPathGroup {
    name: String,
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    style_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blank: GpuTexture,
    tuning: RenderTuning,
    style: PathStyle,
    style_buffer: wgpu::Buffer,
    style_dirty: bool,
    dash: Option<(Rc<GpuTexture>, DashEntry)>,
    dash_resolved: bool,
    histogram: Option<GpuTexture>,
    bind_group: Option<wgpu::BindGroup>,
    paths: Vec<Path>,
    paths_key: u64,
    built: Option<(u64, PathBuffers)>,
    mesh: Option<GpuMesh>,
}

impl StyledPathGroup {
    pub fn new(
        ctx: &GpuContext,
        name: impl Into<String>,
        style: PathStyle,
        tuning: &RenderTuning,
    ) -> ChartCanvasResult<Self> {
        let device = ctx.device.clone();
        let shader = create_chart_shader(&device, "styled_path_shader", SHADER);
        let style_layout = create_style_bind_group_layout(&device, "styled_path_style_layout", true);
        let pipeline = create_chart_pipeline(
            &device,
            "styled_path_pipeline",
            &shader,
            &[&ctx.view_layout, &style_layout],
            PathVertex::layout(),
            ctx.color_format,
        );
        let style_buffer = create_uniform_buffer(&device, "styled_path_style", &style.uniform(None, None));

        let mut tuning = tuning.clone();
        let max_width = ctx.max_texture_dimension();
        if tuning.max_histogram_texture_width > max_width {
            log::info!(
                "[StyledPathGroup] Histogram rows limited to the device maximum of {} texels",
                max_width
            );
            tuning.max_histogram_texture_width = max_width;
        }

        Ok(Self {
            name: name.into(),
            sampler: create_sampler(&device, wgpu::AddressMode::Repeat),
            blank: GpuTexture::blank(&device, &ctx.queue)?,
            queue: ctx.queue.clone(),
            device,
            pipeline,
            style_layout,
            tuning,
            style,
            style_buffer,
            style_dirty: false,
            dash: None,
            dash_resolved: false,
            histogram: None,
            bind_group: None,
            paths: Vec::new(),
            paths_key: content_key::<Path>(&[]),
            built: None,
            mesh: None,
        })
    }

    pub fn set_paths(&mut self, paths: Vec<Path>) {
        self.paths_key = content_key(&paths);
        self.paths = paths;
    }

    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: PathStyle) {
        if style.dash != self.style.dash {
            self.dash_resolved = false;
        }
        self.style = style;
        self.style_dirty = true;
    }

    fn rebuild_geometry(&mut self) {
        let buffers = build_path_buffers(&self.paths, &self.tuning);
        log_issues("StyledPathGroup", &buffers.issues);
        log::debug!(
            "[StyledPathGroup] '{}' rebuilt {} paths, histogram {}x{}",
            self.name,
            buffers.path_count,
            buffers.layout.width,
            buffers.layout.height
        );

        self.mesh = GpuMesh::upload(&self.device, "styled_paths", &buffers.vertices, &buffers.indices);
        self.histogram = match GpuTexture::from_texels(
            &self.device,
            &self.queue,
            "path_histogram",
            buffers.layout.width,
            buffers.layout.height,
            wgpu::TextureFormat::R32Float,
            bytemuck::cast_slice(&buffers.histogram),
        ) {
            Ok(texture) => Some(texture),
            Err(e) => {
                log::error!("[StyledPathGroup] '{}' histogram upload failed: {}", self.name, e);
                self.mesh = None;
                None
            }
        };
        self.built = Some((self.paths_key, buffers));
        self.bind_group = None;
        self.style_dirty = true;
    }

    fn create_bind_group(&self) -> Option<wgpu::BindGroup> {
        let histogram = self.histogram.as_ref()?;
        let dash_view = match &self.dash {
            Some((texture, _)) => &texture.view,
            None => &self.blank.view,
        };
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("styled_path_bind_group"),
            layout: &self.style_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.style_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(dash_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&histogram.view),
                },
            ],
        }))
    }
}

impl ChartRenderable for StyledPathGroup {
    fn prepare(&mut self, textures: &mut TextureCache) {
        if !self.dash_resolved {
            self.dash = resolve_dash_texture(&self.device, &self.queue, textures, &self.style.dash);
            self.dash_resolved = true;
            self.bind_group = None;
            self.style_dirty = true;
        }

        if self.built.as_ref().map(|(key, _)| *key) != Some(self.paths_key) {
            self.rebuild_geometry();
        }

        if self.style_dirty {
            let uniform = self.style.uniform(
                self.dash.as_ref().map(|(_, entry)| entry),
                self.built.as_ref().map(|(_, buffers)| buffers),
            );
            self.queue
                .write_buffer(&self.style_buffer, 0, bytemuck::bytes_of(&uniform));
            self.style_dirty = false;
        }
        if self.bind_group.is_none() {
            self.bind_group = self.create_bind_group();
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
        let mut pass = begin_group_pass(encoder, "Styled Path Group", view, depth_view);
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
        self.built
            .as_ref()
            .map_or(&[][..], |(_, buffers)| buffers.issues.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<PathUniform>(), 48);
    }

    #[test]
    fn test_uniform_carries_histogram_layout() {
        let tuning = RenderTuning::default();
        let buffers = build_path_buffers(&[Path::new(vec![0.0, 3.0], vec![0.0, 4.0])], &tuning);
        let uniform = PathStyle::default().uniform(None, Some(&buffers));
        assert_eq!(uniform.bucket_count, 5);
        assert_eq!(uniform.hist_per_row, 4096 / 5);
        assert!((uniform.hist_max - 5.0).abs() < 1e-6);
        assert_eq!(uniform.pattern_size, 0.0);
    }
}
