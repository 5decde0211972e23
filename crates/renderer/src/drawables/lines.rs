//! Straight lines spanning the visible window, optionally dashed.

use std::rc::Rc;

use chart_canvas_config::RenderTuning;
use chart_canvas_shared::{depth_from_z_order, ChartCanvasResult, GeometryIssue, Rgba};

use super::shared_utils::{
    begin_group_pass, create_chart_pipeline, create_chart_shader, create_style_bind_group_layout,
    create_uniform_buffer, resolve_dash_texture, GpuMesh,
};
use super::{ChartRenderable, FrameContext};
use crate::geometry::{build_line_buffers, content_key, log_issues, Line, LineVertex};
use crate::gpu_context::GpuContext;
use crate::textures::gpu::create_sampler;
use crate::textures::{DashEntry, GpuTexture, TextureCache};

const SHADER: &str = include_str!("../shaders/lines.wgsl");

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: Rgba,
    /// Stroke width in pixels.
    pub width: f32,
    /// Alternating dash/gap runs in pixels; empty for a solid line.
    pub dash: Vec<f32>,
    pub z_order: f32,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Rgba::BLACK,
            width: 1.0,
            dash: Vec::new(),
            z_order: 0.0,
        }
    }
}

impl LineStyle {
    pub fn with_default_dash(mut self, tuning: &RenderTuning) -> Self {
        self.dash = tuning.default_line_dash.clone();
        self
    }

    pub fn uniform(&self, dash: Option<&DashEntry>) -> LineUniform {
        LineUniform {
            color: self.color.to_f32_array(),
            width: self.width,
            depth: depth_from_z_order(self.z_order),
            pattern_size: dash.map_or(0.0, |d| d.pattern_length),
            dash_row_v: dash.map_or(0.0, DashEntry::row_v),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineUniform {
    pub color: [f32; 4],
    pub width: f32,
    pub depth: f32,
    pub pattern_size: f32,
    pub dash_row_v: f32,
}

pub struct LineGroup {
    name: String,
    device: Rc<wgpu::Device>,
    queue: Rc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    style_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blank: GpuTexture,
    style: LineStyle,
    style_buffer: wgpu::Buffer,
    style_dirty: bool,
    dash: Option<(Rc<GpuTexture>, DashEntry)>,
    dash_resolved: bool,
    bind_group: Option<wgpu::BindGroup>,
    lines: Vec<Line>,
    lines_key: u64,
    built_key: Option<u64>,
    mesh: Option<GpuMesh>,
    issues: Vec<GeometryIssue>,
}

impl LineGroup {
    pub fn new(ctx: &GpuContext, name: impl Into<String>, style: LineStyle) -> ChartCanvasResult<Self> {
        let device = ctx.device.clone();
        let shader = create_chart_shader(&device, "line_shader", SHADER);
        let style_layout = create_style_bind_group_layout(&device, "line_style_layout", false);
        let pipeline = create_chart_pipeline(
            &device,
            "line_pipeline",
            &shader,
            &[&ctx.view_layout, &style_layout],
            LineVertex::layout(),
            ctx.color_format,
        );
        let style_buffer = create_uniform_buffer(&device, "line_style", &style.uniform(None));

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
            dash: None,
            dash_resolved: false,
            bind_group: None,
            lines: Vec::new(),
            lines_key: content_key::<Line>(&[]),
            built_key: None,
            mesh: None,
            issues: Vec::new(),
        })
    }

    pub fn set_lines(&mut self, lines: Vec<Line>) {
        self.lines_key = content_key(&lines);
        self.lines = lines;
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: LineStyle) {
        if style.dash != self.style.dash {
            self.dash_resolved = false;
        }
        self.style = style;
        self.style_dirty = true;
    }

    fn create_bind_group(&self) -> wgpu::BindGroup {
        let view = match &self.dash {
            Some((texture, _)) => &texture.view,
            None => &self.blank.view,
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("line_bind_group"),
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

impl ChartRenderable for LineGroup {
    fn prepare(&mut self, textures: &mut TextureCache) {
        if !self.dash_resolved {
            self.dash = resolve_dash_texture(&self.device, &self.queue, textures, &self.style.dash);
            self.dash_resolved = true;
            self.bind_group = None;
            self.style_dirty = true;
        }

        if self.built_key != Some(self.lines_key) {
            let buffers = build_line_buffers(&self.lines);
            log_issues("LineGroup", &buffers.issues);
            log::debug!("[LineGroup] '{}' rebuilt {} lines", self.name, buffers.line_count());
            self.mesh = GpuMesh::upload(&self.device, "lines", &buffers.vertices, &buffers.indices);
            self.issues = buffers.issues;
            self.built_key = Some(self.lines_key);
        }

        if self.style_dirty {
            let uniform = self.style.uniform(self.dash.as_ref().map(|(_, entry)| entry));
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
        let mut pass = begin_group_pass(encoder, "Line Group", view, depth_view);
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
