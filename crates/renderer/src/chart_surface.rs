//! Chart surface: owns the viewport, the shared textures and the groups,
//! and draws them into a target view once per frame.

use std::any::Any;

use chart_canvas_config::{ChartCanvasConfig, GridStyle};
use chart_canvas_shared::{
    CanvasSize, ChartCanvasResult, ChartEvent, ChartInputEvent, GeometryIssue, Rgba, VisibleRange,
};

use crate::controls::ViewportController;
use crate::drawables::shared_utils::{create_uniform_buffer, DEPTH_FORMAT};
use crate::drawables::{draw_order, ChartRenderable, FrameContext, LineGroup};
use crate::gpu_context::GpuContext;
use crate::grid::{grid_line_style, GridState, GRID_GROUP};
use crate::textures::TextureCache;
use crate::ticks::{DecimalTicks, TickGenerator};
use crate::transform::{ChartTransform, ViewUniform};

struct DepthTarget {
    size: CanvasSize,
    view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, size: CanvasSize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("chart_depth_texture"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { size, view }
    }
}

/// Type-erased group plus a downcast hook so callers can update its data.
pub trait SurfaceGroup: ChartRenderable {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ChartRenderable + 'static> SurfaceGroup for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct ChartSurface {
    ctx: GpuContext,
    controller: ViewportController,
    textures: TextureCache,
    groups: Vec<Box<dyn SurfaceGroup>>,
    view_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    uploaded_view: Option<ViewUniform>,
    depth: Option<DepthTarget>,
    clear_color: Rgba,
    grid: Option<GridState>,
}

impl ChartSurface {
    pub fn new(ctx: GpuContext, config: &ChartCanvasConfig) -> Self {
        let controller = ViewportController::new(config);
        let view_buffer = create_uniform_buffer(&ctx.device, "chart_view_uniform", &controller.transform().view_uniform());
        let view_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("chart_view_bind_group"),
            layout: &ctx.view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buffer.as_entire_binding(),
            }],
        });

        log::info!(
            "[ChartSurface] Created for data range {:?} in region {:?}",
            config.data_range,
            config.chart_region
        );

        let mut surface = Self {
            ctx,
            controller,
            textures: TextureCache::new(),
            groups: Vec::new(),
            view_buffer,
            view_bind_group,
            uploaded_view: None,
            depth: None,
            clear_color: config.rendering.clear_color,
            grid: None,
        };
        if config.grid.enabled {
            if let Err(e) = surface.enable_grid(&config.grid, DecimalTicks) {
                log::warn!("[ChartSurface] Grid disabled: {}", e);
            }
        }
        surface
    }

    /// Draw lines at every tick of the visible range, replacing any
    /// existing grid.
    pub fn enable_grid(
        &mut self,
        style: &GridStyle,
        ticks: impl TickGenerator + 'static,
    ) -> ChartCanvasResult<()> {
        self.remove_group(GRID_GROUP);
        let group = LineGroup::new(&self.ctx, GRID_GROUP, grid_line_style(style))?;
        self.add_group(group);
        self.grid = Some(GridState::new(Box::new(ticks)));
        Ok(())
    }

    pub fn disable_grid(&mut self) {
        self.grid = None;
        self.remove_group(GRID_GROUP);
    }

    fn refresh_grid(&mut self) {
        let visible = self.controller.visible_range();
        let Some(lines) = self.grid.as_mut().and_then(|g| g.update(visible)) else {
            return;
        };
        if let Some(group) = self.group_mut::<LineGroup>(GRID_GROUP) {
            log::trace!("[ChartSurface] Grid now has {} lines", lines.len());
            group.set_lines(lines);
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.controller.visible_range()
    }

    pub fn set_visible_range(&mut self, range: VisibleRange) -> VisibleRange {
        self.controller.set_visible_range(range)
    }

    pub fn transform(&self) -> ChartTransform {
        self.controller.transform()
    }

    pub fn add_group<G: ChartRenderable + 'static>(&mut self, group: G) {
        log::debug!(
            "[ChartSurface] Adding group '{}' at z-order {}",
            group.name(),
            group.z_order()
        );
        self.groups.push(Box::new(group));
    }

    pub fn remove_group(&mut self, name: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name() != name);
        before != self.groups.len()
    }

    /// Mutable access to a group by name, if it has type `G`.
    pub fn group_mut<G: ChartRenderable + 'static>(&mut self, name: &str) -> Option<&mut G> {
        self.groups
            .iter_mut()
            .find(|g| g.name() == name)
            .and_then(|g| g.as_any_mut().downcast_mut::<G>())
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name()).collect()
    }

    /// Diagnostics from the last rebuild of every group that dropped input.
    pub fn issues(&self) -> Vec<(&str, &[GeometryIssue])> {
        self.groups
            .iter()
            .filter(|g| !g.issues().is_empty())
            .map(|g| (g.name(), g.issues()))
            .collect()
    }

    pub fn handle_event(&mut self, event: &ChartInputEvent) -> Option<ChartEvent> {
        if let ChartInputEvent::Resize { size } = event {
            self.resize(*size);
            return None;
        }
        self.controller.handle_event(event)
    }

    /// Canvas-derived state only: the view uniform and the depth target.
    pub fn resize(&mut self, size: CanvasSize) {
        self.controller.resize(size);
        if self.depth.as_ref().map(|d| d.size) != Some(size) {
            self.depth = (!size.is_empty()).then(|| DepthTarget::new(&self.ctx.device, size));
        }
        for group in &mut self.groups {
            group.resize(size.width, size.height);
        }
    }

    /// Drive pending texture builds, let groups rebuild changed input and
    /// draw everything into `target`.
    pub fn render(&mut self, target: &wgpu::TextureView) -> ChartCanvasResult<()> {
        let canvas = self.controller.canvas_size();
        if canvas.is_empty() {
            log::debug!("[ChartSurface] Skipping frame before the first resize");
            return Ok(());
        }
        if self.depth.is_none() {
            self.depth = Some(DepthTarget::new(&self.ctx.device, canvas));
        }

        self.refresh_grid();
        self.textures.run_pending();
        for group in &mut self.groups {
            group.prepare(&mut self.textures);
        }
        self.textures.evict_unused();

        let transform = self.controller.transform();
        let uniform = transform.view_uniform();
        if self.uploaded_view != Some(uniform) {
            self.ctx
                .queue
                .write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&uniform));
            self.uploaded_view = Some(uniform);
        }

        let Some(depth) = &self.depth else {
            return Ok(());
        };
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Chart Surface Encoder"),
            });

        let [r, g, b, a] = self.clear_color.to_f32_array();
        drop(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Chart Surface Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        }));

        let frame = FrameContext {
            transform: &transform,
            view_bind_group: &self.view_bind_group,
        };
        let z_orders: Vec<f32> = self.groups.iter().map(|g| g.z_order()).collect();
        for index in draw_order(&z_orders) {
            let group = &mut self.groups[index];
            if !group.is_ready() {
                log::trace!("[ChartSurface] Skipping group '{}' (not ready)", group.name());
                continue;
            }
            group.render(&mut encoder, target, &depth.view, &frame);
        }

        self.ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
