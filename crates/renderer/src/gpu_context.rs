//! Device, queue and the layouts every chart group is built against.

use std::rc::Rc;

use chart_canvas_shared::{map_chart_error, ChartCanvasError, ChartCanvasResult};

use crate::drawables::shared_utils::create_view_bind_group_layout;

/// GPU handles shared by a chart surface and its groups.
#[derive(Clone)]
pub struct GpuContext {
    pub device: Rc<wgpu::Device>,
    pub queue: Rc<wgpu::Queue>,
    pub color_format: wgpu::TextureFormat,
    /// Layout of the per-frame view uniform (bind group 0 of every pipeline).
    pub view_layout: Rc<wgpu::BindGroupLayout>,
}

impl GpuContext {
    /// Wrap a device the host already created, e.g. together with its surface.
    pub fn new(device: Rc<wgpu::Device>, queue: Rc<wgpu::Queue>, color_format: wgpu::TextureFormat) -> Self {
        let view_layout = Rc::new(create_view_bind_group_layout(&device));
        Self {
            device,
            queue,
            color_format,
            view_layout,
        }
    }

    /// Request an adapter and device without a surface, for offscreen
    /// rendering.
    pub async fn headless(color_format: wgpu::TextureFormat) -> ChartCanvasResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or_else(|| ChartCanvasError::GpuInit {
                message: "no suitable GPU adapter".to_string(),
            })?;

        let info = adapter.get_info();
        log::info!("[GpuContext] Using adapter {} ({:?})", info.name, info.backend);

        let request = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Chart Canvas Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await;
        if let Err(e) = &request {
            log::error!("[GpuContext] Device request failed: {:?}", e);
        }
        let (device, queue) = map_chart_error!(request, GpuInit, "failed to create GPU device")?;

        Ok(Self::new(Rc::new(device), Rc::new(queue), color_format))
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
