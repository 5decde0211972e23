//! Uploading CPU bitmaps into wgpu textures

use chart_canvas_shared::{ChartCanvasError, ChartCanvasResult};

use super::{DashTexture, MarkerAtlas};

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl GpuTexture {
    /// Create a 2D texture and fill it with tightly packed texels.
    pub fn from_texels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        texels: &[u8],
    ) -> ChartCanvasResult<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(ChartCanvasError::TextureTooLarge { width, height, max });
        }
        let bytes_per_texel = format.block_copy_size(None).unwrap_or(4);
        let expected = (width * height * bytes_per_texel) as usize;
        if texels.len() != expected {
            return Err(ChartCanvasError::Internal {
                message: format!(
                    "{}: {} bytes supplied for a {}x{} {:?} texture, expected {}",
                    label,
                    texels.len(),
                    width,
                    height,
                    format,
                    expected
                ),
            });
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bytes_per_texel),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("[GpuTexture] Uploaded {} ({}x{} {:?})", label, width, height, format);

        Ok(Self {
            texture,
            view,
            width,
            height,
            format,
        })
    }

    pub fn from_dash_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dash: &DashTexture,
    ) -> ChartCanvasResult<Self> {
        Self::from_texels(
            device,
            queue,
            "dash_texture",
            dash.width,
            dash.height,
            wgpu::TextureFormat::R8Unorm,
            &dash.pixels,
        )
    }

    pub fn from_marker_atlas(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        atlas: &MarkerAtlas,
    ) -> ChartCanvasResult<Self> {
        Self::from_texels(
            device,
            queue,
            "marker_atlas",
            atlas.width,
            atlas.height,
            wgpu::TextureFormat::Rgba8Unorm,
            &atlas.pixels,
        )
    }

    /// 1x1 fully transparent texture bound while real content is pending.
    pub fn blank(device: &wgpu::Device, queue: &wgpu::Queue) -> ChartCanvasResult<Self> {
        Self::from_texels(
            device,
            queue,
            "blank_texture",
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            &[0, 0, 0, 0],
        )
    }
}

/// Sampler shared by dash, marker and fill textures.
pub fn create_sampler(device: &wgpu::Device, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("chart_canvas_sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
