//! GPU realization of registered textures.

use crate::context::TextureDesc;

/// A registered texture as a wgpu texture and its default view.
///
/// 2D textures are created with `RENDER_ATTACHMENT | TEXTURE_BINDING |
/// COPY_DST`, so any of them can serve as a framebuffer attachment in one
/// pass and be sampled in the next. 3D textures are sample-only.
pub struct GpuTexture {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
    /// Shape and format it was created from.
    pub desc: TextureDesc,
}

impl GpuTexture {
    /// Create the texture described by `desc`.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str, desc: TextureDesc) -> Self {
        let (dimension, usage) = if desc.is_3d() {
            (
                wgpu::TextureDimension::D3,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            )
        } else {
            (
                wgpu::TextureDimension::D2,
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST,
            )
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: desc.depth.max(1),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: desc.format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            desc,
        }
    }

    /// Upload tightly packed texel rows covering the whole texture.
    pub fn upload(&self, queue: &wgpu::Queue, data: &[u8]) {
        let block = u64::from(self.desc.format.block_copy_size(None).unwrap_or(4));
        let row = u64::from(self.desc.width) * block;
        let expected = row * u64::from(self.desc.height) * u64::from(self.desc.depth);
        if data.len() as u64 != expected {
            log::warn!(
                "texture upload of {} bytes skipped, {expected} expected",
                data.len()
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row as u32),
                rows_per_image: Some(self.desc.height),
            },
            self.texture.size(),
        );
    }

    /// Whether the format can be read through a filtering sampler.
    #[must_use]
    pub fn is_filterable(&self) -> bool {
        matches!(
            self.desc.format.sample_type(None, None),
            Some(wgpu::TextureSampleType::Float { filterable: true })
        )
    }
}
