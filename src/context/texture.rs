//! Texture registry: handles, descriptors, and pending CPU-side uploads.

use std::num::NonZeroU32;
use std::path::Path;

use super::Context;
use crate::error::VolrenError;
use crate::importer::VolumeData;

/// Handle to a texture registered with a [`Context`].
///
/// Handles are never zero, so `Option<TextureHandle>` takes the place of
/// the "0 means absent" convention of raw graphics APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(NonZeroU32);

impl TextureHandle {
    /// Wrap a raw id. Returns `None` for zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// The raw non-zero id.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Sampling filter recorded for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    /// Nearest-neighbour.
    #[default]
    Nearest,
    /// Bilinear / trilinear.
    Linear,
}

/// Shape and format of a registered texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels (1 for 2D textures).
    pub depth: u32,
    /// Texel format.
    pub format: wgpu::TextureFormat,
    /// Sampling filter.
    pub filter: Filter,
}

impl TextureDesc {
    /// 2D texture descriptor.
    #[must_use]
    pub fn new_2d(width: u32, height: u32, format: wgpu::TextureFormat, filter: Filter) -> Self {
        Self {
            width,
            height,
            depth: 1,
            format,
            filter,
        }
    }

    /// Whether this is a 3D texture.
    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Whether the texture holds depth values.
    #[must_use]
    pub fn is_depth(&self) -> bool {
        self.format.is_depth_stencil_format()
    }
}

/// Format and filter for framebuffer color attachments.
///
/// Passed explicitly wherever attachments are allocated, so one
/// framebuffer's G-Buffer format never leaks into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentConfig {
    /// Texel format of each new attachment.
    pub format: wgpu::TextureFormat,
    /// Sampling filter of each new attachment.
    pub filter: Filter,
}

impl AttachmentConfig {
    /// 8-bit RGBA, nearest filtering.
    pub const RGBA8: Self = Self {
        format: wgpu::TextureFormat::Rgba8Unorm,
        filter: Filter::Nearest,
    };
    /// 32-bit float RGBA for G-Buffers that store arbitrary values.
    pub const RGBA32F: Self = Self {
        format: wgpu::TextureFormat::Rgba32Float,
        filter: Filter::Nearest,
    };
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self::RGBA8
    }
}

/// Depth format used for every framebuffer depth texture.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Registered textures and the data waiting to be uploaded to them.
#[derive(Debug, Default)]
pub struct TextureRegistry {
    descs: Vec<TextureDesc>,
    pending: Vec<(TextureHandle, Vec<u8>)>,
}

impl TextureRegistry {
    /// Register a texture and return its handle.
    pub fn insert(&mut self, desc: TextureDesc) -> TextureHandle {
        self.descs.push(desc);
        // Handles start at 1; the registry never shrinks.
        TextureHandle(NonZeroU32::MIN.saturating_add(self.descs.len() as u32 - 1))
    }

    /// Descriptor of `handle`, if registered.
    #[must_use]
    pub fn get(&self, handle: TextureHandle) -> Option<&TextureDesc> {
        self.descs.get(handle.raw() as usize - 1)
    }

    /// Number of registered textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// All handles with their descriptors.
    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &TextureDesc)> {
        self.descs
            .iter()
            .enumerate()
            .filter_map(|(i, d)| TextureHandle::from_raw(i as u32 + 1).map(|h| (h, d)))
    }

    /// Queue texel data for `handle`.
    pub fn queue_upload(&mut self, handle: TextureHandle, data: Vec<u8>) {
        self.pending.push((handle, data));
    }

    /// Take every queued upload.
    pub fn take_uploads(&mut self) -> Vec<(TextureHandle, Vec<u8>)> {
        std::mem::take(&mut self.pending)
    }
}

impl Context {
    /// Register a texture described by `desc`.
    pub fn create_texture(&mut self, desc: TextureDesc) -> TextureHandle {
        let handle = self.textures.insert(desc);
        log::debug!(
            "texture {} created: {}x{}x{} {:?}",
            handle.raw(),
            desc.width,
            desc.height,
            desc.depth,
            desc.format
        );
        handle
    }

    /// Descriptor of a registered texture.
    #[must_use]
    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureDesc> {
        self.textures.get(handle)
    }

    /// Decode an image file into an RGBA8 texture, flipped vertically so
    /// row 0 is the bottom of the image.
    ///
    /// # Errors
    ///
    /// Returns [`VolrenError::Image`] if the file cannot be opened or
    /// decoded.
    pub fn load_texture(&mut self, path: &Path) -> Result<TextureHandle, VolrenError> {
        let image = image::open(path)
            .map_err(|e| {
                log::error!("Unable to open image {}: {e}", path.display());
                VolrenError::Image(e)
            })?
            .flipv()
            .to_rgba8();
        let (width, height) = image.dimensions();
        let handle = self.create_texture(TextureDesc::new_2d(
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
            Filter::Linear,
        ));
        self.textures.queue_upload(handle, image.into_raw());
        log::info!("Loaded texture {} ({width}x{height})", path.display());
        Ok(handle)
    }

    /// Register a signed 16-bit 3D texture holding `volume`'s samples.
    pub fn create_volume_texture(&mut self, volume: &VolumeData<i16>) -> TextureHandle {
        let handle = self.create_texture(TextureDesc {
            width: volume.size_x,
            height: volume.size_y,
            depth: volume.size_z,
            format: wgpu::TextureFormat::R16Sint,
            filter: Filter::Nearest,
        });
        self.textures
            .queue_upload(handle, bytemuck::cast_slice(&volume.data).to_vec());
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_non_zero_and_sequential() {
        let mut reg = TextureRegistry::default();
        let desc = TextureDesc::new_2d(4, 4, wgpu::TextureFormat::Rgba8Unorm, Filter::Nearest);
        let a = reg.insert(desc);
        let b = reg.insert(desc);
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(reg.get(b), Some(&desc));
        assert!(reg.get(TextureHandle::from_raw(3).unwrap()).is_none());
        assert!(TextureHandle::from_raw(0).is_none());
    }

    #[test]
    fn volume_texture_queues_sample_bytes() {
        let mut ctx = Context::default();
        let volume = VolumeData::from_samples(2, 2, 2, vec![1_i16, -2, 3, -4, 5, -6, 7, -8]);
        let tex = ctx.create_volume_texture(&volume);
        let desc = ctx.texture(tex).unwrap();
        assert!(desc.is_3d());
        assert_eq!(desc.format, wgpu::TextureFormat::R16Sint);
        let uploads = ctx.textures.take_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1.len(), 16);
        assert!(ctx.textures.take_uploads().is_empty());
    }

    #[test]
    fn missing_image_is_an_error() {
        let mut ctx = Context::default();
        let result = ctx.load_texture(Path::new("/nonexistent/neon_sign.png"));
        assert!(matches!(result, Err(VolrenError::Image(_))));
        assert!(ctx.textures.is_empty());
    }
}
