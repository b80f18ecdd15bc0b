//! Off-screen render targets with lazily added color attachments.

use std::fmt;

use rustc_hash::FxHashMap;

use super::{Context, ContextError, FramebufferId, TextureDesc, TextureHandle};
use crate::context::texture::{AttachmentConfig, Filter, DEPTH_FORMAT};

/// Index of a color attachment (`COLOR_ATTACHMENT0 + n`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorAttachment(pub u32);

impl ColorAttachment {
    /// Attachment 0.
    pub const ATTACHMENT0: Self = Self(0);
    /// Attachment 1.
    pub const ATTACHMENT1: Self = Self(1);
    /// Attachment 2.
    pub const ATTACHMENT2: Self = Self(2);
    /// Attachment 3.
    pub const ATTACHMENT3: Self = Self(3);
}

/// Recoverable framebuffer usage errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferError {
    /// The replacement texture's size differs from the framebuffer's.
    SizeMismatch {
        /// Framebuffer size.
        expected: (u32, u32),
        /// Texture size.
        found: (u32, u32),
    },
    /// The attachment was never added.
    MissingAttachment(ColorAttachment),
    /// The texture handle is not registered.
    UnknownTexture(TextureHandle),
    /// The framebuffer id is not registered.
    UnknownFramebuffer(FramebufferId),
}

impl fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, found } => write!(
                f,
                "size of texture ({}x{}) differs from frame buffer size ({}x{})",
                found.0, found.1, expected.0, expected.1
            ),
            Self::MissingAttachment(att) => {
                write!(f, "color attachment {} does not exist", att.0)
            }
            Self::UnknownTexture(tex) => write!(f, "unknown texture {}", tex.raw()),
            Self::UnknownFramebuffer(id) => write!(f, "unknown framebuffer {}", id.0),
        }
    }
}

impl std::error::Error for FramebufferError {}

/// A fixed-size render target: one depth texture plus ordered color
/// attachments.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    depth: TextureHandle,
    colors: Vec<TextureHandle>,
    draw_buffers: Vec<ColorAttachment>,
    named: FxHashMap<String, TextureHandle>,
}

impl Framebuffer {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The depth texture.
    #[must_use]
    pub fn depth_texture(&self) -> TextureHandle {
        self.depth
    }

    /// Texture backing `attachment`; `None` iff it was never added.
    #[must_use]
    pub fn color_attachment(&self, attachment: ColorAttachment) -> Option<TextureHandle> {
        self.colors.get(attachment.0 as usize).copied()
    }

    /// All color attachment textures in attachment order.
    #[must_use]
    pub fn color_attachments(&self) -> &[TextureHandle] {
        &self.colors
    }

    /// Number of color attachments.
    #[must_use]
    pub fn num_color_attachments(&self) -> usize {
        self.colors.len()
    }

    /// Attachments written by fragment outputs, in output order.
    #[must_use]
    pub fn draw_buffers(&self) -> &[ColorAttachment] {
        &self.draw_buffers
    }

    /// Texture bound to fragment output `name`, for framebuffers built from
    /// an output map.
    #[must_use]
    pub fn buffer(&self, name: &str) -> Option<TextureHandle> {
        let tex = self.named.get(name).copied();
        if tex.is_none() {
            log::error!("Could not find buffer in frame buffer object: {name}");
        }
        tex
    }

    /// Color textures in draw-buffer order, as rendered into.
    #[must_use]
    pub fn targets(&self) -> Vec<TextureHandle> {
        self.draw_buffers
            .iter()
            .filter_map(|att| self.color_attachment(*att))
            .collect()
    }
}

impl Context {
    fn depth_desc(width: u32, height: u32) -> TextureDesc {
        TextureDesc::new_2d(width, height, DEPTH_FORMAT, Filter::Nearest)
    }

    /// Create a framebuffer with a depth texture and no color attachments.
    pub fn create_framebuffer(&mut self, width: u32, height: u32) -> FramebufferId {
        let depth = self.create_texture(Self::depth_desc(width, height));
        self.framebuffers.push(Framebuffer {
            width,
            height,
            depth,
            colors: Vec::new(),
            draw_buffers: Vec::new(),
            named: FxHashMap::default(),
        });
        FramebufferId(self.framebuffers.len() as u32 - 1)
    }

    /// Create a framebuffer with one color attachment per fragment output,
    /// ordered by output index, and remember each output's texture by name.
    ///
    /// Outputs beyond the attachment limit are skipped with a warning.
    pub fn create_framebuffer_with_outputs(
        &mut self,
        outputs: &FxHashMap<String, u32>,
        width: u32,
        height: u32,
        config: AttachmentConfig,
    ) -> FramebufferId {
        let id = self.create_framebuffer(width, height);
        let mut ordered: Vec<(&String, u32)> = outputs.iter().map(|(n, i)| (n, *i)).collect();
        ordered.sort_by_key(|(_, index)| *index);

        for (name, _) in ordered {
            if self.add_color_attachments(id, 1, config) == 0 {
                log::warn!("output {name} has no attachment left");
                continue;
            }
            if let Some(fb) = self.framebuffers.get_mut(id.0 as usize) {
                if let Some(&tex) = fb.colors.last() {
                    let _ = fb.named.insert(name.clone(), tex);
                }
            }
        }
        id
    }

    /// Framebuffer `id`, if registered.
    #[must_use]
    pub fn framebuffer(&self, id: FramebufferId) -> Option<&Framebuffer> {
        self.framebuffers.get(id.0 as usize)
    }

    /// Append `n` color attachments using `config`.
    ///
    /// Nothing is added (and a warning is logged) when the framebuffer would
    /// exceed [`Limits::max_color_attachments`](super::Limits). Returns the
    /// number of attachments added.
    pub fn add_color_attachments(
        &mut self,
        id: FramebufferId,
        n: u32,
        config: AttachmentConfig,
    ) -> u32 {
        let max = self.limits.max_color_attachments;
        let Some(fb) = self.framebuffers.get(id.0 as usize) else {
            log::error!("{}", FramebufferError::UnknownFramebuffer(id));
            return 0;
        };
        let current = fb.colors.len() as u32;
        if n > max.saturating_sub(current) {
            log::warn!(
                "Cannot add {n} color attachments: {current} of {max} already in use"
            );
            return 0;
        }
        let (width, height) = (fb.width, fb.height);

        log::info!("Creating color attachments: {n}");
        let handles: Vec<TextureHandle> = (0..n)
            .map(|_| {
                self.create_texture(TextureDesc::new_2d(width, height, config.format, config.filter))
            })
            .collect();

        let Some(fb) = self.framebuffers.get_mut(id.0 as usize) else {
            return 0;
        };
        for tex in handles {
            let attachment = ColorAttachment(fb.colors.len() as u32);
            fb.colors.push(tex);
            fb.draw_buffers.push(attachment);
        }
        n
    }

    fn check_size(&self, width: u32, height: u32, tex: TextureHandle) -> Result<(), FramebufferError> {
        let desc = self
            .textures
            .get(tex)
            .ok_or(FramebufferError::UnknownTexture(tex))?;
        if desc.width != width || desc.height != height {
            return Err(FramebufferError::SizeMismatch {
                expected: (width, height),
                found: (desc.width, desc.height),
            });
        }
        Ok(())
    }

    /// Replace the texture behind an existing color attachment.
    ///
    /// The replacement must match the framebuffer size exactly. Returns the
    /// previous texture, which stays registered.
    ///
    /// # Errors
    ///
    /// [`FramebufferError`] on unknown ids, size mismatch, or a missing
    /// attachment; the framebuffer is left unchanged.
    pub fn set_color_attachment(
        &mut self,
        id: FramebufferId,
        attachment: ColorAttachment,
        texture: TextureHandle,
    ) -> Result<TextureHandle, FramebufferError> {
        let result = self.replace_color(id, attachment, texture);
        if let Err(e) = &result {
            log::error!("ERROR : {e}");
        }
        result
    }

    fn replace_color(
        &mut self,
        id: FramebufferId,
        attachment: ColorAttachment,
        texture: TextureHandle,
    ) -> Result<TextureHandle, FramebufferError> {
        let fb = self
            .framebuffer(id)
            .ok_or(FramebufferError::UnknownFramebuffer(id))?;
        self.check_size(fb.width, fb.height, texture)?;
        let fb = self
            .framebuffers
            .get_mut(id.0 as usize)
            .ok_or(FramebufferError::UnknownFramebuffer(id))?;
        let slot = fb
            .colors
            .get_mut(attachment.0 as usize)
            .ok_or(FramebufferError::MissingAttachment(attachment))?;
        Ok(std::mem::replace(slot, texture))
    }

    /// Replace the depth texture. Same size rule as
    /// [`set_color_attachment`](Self::set_color_attachment).
    ///
    /// # Errors
    ///
    /// [`FramebufferError`] on an unknown id or texture, or a size mismatch.
    pub fn set_depth_texture(
        &mut self,
        id: FramebufferId,
        texture: TextureHandle,
    ) -> Result<TextureHandle, FramebufferError> {
        let fb = self
            .framebuffer(id)
            .ok_or(FramebufferError::UnknownFramebuffer(id))?;
        self.check_size(fb.width, fb.height, texture)?;
        let fb = self
            .framebuffers
            .get_mut(id.0 as usize)
            .ok_or(FramebufferError::UnknownFramebuffer(id))?;
        Ok(std::mem::replace(&mut fb.depth, texture))
    }

    /// Restrict the attachments written by fragment outputs.
    ///
    /// # Errors
    ///
    /// [`FramebufferError::MissingAttachment`] if any listed attachment does
    /// not exist.
    pub fn set_draw_buffers(
        &mut self,
        id: FramebufferId,
        buffers: &[ColorAttachment],
    ) -> Result<(), FramebufferError> {
        let fb = self
            .framebuffers
            .get_mut(id.0 as usize)
            .ok_or(FramebufferError::UnknownFramebuffer(id))?;
        if let Some(missing) = buffers.iter().find(|a| a.0 as usize >= fb.colors.len()) {
            return Err(FramebufferError::MissingAttachment(*missing));
        }
        fb.draw_buffers = buffers.to_vec();
        Ok(())
    }

    /// Bind `id` as the render target and set the viewport to its full
    /// size; `None` binds the default surface and leaves the viewport.
    ///
    /// # Errors
    ///
    /// [`ContextError::UnknownFramebuffer`] for an unregistered id.
    pub fn bind_framebuffer(&mut self, id: Option<FramebufferId>) -> Result<(), ContextError> {
        self.bind_target(id)?;
        if let Some(fb) = id.and_then(|id| self.framebuffer(id)) {
            let full = super::Viewport::full(fb.width, fb.height);
            self.set_viewport(full);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Limits;

    #[test]
    fn two_attachments_then_absent_third() {
        let mut ctx = Context::default();
        let fbo = ctx.create_framebuffer(256, 256);
        assert_eq!(ctx.add_color_attachments(fbo, 2, AttachmentConfig::RGBA8), 2);

        let fb = ctx.framebuffer(fbo).unwrap();
        let a0 = fb.color_attachment(ColorAttachment::ATTACHMENT0);
        let a1 = fb.color_attachment(ColorAttachment::ATTACHMENT1);
        assert!(a0.is_some());
        assert!(a1.is_some());
        assert_ne!(a0, a1);
        assert_ne!(a0, Some(fb.depth_texture()));
        assert_eq!(fb.color_attachment(ColorAttachment::ATTACHMENT2), None);
    }

    #[test]
    fn capacity_is_all_or_nothing() {
        let mut ctx = Context::new(Limits {
            max_color_attachments: 4,
        });
        let fbo = ctx.create_framebuffer(64, 64);
        assert_eq!(ctx.add_color_attachments(fbo, 3, AttachmentConfig::RGBA8), 3);
        assert_eq!(ctx.add_color_attachments(fbo, 2, AttachmentConfig::RGBA8), 0);
        assert_eq!(ctx.framebuffer(fbo).unwrap().num_color_attachments(), 3);
        assert_eq!(ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8), 1);
        assert_eq!(ctx.framebuffer(fbo).unwrap().num_color_attachments(), 4);
        assert_eq!(ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8), 0);
    }

    #[test]
    fn huge_request_leaves_count_unchanged() {
        let mut ctx = Context::new(Limits {
            max_color_attachments: 4,
        });
        let fbo = ctx.create_framebuffer(16, 16);
        assert_eq!(ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8), 1);
        assert_eq!(ctx.add_color_attachments(fbo, u32::MAX, AttachmentConfig::RGBA8), 0);
        assert_eq!(ctx.framebuffer(fbo).unwrap().num_color_attachments(), 1);
    }

    #[test]
    fn attachment_lookup_is_none_only_for_unadded() {
        let mut ctx = Context::default();
        let fbo = ctx.create_framebuffer(32, 32);
        for round in 0..3_u32 {
            let _ = ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8);
            let fb = ctx.framebuffer(fbo).unwrap();
            for i in 0..8 {
                assert_eq!(
                    fb.color_attachment(ColorAttachment(i)).is_none(),
                    i > round,
                    "attachment {i} after round {round}"
                );
            }
        }
    }

    #[test]
    fn attachments_use_explicit_config() {
        let mut ctx = Context::default();
        let gbuffer = ctx.create_framebuffer(16, 16);
        let plain = ctx.create_framebuffer(16, 16);
        let _ = ctx.add_color_attachments(gbuffer, 1, AttachmentConfig::RGBA32F);
        let _ = ctx.add_color_attachments(plain, 1, AttachmentConfig::default());

        let format_of = |ctx: &Context, fbo| {
            let tex = ctx
                .framebuffer(fbo)
                .unwrap()
                .color_attachment(ColorAttachment::ATTACHMENT0)
                .unwrap();
            ctx.texture(tex).unwrap().format
        };
        assert_eq!(format_of(&ctx, gbuffer), wgpu::TextureFormat::Rgba32Float);
        assert_eq!(format_of(&ctx, plain), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn replacement_requires_matching_size() {
        let mut ctx = Context::default();
        let fbo = ctx.create_framebuffer(128, 64);
        let _ = ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8);
        let original = ctx
            .framebuffer(fbo)
            .unwrap()
            .color_attachment(ColorAttachment::ATTACHMENT0)
            .unwrap();

        // Width matches, height does not.
        let wrong = ctx.create_texture(TextureDesc::new_2d(
            128,
            128,
            wgpu::TextureFormat::Rgba8Unorm,
            Filter::Nearest,
        ));
        let err = ctx
            .set_color_attachment(fbo, ColorAttachment::ATTACHMENT0, wrong)
            .unwrap_err();
        assert_eq!(
            err,
            FramebufferError::SizeMismatch {
                expected: (128, 64),
                found: (128, 128)
            }
        );
        assert_eq!(
            ctx.framebuffer(fbo).unwrap().color_attachment(ColorAttachment::ATTACHMENT0),
            Some(original)
        );

        let right = ctx.create_texture(TextureDesc::new_2d(
            128,
            64,
            wgpu::TextureFormat::Rgba8Unorm,
            Filter::Nearest,
        ));
        assert_eq!(
            ctx.set_color_attachment(fbo, ColorAttachment(3), right),
            Err(FramebufferError::MissingAttachment(ColorAttachment(3)))
        );
        assert_eq!(
            ctx.set_color_attachment(fbo, ColorAttachment::ATTACHMENT0, right),
            Ok(original)
        );
    }

    #[test]
    fn output_map_names_attachments_in_index_order() {
        let mut ctx = Context::default();
        let outputs: FxHashMap<String, u32> = [
            ("fragNormal".to_owned(), 1),
            ("fragColor".to_owned(), 0),
            ("fragPosition".to_owned(), 2),
        ]
        .into_iter()
        .collect();
        let fbo = ctx.create_framebuffer_with_outputs(&outputs, 32, 32, AttachmentConfig::RGBA32F);
        let fb = ctx.framebuffer(fbo).unwrap();
        assert_eq!(fb.num_color_attachments(), 3);
        assert_eq!(fb.buffer("fragColor"), fb.color_attachment(ColorAttachment(0)));
        assert_eq!(fb.buffer("fragNormal"), fb.color_attachment(ColorAttachment(1)));
        assert_eq!(fb.buffer("fragPosition"), fb.color_attachment(ColorAttachment(2)));
        assert_eq!(fb.buffer("missing"), None);
    }

    #[test]
    fn bind_sets_full_viewport() {
        let mut ctx = Context::default();
        let fbo = ctx.create_framebuffer(320, 200);
        ctx.bind_framebuffer(Some(fbo)).unwrap();
        assert_eq!(ctx.bound_framebuffer(), Some(fbo));
        assert_eq!(ctx.viewport(), crate::context::Viewport::full(320, 200));
        ctx.bind_framebuffer(None).unwrap();
        assert_eq!(ctx.bound_framebuffer(), None);
        assert!(ctx.bind_framebuffer(Some(FramebufferId(9))).is_err());
    }
}
