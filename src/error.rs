//! Crate-level error types.

use std::fmt;

use crate::context::{ContextError, FramebufferError};
use crate::gpu::render_context::RenderContextError;
use crate::shader::ShaderError;

/// Errors produced by the volren crate.
#[derive(Debug)]
pub enum VolrenError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Shader compilation or program linking failure.
    Shader(ShaderError),
    /// Framebuffer misuse that a caller chose to treat as fatal.
    Framebuffer(FramebufferError),
    /// A render pass referred to an unregistered resource.
    Context(ContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to open or decode an image file.
    Image(image::ImageError),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for VolrenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Shader(e) => write!(f, "shader error: {e}"),
            Self::Framebuffer(e) => write!(f, "framebuffer error: {e}"),
            Self::Context(e) => write!(f, "render state error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Image(e) => write!(f, "image error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for VolrenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Shader(e) => Some(e),
            Self::Framebuffer(e) => Some(e),
            Self::Context(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::OptionsParse(_) | Self::Viewer(_) => None,
        }
    }
}

impl From<RenderContextError> for VolrenError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<ShaderError> for VolrenError {
    fn from(e: ShaderError) -> Self {
        Self::Shader(e)
    }
}

impl From<FramebufferError> for VolrenError {
    fn from(e: FramebufferError) -> Self {
        Self::Framebuffer(e)
    }
}

impl From<ContextError> for VolrenError {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}

impl From<std::io::Error> for VolrenError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for VolrenError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}
