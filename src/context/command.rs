//! The recorded frame command stream.
//!
//! Every state change and draw issued against a [`Context`](super::Context)
//! is appended here in call order. The GPU backend replays the stream; tests
//! inspect it directly.

use glam::Vec4;

use super::state::{Capability, ClearMask, Viewport};
use super::{FramebufferId, MeshId, ProgramId, TextureHandle};

/// A texture bound to a shader binding slot for one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    /// `@binding` index in group 0.
    pub binding: u32,
    /// Bound texture.
    pub texture: TextureHandle,
}

/// One draw with the program state captured at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Program used.
    pub program: ProgramId,
    /// Mesh drawn.
    pub mesh: MeshId,
    /// Copy of the program's uniform block.
    pub uniforms: Vec<u8>,
    /// Texture bindings resolved from the program's texture map.
    pub textures: Vec<TextureBinding>,
}

/// One recorded operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Bind a framebuffer (`None` = default surface).
    BindTarget(Option<FramebufferId>),
    /// Make a program current.
    UseProgram(ProgramId),
    /// Set the viewport rectangle.
    Viewport(Viewport),
    /// Set the clear color used by subsequent color clears.
    ClearColor(Vec4),
    /// Clear buffers of the bound target.
    Clear(ClearMask),
    /// Enable or disable a capability.
    SetCapability(Capability, bool),
    /// Draw a mesh.
    Draw(DrawCall),
}

impl Command {
    /// Whether this is a draw.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw(_))
    }
}
