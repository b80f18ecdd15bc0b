//! Explicit rendering state.
//!
//! [`Context`] stands in for the process-wide state of an immediate-mode
//! graphics API: capability flags, the bound render target, the current
//! program, viewport and clear color. It also owns every resource the
//! render passes refer to (textures, framebuffers, programs, meshes) and
//! records each operation into a frame [`Command`] stream that the GPU
//! backend replays.
//!
//! Nothing here touches a device, so the whole state model is testable
//! headless.

/// The recorded frame command stream.
pub mod command;
/// Off-screen render targets.
pub mod framebuffer;
/// Capability, clear-mask and viewport vocabulary.
pub mod state;
/// Texture registry, handles and uploads.
pub mod texture;

use std::fmt;

use glam::Vec4;

pub use command::{Command, DrawCall, TextureBinding};
pub use framebuffer::{ColorAttachment, Framebuffer, FramebufferError};
pub use state::{Capability, CapabilitySet, ClearMask, Viewport};
pub use texture::{
    AttachmentConfig, Filter, TextureDesc, TextureHandle, TextureRegistry, DEPTH_FORMAT,
};

use crate::mesh::Mesh;
use crate::shader::ShaderProgram;

/// Handle to a [`Framebuffer`] owned by a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub(crate) u32);

/// Handle to a [`ShaderProgram`] owned by a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a [`Mesh`] owned by a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) u32);

/// Device limits the state model enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum color attachments per framebuffer.
    pub max_color_attachments: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_color_attachments: 8,
        }
    }
}

impl Limits {
    /// Limits reported by a wgpu device.
    #[must_use]
    pub fn from_wgpu(limits: &wgpu::Limits) -> Self {
        Self {
            max_color_attachments: limits.max_color_attachments,
        }
    }
}

/// A handle did not resolve, or a draw was issued without a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// Unregistered framebuffer.
    UnknownFramebuffer(FramebufferId),
    /// Unregistered program.
    UnknownProgram(ProgramId),
    /// Unregistered mesh.
    UnknownMesh(MeshId),
    /// `draw` with no current program.
    NoProgram,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFramebuffer(id) => write!(f, "unknown framebuffer {}", id.0),
            Self::UnknownProgram(id) => write!(f, "unknown shader program {}", id.0),
            Self::UnknownMesh(id) => write!(f, "unknown mesh {}", id.0),
            Self::NoProgram => write!(f, "draw issued without a current shader program"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Rendering state, resources, and the frame command stream.
#[derive(Debug)]
pub struct Context {
    limits: Limits,
    pub(crate) textures: TextureRegistry,
    framebuffers: Vec<Framebuffer>,
    programs: Vec<ShaderProgram>,
    meshes: Vec<Mesh>,
    capabilities: CapabilitySet,
    target: Option<FramebufferId>,
    program: Option<ProgramId>,
    viewport: Viewport,
    clear_color: Vec4,
    surface_size: (u32, u32),
    commands: Vec<Command>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl Context {
    /// Empty context with default capability state.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            textures: TextureRegistry::default(),
            framebuffers: Vec::new(),
            programs: Vec::new(),
            meshes: Vec::new(),
            capabilities: CapabilitySet::default(),
            target: None,
            program: None,
            viewport: Viewport::default(),
            clear_color: Vec4::ZERO,
            surface_size: (0, 0),
            commands: Vec::new(),
        }
    }

    /// Enforced limits.
    #[must_use]
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Size of the default surface.
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    /// Record a new default-surface size (window resize).
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }

    /// Registered textures.
    #[must_use]
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    // ── Capabilities ──

    /// Whether `cap` is currently enabled.
    #[must_use]
    pub fn is_enabled(&self, cap: Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Current capability set.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Enable `cap`.
    pub fn enable(&mut self, cap: Capability) {
        self.set_enabled(cap, true);
    }

    /// Disable `cap`.
    pub fn disable(&mut self, cap: Capability) {
        self.set_enabled(cap, false);
    }

    /// Set `cap` to `enabled`.
    pub fn set_enabled(&mut self, cap: Capability, enabled: bool) {
        self.capabilities.set(cap, enabled);
        self.commands.push(Command::SetCapability(cap, enabled));
    }

    // ── Target, program, viewport, clears ──

    pub(crate) fn bind_target(&mut self, id: Option<FramebufferId>) -> Result<(), ContextError> {
        if let Some(id) = id {
            if self.framebuffer(id).is_none() {
                return Err(ContextError::UnknownFramebuffer(id));
            }
        }
        self.target = id;
        self.commands.push(Command::BindTarget(id));
        Ok(())
    }

    /// Currently bound framebuffer (`None` = default surface).
    #[must_use]
    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.target
    }

    /// Size of the bound target.
    #[must_use]
    pub fn target_size(&self) -> (u32, u32) {
        self.target
            .and_then(|id| self.framebuffer(id))
            .map_or(self.surface_size, |fb| (fb.width(), fb.height()))
    }

    /// Make `id` the current program.
    ///
    /// # Errors
    ///
    /// [`ContextError::UnknownProgram`] for an unregistered id.
    pub fn use_program(&mut self, id: ProgramId) -> Result<(), ContextError> {
        if self.program(id).is_none() {
            return Err(ContextError::UnknownProgram(id));
        }
        self.program = Some(id);
        self.commands.push(Command::UseProgram(id));
        Ok(())
    }

    /// Current program.
    #[must_use]
    pub fn current_program(&self) -> Option<ProgramId> {
        self.program
    }

    /// Set the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(Command::Viewport(viewport));
    }

    /// Current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Set the color used by subsequent color clears.
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
        self.commands.push(Command::ClearColor(color));
    }

    /// Current clear color.
    #[must_use]
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Clear the buffers selected by `mask` on the bound target.
    pub fn clear(&mut self, mask: ClearMask) {
        if !mask.is_empty() {
            self.commands.push(Command::Clear(mask));
        }
    }

    // ── Programs and meshes ──

    /// Take ownership of a linked program.
    pub fn add_program(&mut self, program: ShaderProgram) -> ProgramId {
        self.programs.push(program);
        ProgramId(self.programs.len() as u32 - 1)
    }

    /// Program `id`, if registered.
    #[must_use]
    pub fn program(&self, id: ProgramId) -> Option<&ShaderProgram> {
        self.programs.get(id.0 as usize)
    }

    /// Mutable program `id`, for uniform updates between passes.
    pub fn program_mut(&mut self, id: ProgramId) -> Option<&mut ShaderProgram> {
        self.programs.get_mut(id.0 as usize)
    }

    /// Take ownership of a mesh.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    /// Mesh `id`, if registered.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0 as usize)
    }

    /// Mutable mesh `id` (draw mode changes).
    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0 as usize)
    }

    /// Draw `mesh` with the current program, capturing its uniform block
    /// and texture bindings.
    ///
    /// A draw whose program declares a texture that has not been bound is
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`ContextError::NoProgram`] without a current program,
    /// [`ContextError::UnknownMesh`] for an unregistered mesh.
    pub fn draw(&mut self, mesh: MeshId) -> Result<(), ContextError> {
        let program_id = self.program.ok_or(ContextError::NoProgram)?;
        if self.mesh(mesh).is_none() {
            return Err(ContextError::UnknownMesh(mesh));
        }
        let program = self
            .program(program_id)
            .ok_or(ContextError::UnknownProgram(program_id))?;
        let textures = match program.texture_bindings() {
            Ok(bindings) => bindings,
            Err(missing) => {
                log::warn!("draw skipped: texture {missing} is not bound");
                return Ok(());
            }
        };
        let call = DrawCall {
            program: program_id,
            mesh,
            uniforms: program.uniform_block().to_vec(),
            textures,
        };
        self.commands.push(Command::Draw(call));
        Ok(())
    }

    // ── Command stream ──

    /// Commands recorded since the last [`take_commands`](Self::take_commands).
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain the recorded commands, leaving the state untouched.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_changes_are_recorded() {
        let mut ctx = Context::default();
        ctx.enable(Capability::Blend);
        ctx.disable(Capability::DepthWrite);
        assert!(ctx.is_enabled(Capability::Blend));
        assert!(!ctx.is_enabled(Capability::DepthWrite));
        assert_eq!(
            ctx.commands(),
            &[
                Command::SetCapability(Capability::Blend, true),
                Command::SetCapability(Capability::DepthWrite, false),
            ]
        );
    }

    #[test]
    fn draw_requires_program() {
        let mut ctx = Context::default();
        let quad = ctx.add_mesh(Mesh::quad());
        assert_eq!(ctx.draw(quad), Err(ContextError::NoProgram));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut ctx = Context::default();
        assert_eq!(
            ctx.use_program(ProgramId(0)),
            Err(ContextError::UnknownProgram(ProgramId(0)))
        );
        assert_eq!(
            ctx.bind_target(Some(FramebufferId(2))),
            Err(ContextError::UnknownFramebuffer(FramebufferId(2)))
        );
    }

    #[test]
    fn empty_clear_is_not_recorded() {
        let mut ctx = Context::default();
        ctx.clear(ClearMask::NONE);
        ctx.clear(ClearMask::DEPTH);
        assert_eq!(ctx.take_commands(), vec![Command::Clear(ClearMask::DEPTH)]);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn target_size_follows_binding() {
        let mut ctx = Context::default();
        ctx.set_surface_size(800, 600);
        assert_eq!(ctx.target_size(), (800, 600));
        let fbo = ctx.create_framebuffer(128, 32);
        ctx.bind_framebuffer(Some(fbo)).unwrap();
        assert_eq!(ctx.target_size(), (128, 32));
    }
}
