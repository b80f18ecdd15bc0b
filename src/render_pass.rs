//! Declarative render passes.
//!
//! A [`RenderPass`] names a program, an optional target framebuffer, an
//! ordered list of meshes, clear masks, and capabilities to force on or off
//! while it draws. [`RenderPass::render`] issues all of it against a
//! [`Context`] and restores every forced capability afterwards, so passes
//! never leak state into each other.

use glam::Vec4;

use crate::context::{
    Capability, ClearMask, Context, ContextError, FramebufferId, MeshId, ProgramId, Viewport,
};
use crate::shader::Parameters;

/// One step of a rendering pipeline.
///
/// The pass only refers to resources by id; programs, meshes and
/// framebuffers live in the [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    program: ProgramId,
    framebuffer: Option<FramebufferId>,
    renderables: Vec<MeshId>,
    clear_bits: Vec<ClearMask>,
    enable: Vec<Capability>,
    disable: Vec<Capability>,
    viewport: Option<Viewport>,
    clear_color: Vec4,
}

fn remove_first<T: PartialEq>(list: &mut Vec<T>, item: &T) {
    if let Some(pos) = list.iter().position(|x| x == item) {
        let _ = list.remove(pos);
    }
}

impl RenderPass {
    /// Pass drawing with `program` into `framebuffer` (`None` = default
    /// surface).
    #[must_use]
    pub fn new(program: ProgramId, framebuffer: Option<FramebufferId>) -> Self {
        Self {
            program,
            framebuffer,
            renderables: Vec::new(),
            clear_bits: Vec::new(),
            enable: Vec::new(),
            disable: Vec::new(),
            viewport: None,
            clear_color: Vec4::ZERO,
        }
    }

    // ── Configuration ──

    /// Program used by the pass.
    #[must_use]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Replace the program.
    pub fn set_program(&mut self, program: ProgramId) {
        self.program = program;
    }

    /// Target framebuffer.
    #[must_use]
    pub fn framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    /// Replace the target framebuffer.
    pub fn set_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.framebuffer = framebuffer;
    }

    /// Explicit viewport, if one was set.
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Use `viewport` instead of the target's full size.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Color used by clear masks containing [`ClearMask::COLOR`].
    #[must_use]
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Set the clear color.
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// Meshes drawn, in order.
    #[must_use]
    pub fn renderables(&self) -> &[MeshId] {
        &self.renderables
    }

    /// Append a mesh.
    pub fn add_renderable(&mut self, mesh: MeshId) {
        self.renderables.push(mesh);
    }

    /// Remove the first occurrence of `mesh`.
    pub fn remove_renderable(&mut self, mesh: MeshId) {
        remove_first(&mut self.renderables, &mesh);
    }

    /// Remove every mesh.
    pub fn clear_renderables(&mut self) {
        self.renderables.clear();
    }

    /// Clear masks, issued in order.
    #[must_use]
    pub fn clear_bits(&self) -> &[ClearMask] {
        &self.clear_bits
    }

    /// Append a clear mask.
    pub fn add_clear_bits(&mut self, mask: ClearMask) {
        self.clear_bits.push(mask);
    }

    /// Remove the first occurrence of `mask`.
    pub fn remove_clear_bits(&mut self, mask: ClearMask) {
        remove_first(&mut self.clear_bits, &mask);
    }

    /// Capabilities forced on while rendering.
    #[must_use]
    pub fn enables(&self) -> &[Capability] {
        &self.enable
    }

    /// Force `cap` on while rendering.
    pub fn add_enable(&mut self, cap: Capability) {
        self.enable.push(cap);
    }

    /// Remove the first occurrence of `cap` from the enable list.
    pub fn remove_enable(&mut self, cap: Capability) {
        remove_first(&mut self.enable, &cap);
    }

    /// Capabilities forced off while rendering.
    #[must_use]
    pub fn disables(&self) -> &[Capability] {
        &self.disable
    }

    /// Force `cap` off while rendering.
    pub fn add_disable(&mut self, cap: Capability) {
        self.disable.push(cap);
    }

    /// Remove the first occurrence of `cap` from the disable list.
    pub fn remove_disable(&mut self, cap: Capability) {
        remove_first(&mut self.disable, &cap);
    }

    // ── Rendering ──

    /// Render every mesh with `frame` applied to the program.
    ///
    /// # Errors
    ///
    /// [`ContextError`] if the program, framebuffer or a mesh is not
    /// registered. Forced capabilities are restored either way.
    pub fn render(&self, ctx: &mut Context, frame: &Parameters) -> Result<(), ContextError> {
        self.render_each(ctx, frame, |_, _| Parameters::new())
    }

    /// Like [`render`](Self::render), applying `per_renderable(index, mesh)`
    /// to the program before each draw.
    ///
    /// # Errors
    ///
    /// As [`render`](Self::render).
    pub fn render_each<F>(
        &self,
        ctx: &mut Context,
        frame: &Parameters,
        mut per_renderable: F,
    ) -> Result<(), ContextError>
    where
        F: FnMut(usize, MeshId) -> Parameters,
    {
        ctx.bind_target(self.framebuffer)?;
        ctx.use_program(self.program)?;

        let viewport = self.viewport.unwrap_or_else(|| {
            self.framebuffer
                .and_then(|id| ctx.framebuffer(id))
                .map_or_else(Viewport::default, |fb| Viewport::full(fb.width(), fb.height()))
        });
        ctx.set_viewport(viewport);

        for &mask in &self.clear_bits {
            if mask.contains(ClearMask::COLOR) {
                ctx.set_clear_color(self.clear_color);
            }
            ctx.clear(mask);
        }

        let saved_enable: Vec<bool> = self.enable.iter().map(|&c| ctx.is_enabled(c)).collect();
        let saved_disable: Vec<bool> = self.disable.iter().map(|&c| ctx.is_enabled(c)).collect();
        for &cap in &self.enable {
            if !ctx.is_enabled(cap) {
                ctx.enable(cap);
            }
        }
        for &cap in &self.disable {
            if ctx.is_enabled(cap) {
                ctx.disable(cap);
            }
        }

        let result = if viewport.is_empty() {
            log::warn!(
                "render pass with program {:?} has an empty viewport; nothing drawn",
                self.program
            );
            Ok(())
        } else {
            self.draw_all(ctx, frame, &mut per_renderable)
        };

        let saved = self.enable.iter().zip(saved_enable).chain(self.disable.iter().zip(saved_disable));
        let saved: Vec<(Capability, bool)> = saved.map(|(&cap, was)| (cap, was)).collect();
        for &(cap, was) in saved.iter().rev() {
            if ctx.is_enabled(cap) != was {
                ctx.set_enabled(cap, was);
            }
        }
        result
    }

    fn draw_all<F>(
        &self,
        ctx: &mut Context,
        frame: &Parameters,
        per_renderable: &mut F,
    ) -> Result<(), ContextError>
    where
        F: FnMut(usize, MeshId) -> Parameters,
    {
        ctx.program_mut(self.program)
            .ok_or(ContextError::UnknownProgram(self.program))?
            .apply(frame);
        for (index, &mesh) in self.renderables.iter().enumerate() {
            let params = per_renderable(index, mesh);
            if !params.is_empty() {
                ctx.program_mut(self.program)
                    .ok_or(ContextError::UnknownProgram(self.program))?
                    .apply(&params);
            }
            ctx.draw(mesh)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::context::{AttachmentConfig, Command};
    use crate::mesh::Mesh;
    use crate::shader::ShaderProgram;

    const VERTEX: &str = "
struct Uniforms {
    model: mat4x4<f32>,
    mixTexture: f32,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.model * vec4<f32>(position * u.mixTexture, 1.0);
}
";

    const FRAGMENT: &str = "
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
";

    fn setup() -> (Context, ProgramId, MeshId, MeshId) {
        let mut ctx = Context::default();
        let program = ctx.add_program(ShaderProgram::new(VERTEX, FRAGMENT).unwrap());
        let a = ctx.add_mesh(Mesh::volume_cube(1.0));
        let b = ctx.add_mesh(Mesh::sphere(4, 8, 0.5));
        (ctx, program, a, b)
    }

    fn draws(ctx: &Context) -> Vec<&crate::context::DrawCall> {
        ctx.commands()
            .iter()
            .filter_map(|c| match c {
                Command::Draw(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn overlapping_state_lists_restore_prior_values() {
        let (mut ctx, program, mesh, _) = setup();
        let fbo = ctx.create_framebuffer(64, 64);
        let _ = ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8);
        ctx.enable(Capability::CullFace);

        let mut pass = RenderPass::new(program, Some(fbo));
        pass.add_enable(Capability::Blend);
        pass.add_enable(Capability::DepthTest);
        pass.add_disable(Capability::Blend);
        pass.add_disable(Capability::CullFace);
        pass.add_disable(Capability::DepthWrite);
        pass.add_renderable(mesh);

        let before: Vec<bool> = Capability::ALL.iter().map(|&c| ctx.is_enabled(c)).collect();
        pass.render(&mut ctx, &Parameters::new()).unwrap();
        let after: Vec<bool> = Capability::ALL.iter().map(|&c| ctx.is_enabled(c)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn framebuffer_pass_sets_viewport_once() {
        let (mut ctx, program, mesh, _) = setup();
        let fbo = ctx.create_framebuffer(64, 32);
        let _ = ctx.add_color_attachments(fbo, 1, AttachmentConfig::RGBA8);
        let mut pass = RenderPass::new(program, Some(fbo));
        pass.set_viewport(Viewport::full(16, 16));
        pass.add_renderable(mesh);
        pass.render(&mut ctx, &Parameters::new()).unwrap();

        let viewports: Vec<Viewport> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Viewport(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, vec![Viewport::full(16, 16)]);
        assert_eq!(ctx.viewport(), Viewport::full(16, 16));
    }

    #[test]
    fn capabilities_are_forced_during_draws() {
        let (mut ctx, program, mesh, _) = setup();
        let mut pass = RenderPass::new(program, None);
        pass.set_viewport(Viewport::full(32, 32));
        pass.add_enable(Capability::Blend);
        pass.add_disable(Capability::DepthWrite);
        pass.add_renderable(mesh);
        pass.render(&mut ctx, &Parameters::new()).unwrap();

        let commands = ctx.take_commands();
        let draw_at = commands.iter().position(Command::is_draw).unwrap();
        let before_draw = &commands[..draw_at];
        let after_draw = &commands[draw_at..];
        assert!(before_draw.contains(&Command::SetCapability(Capability::Blend, true)));
        assert!(before_draw.contains(&Command::SetCapability(Capability::DepthWrite, false)));
        assert!(after_draw.contains(&Command::SetCapability(Capability::Blend, false)));
        assert!(after_draw.contains(&Command::SetCapability(Capability::DepthWrite, true)));
    }

    #[test]
    fn clear_color_precedes_any_color_clear() {
        let (mut ctx, program, _, _) = setup();
        let fbo = ctx.create_framebuffer(16, 16);
        let mut pass = RenderPass::new(program, Some(fbo));
        let color = Vec4::new(0.25, 0.25, 0.35, 0.0);
        pass.set_clear_color(color);
        pass.add_clear_bits(ClearMask::DEPTH);
        pass.add_clear_bits(ClearMask::DEPTH | ClearMask::COLOR);
        pass.render(&mut ctx, &Parameters::new()).unwrap();

        let clears: Vec<&Command> = ctx
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Clear(_) | Command::ClearColor(_)))
            .collect();
        assert_eq!(
            clears,
            [
                &Command::Clear(ClearMask::DEPTH),
                &Command::ClearColor(color),
                &Command::Clear(ClearMask::DEPTH | ClearMask::COLOR),
            ]
        );
    }

    #[test]
    fn per_renderable_parameters_reach_each_draw() {
        let (mut ctx, program, a, b) = setup();
        let fbo = ctx.create_framebuffer(16, 16);
        let mut pass = RenderPass::new(program, Some(fbo));
        pass.add_renderable(a);
        pass.add_renderable(b);

        let frame = Parameters::new().with("model", Mat4::IDENTITY);
        pass.render_each(&mut ctx, &frame, |index, _| {
            Parameters::new().with("mixTexture", if index == 1 { 1.0_f32 } else { 0.0 })
        })
        .unwrap();

        let calls = draws(&ctx);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].mesh, a);
        assert_eq!(calls[1].mesh, b);
        assert_ne!(calls[0].uniforms, calls[1].uniforms);
        let program = ctx.program(program).unwrap();
        assert_eq!(program.read_uniform::<f32>("mixTexture"), Some(1.0));
    }

    #[test]
    fn empty_viewport_draws_nothing() {
        let (mut ctx, program, mesh, _) = setup();
        let mut pass = RenderPass::new(program, None);
        pass.add_renderable(mesh);
        pass.render(&mut ctx, &Parameters::new()).unwrap();
        assert!(draws(&ctx).is_empty());
        assert!(ctx.commands().contains(&Command::Viewport(Viewport::default())));
    }

    #[test]
    fn dangling_mesh_errors_after_restoring_state() {
        let (mut ctx, program, _, _) = setup();
        let fbo = ctx.create_framebuffer(16, 16);
        let mut pass = RenderPass::new(program, Some(fbo));
        pass.add_enable(Capability::Blend);
        pass.add_renderable(MeshId(42));
        assert_eq!(
            pass.render(&mut ctx, &Parameters::new()),
            Err(ContextError::UnknownMesh(MeshId(42)))
        );
        assert!(!ctx.is_enabled(Capability::Blend));
    }

    #[test]
    fn list_edits_remove_first_match() {
        let mut pass = RenderPass::new(ProgramId(0), None);
        pass.add_renderable(MeshId(1));
        pass.add_renderable(MeshId(2));
        pass.add_renderable(MeshId(1));
        pass.remove_renderable(MeshId(1));
        assert_eq!(pass.renderables(), &[MeshId(2), MeshId(1)]);

        pass.add_clear_bits(ClearMask::COLOR);
        pass.add_clear_bits(ClearMask::DEPTH);
        pass.remove_clear_bits(ClearMask::COLOR);
        assert_eq!(pass.clear_bits(), &[ClearMask::DEPTH]);

        pass.add_enable(Capability::Blend);
        pass.remove_enable(Capability::Blend);
        pass.add_disable(Capability::DepthTest);
        pass.remove_disable(Capability::CullFace);
        assert!(pass.enables().is_empty());
        assert_eq!(pass.disables(), &[Capability::DepthTest]);

        pass.clear_renderables();
        assert!(pass.renderables().is_empty());
    }
}
