//! Splits a recorded command stream into render passes.
//!
//! A wgpu render pass has one fixed set of attachments and can only clear
//! them when it begins, so the stream is cut wherever the target changes
//! or a clear follows a draw. Each draw carries the viewport and
//! capability state that were current when it was recorded.

use glam::Vec4;

use crate::context::{
    CapabilitySet, ClearMask, Command, DrawCall, FramebufferId, Viewport,
};

/// State a draw is rasterized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawState {
    /// Viewport at record time.
    pub viewport: Viewport,
    /// Enabled capabilities at record time.
    pub capabilities: CapabilitySet,
}

/// One draw of a planned pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDraw {
    /// The recorded call.
    pub call: DrawCall,
    /// Raster state for the call.
    pub state: DrawState,
}

/// A contiguous run of work against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPass {
    /// Target framebuffer, `None` for the surface.
    pub target: Option<FramebufferId>,
    /// Clear color for the color attachments, if they are cleared.
    pub clear_color: Option<Vec4>,
    /// Whether the depth attachment is cleared.
    pub clear_depth: bool,
    /// Draws in record order.
    pub draws: Vec<PlannedDraw>,
}

impl PlannedPass {
    fn new(target: Option<FramebufferId>) -> Self {
        Self {
            target,
            clear_color: None,
            clear_depth: false,
            draws: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.clear_color.is_none() && !self.clear_depth && self.draws.is_empty()
    }
}

/// Replay-side state tracker.
struct Planner {
    passes: Vec<PlannedPass>,
    current: PlannedPass,
    clear_color: Vec4,
    state: DrawState,
}

impl Planner {
    fn flush(&mut self, target: Option<FramebufferId>) {
        let done = std::mem::replace(&mut self.current, PlannedPass::new(target));
        if !done.is_empty() {
            self.passes.push(done);
        }
    }

    fn apply(&mut self, command: &Command) {
        match command {
            Command::BindTarget(target) => {
                if *target != self.current.target {
                    self.flush(*target);
                }
            }
            Command::UseProgram(_) => {}
            Command::Viewport(viewport) => self.state.viewport = *viewport,
            Command::ClearColor(color) => self.clear_color = *color,
            Command::Clear(mask) => self.clear(*mask),
            Command::SetCapability(cap, enabled) => self.state.capabilities.set(*cap, *enabled),
            Command::Draw(call) => self.current.draws.push(PlannedDraw {
                call: call.clone(),
                state: self.state,
            }),
        }
    }

    fn clear(&mut self, mask: ClearMask) {
        if !self.current.draws.is_empty() {
            let target = self.current.target;
            self.flush(target);
        }
        if mask.contains(ClearMask::COLOR) {
            self.current.clear_color = Some(self.clear_color);
        }
        if mask.contains(ClearMask::DEPTH) {
            self.current.clear_depth = true;
        }
    }
}

/// Cut `commands` into passes.
///
/// Replay starts on the surface with default capabilities, a zero
/// viewport and a transparent black clear color, matching a fresh
/// [`Context`](crate::context::Context). Passes that neither clear nor
/// draw are dropped.
#[must_use]
pub fn plan(commands: &[Command]) -> Vec<PlannedPass> {
    plan_from(commands, CapabilitySet::default())
}

/// [`plan`] starting from a given capability state, for streams recorded
/// after earlier frames changed it.
#[must_use]
pub fn plan_from(commands: &[Command], capabilities: CapabilitySet) -> Vec<PlannedPass> {
    let mut planner = Planner {
        passes: Vec::new(),
        current: PlannedPass::new(None),
        clear_color: Vec4::ZERO,
        state: DrawState {
            viewport: Viewport::default(),
            capabilities,
        },
    };
    for command in commands {
        planner.apply(command);
    }
    planner.flush(None);
    planner.passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Capability, MeshId, ProgramId};

    fn draw(mesh: u32) -> Command {
        Command::Draw(DrawCall {
            program: ProgramId(0),
            mesh: MeshId(mesh),
            uniforms: Vec::new(),
            textures: Vec::new(),
        })
    }

    #[test]
    fn target_changes_split_passes() {
        let fb = Some(FramebufferId(0));
        let passes = plan(&[
            Command::BindTarget(fb),
            Command::Clear(ClearMask::COLOR | ClearMask::DEPTH),
            draw(0),
            draw(1),
            Command::BindTarget(None),
            draw(2),
        ]);
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].target, fb);
        assert_eq!(passes[0].draws.len(), 2);
        assert!(passes[0].clear_depth);
        assert_eq!(passes[1].target, None);
        assert_eq!(passes[1].clear_color, None);
    }

    #[test]
    fn rebinding_the_same_target_keeps_the_pass() {
        let fb = Some(FramebufferId(3));
        let passes = plan(&[
            Command::BindTarget(fb),
            draw(0),
            Command::BindTarget(fb),
            draw(1),
        ]);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].draws.len(), 2);
    }

    #[test]
    fn clear_after_draw_starts_new_pass() {
        let passes = plan(&[
            Command::ClearColor(Vec4::new(0.25, 0.25, 0.35, 0.0)),
            Command::Clear(ClearMask::COLOR),
            draw(0),
            Command::ClearColor(Vec4::ONE),
            Command::Clear(ClearMask::DEPTH),
            draw(1),
        ]);
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].clear_color, Some(Vec4::new(0.25, 0.25, 0.35, 0.0)));
        assert!(!passes[0].clear_depth);
        assert_eq!(passes[1].clear_color, None);
        assert!(passes[1].clear_depth);
    }

    #[test]
    fn clear_color_is_taken_at_clear_time() {
        let passes = plan(&[
            Command::ClearColor(Vec4::X),
            Command::Clear(ClearMask::COLOR),
            Command::ClearColor(Vec4::Y),
        ]);
        assert_eq!(passes[0].clear_color, Some(Vec4::X));
    }

    #[test]
    fn draws_capture_state() {
        let vp = Viewport::full(800, 600);
        let passes = plan(&[
            Command::Viewport(vp),
            Command::SetCapability(Capability::Blend, true),
            draw(0),
            Command::SetCapability(Capability::Blend, false),
            draw(1),
        ]);
        let draws = &passes[0].draws;
        assert_eq!(draws[0].state.viewport, vp);
        assert!(draws[0].state.capabilities.contains(Capability::Blend));
        assert!(!draws[1].state.capabilities.contains(Capability::Blend));
    }

    #[test]
    fn state_only_streams_plan_nothing() {
        let passes = plan(&[
            Command::BindTarget(Some(FramebufferId(0))),
            Command::Viewport(Viewport::full(4, 4)),
            Command::BindTarget(None),
            Command::SetCapability(Capability::DepthTest, true),
        ]);
        assert!(passes.is_empty());
    }
}
