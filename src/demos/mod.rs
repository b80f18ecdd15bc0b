//! The demo pipelines hosted by the viewer.
//!
//! Each demo owns a fixed chain of [`RenderPass`](crate::render_pass::RenderPass)es
//! and the framebuffers between them. Once per frame it derives its
//! matrices from a [`SceneControls`] and records every pass into the
//! [`Context`]; nothing here touches the GPU, so each pipeline's command
//! stream can be checked headless.

/// Depth-peeling order-independent transparency.
pub mod depth_peel;
/// Interactive maximum intensity projection.
pub mod mip;
/// Screen-space reflection of a billboard.
pub mod ssr;

use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};

use crate::camera::{Camera, Turntable};
use crate::context::{Context, ContextError, FramebufferId, TextureHandle};
use crate::error::VolrenError;
use crate::input::{InputCommand, KeyAction};
use crate::options::{CameraOptions, Options};
use crate::util::{Timer, Updatable};

pub use depth_peel::DepthPeelDemo;
pub use mip::MipDemo;
pub use ssr::SsrDemo;

/// Radians per second while auto-rotation is on.
pub const AUTO_ROTATE_SPEED: f32 = 0.5;

/// A render pipeline driven once per frame.
pub trait Demo {
    /// Window title.
    fn title(&self) -> &str;

    /// Record one frame into `ctx`, `dt` seconds after the previous one.
    ///
    /// # Errors
    ///
    /// [`ContextError`] if a pass refers to a resource that is gone.
    fn frame(&mut self, ctx: &mut Context, dt: f32) -> Result<(), ContextError>;

    /// Adapt to a new surface size.
    fn resize(&mut self, width: u32, height: u32);

    /// Apply one input command.
    fn handle(&mut self, command: InputCommand);
}

/// The demos selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemoKind {
    /// Maximum intensity projection of a CT or MRT volume.
    Mip,
    /// Depth peeling of nested boxes.
    Peel,
    /// Billboard reflections on a G-Buffer scene.
    Ssr,
}

impl DemoKind {
    /// Window size used when the options leave it unset.
    #[must_use]
    pub fn default_size(self) -> (u32, u32) {
        match self {
            Self::Mip => (800, 800),
            Self::Peel | Self::Ssr => (800, 600),
        }
    }

    /// Set up the demo on `ctx`, loading its data from the configured
    /// resource root.
    ///
    /// # Errors
    ///
    /// Shader, image or framebuffer errors from the demo's setup.
    pub fn build(
        self,
        ctx: &mut Context,
        options: &Options,
        size: (u32, u32),
    ) -> Result<Box<dyn Demo>, VolrenError> {
        Ok(match self {
            Self::Mip => Box::new(MipDemo::load(ctx, options, size)?),
            Self::Peel => Box::new(DepthPeelDemo::new(ctx, options, size)?),
            Self::Ssr => Box::new(SsrDemo::load(ctx, options, size)?),
        })
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mip => "mip",
            Self::Peel => "peel",
            Self::Ssr => "ssr",
        })
    }
}

impl FromStr for DemoKind {
    type Err = VolrenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mip" => Ok(Self::Mip),
            "peel" => Ok(Self::Peel),
            "ssr" => Ok(Self::Ssr),
            other => Err(VolrenError::Viewer(format!(
                "unknown demo '{other}', expected mip, peel or ssr"
            ))),
        }
    }
}

/// Camera, turntable and auto-rotation shared by every demo.
#[derive(Debug, Clone)]
pub struct SceneControls {
    /// The viewing camera.
    pub camera: Camera,
    /// Accumulated model rotation.
    pub turntable: Turntable,
    auto_rotate: Timer,
    move_step: f32,
}

impl SceneControls {
    /// Controls around `camera`, configured from `options`.
    #[must_use]
    pub fn new(camera: Camera, options: &CameraOptions) -> Self {
        Self {
            camera,
            turntable: Turntable::new(options.sensitivity),
            auto_rotate: Timer::new(options.auto_rotate),
            move_step: options.move_step,
        }
    }

    /// Whether the model spins on its own.
    #[must_use]
    pub fn auto_rotating(&self) -> bool {
        self.auto_rotate.is_running()
    }

    /// Seconds spent auto-rotating.
    #[must_use]
    pub fn auto_rotate_time(&self) -> f64 {
        self.auto_rotate.elapsed()
    }

    /// Model rotation from the turntable.
    #[must_use]
    pub fn rotation(&self) -> Mat4 {
        self.turntable.rotation_matrix()
    }

    /// Apply one input command.
    pub fn apply(&mut self, command: InputCommand) {
        match command {
            InputCommand::SetDragActive(active) => self.turntable.set_drag_active(active),
            InputCommand::Drag { delta } => {
                if self.turntable.drag_active() {
                    let view = self.camera.view();
                    self.turntable.drag_by(delta.x, delta.y, &view);
                }
            }
            InputCommand::Action(action) => self.apply_action(action),
        }
    }

    fn apply_action(&mut self, action: KeyAction) {
        let step = self.move_step;
        match action {
            KeyAction::MoveForward => self.camera.move_local(Vec3::new(0.0, 0.0, -step)),
            KeyAction::MoveBack => self.camera.move_local(Vec3::new(0.0, 0.0, step)),
            KeyAction::MoveLeft => self.camera.move_local(Vec3::new(-step, 0.0, 0.0)),
            KeyAction::MoveRight => self.camera.move_local(Vec3::new(step, 0.0, 0.0)),
            KeyAction::ToggleAutoRotate => {
                self.auto_rotate.toggle_running();
                log::info!("auto-rotate: {}", self.auto_rotate.is_running());
            }
            KeyAction::ResetRotation => self.turntable.set_rotation_matrix(Mat4::IDENTITY),
        }
    }
}

/// Texture behind output `name` of framebuffer `fb`.
pub(crate) fn output_texture(
    ctx: &Context,
    fb: FramebufferId,
    name: &str,
) -> Result<TextureHandle, VolrenError> {
    ctx.framebuffer(fb)
        .and_then(|f| f.buffer(name))
        .ok_or_else(|| VolrenError::Viewer(format!("framebuffer {fb:?} has no output {name}")))
}

impl Updatable for SceneControls {
    fn update(&mut self, dt: f32) {
        self.auto_rotate.update(dt);
        if self.auto_rotate.is_running() {
            let sensitivity = self.turntable.sensitivity();
            if sensitivity > 0.0 {
                let view = self.camera.view();
                self.turntable
                    .drag_by(dt * AUTO_ROTATE_SPEED / sensitivity, 0.0, &view);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::{Command, Context, DrawCall, FramebufferId};

    /// Draw calls grouped by the target they were recorded against.
    pub fn draws_by_target(ctx: &Context) -> Vec<(Option<FramebufferId>, Vec<DrawCall>)> {
        let mut groups: Vec<(Option<FramebufferId>, Vec<DrawCall>)> = Vec::new();
        let mut target = None;
        for command in ctx.commands() {
            match command {
                Command::BindTarget(t) => target = *t,
                Command::Draw(call) => match groups.last_mut() {
                    Some((t, calls)) if *t == target => calls.push(call.clone()),
                    _ => groups.push((target, vec![call.clone()])),
                },
                _ => {}
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::camera::Projection;

    fn controls() -> SceneControls {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            Projection::Perspective {
                fovy: 65.0,
                znear: 0.1,
                zfar: 10.0,
            },
        );
        SceneControls::new(camera, &CameraOptions::default())
    }

    #[test]
    fn drags_rotate_only_while_active() {
        let mut c = controls();
        c.apply(InputCommand::Drag {
            delta: Vec2::new(10.0, 0.0),
        });
        assert_eq!(c.rotation(), Mat4::IDENTITY);

        c.apply(InputCommand::SetDragActive(true));
        c.apply(InputCommand::Drag {
            delta: Vec2::new(10.0, 0.0),
        });
        assert_ne!(c.rotation(), Mat4::IDENTITY);

        c.apply(InputCommand::Action(KeyAction::ResetRotation));
        assert_eq!(c.rotation(), Mat4::IDENTITY);
    }

    #[test]
    fn movement_keys_translate_the_camera() {
        let mut c = controls();
        c.apply(InputCommand::Action(KeyAction::MoveForward));
        assert!((c.camera.eye.z - 2.9).abs() < 1e-5);
        assert!((c.camera.center.z + 0.1).abs() < 1e-5);
        c.apply(InputCommand::Action(KeyAction::MoveRight));
        assert!((c.camera.eye.x - 0.1).abs() < 1e-5);
    }

    #[test]
    fn auto_rotation_follows_the_toggle() {
        let mut c = controls();
        c.update(1.0);
        assert_eq!(c.rotation(), Mat4::IDENTITY);

        c.apply(InputCommand::Action(KeyAction::ToggleAutoRotate));
        c.update(1.0);
        assert!(c.auto_rotating());
        assert_eq!(c.auto_rotate_time(), 1.0);
        let spun = c.rotation().transform_vector3(Vec3::X);
        assert!((spun.x - AUTO_ROTATE_SPEED.cos()).abs() < 1e-4);
    }

    #[test]
    fn demo_kinds_parse() {
        assert_eq!("peel".parse::<DemoKind>().unwrap(), DemoKind::Peel);
        assert_eq!(DemoKind::Ssr.to_string(), "ssr");
        assert!("ray".parse::<DemoKind>().is_err());
        assert_eq!(DemoKind::Mip.default_size(), (800, 800));
    }
}
