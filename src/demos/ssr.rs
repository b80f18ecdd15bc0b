//! Screen-space reflections of a textured billboard.
//!
//! A G-Buffer pass stores color, view-space normal and position of a small
//! scene. The composite pass lights it onto the surface; a reflection pass
//! intersects every reflected view ray with the billboard's plane into a
//! separate buffer, which is then blended over the composite.

use glam::{Mat4, Vec3, Vec4};

use super::{output_texture, Demo, SceneControls};
use crate::camera::{Camera, Projection};
use crate::context::{
    AttachmentConfig, Capability, ClearMask, Context, ContextError, TextureHandle, Viewport,
};
use crate::error::VolrenError;
use crate::input::InputCommand;
use crate::mesh::Mesh;
use crate::options::{Options, SsrOptions};
use crate::render_pass::RenderPass;
use crate::shader::{builtin, Parameters};
use crate::util::{DebugLog, Updatable};

const BACKGROUND: Vec4 = Vec4::new(0.25, 0.25, 0.35, 0.0);

/// Index of the billboard in the scene list.
const BILLBOARD: usize = 2;

/// Billboard size in model units.
const BILLBOARD_SIZE: f32 = 1.0;

/// Scene meshes and their placement, billboard at [`BILLBOARD`].
fn scene() -> Vec<(Mesh, Mat4)> {
    vec![
        (
            Mesh::sphere(20, 40, 0.25),
            Mat4::from_translation(Vec3::new(0.0, -0.25, 0.0)),
        ),
        (
            Mesh::grid(1, 1, 3.0, 3.0, true),
            Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0))
                * Mat4::from_rotation_x(-90.0_f32.to_radians()),
        ),
        (
            Mesh::grid(1, 1, BILLBOARD_SIZE, BILLBOARD_SIZE, false),
            Mat4::from_translation(Vec3::new(-0.5, 0.0, 0.0)),
        ),
        (
            Mesh::sphere(20, 40, 0.375),
            Mat4::from_translation(Vec3::new(0.5, 0.4, 1.1)),
        ),
        (
            Mesh::volume(1.0, 0.75, 0.25),
            Mat4::from_translation(Vec3::new(-1.0, 0.5, -0.5))
                * Mat4::from_rotation_y(45.0_f32.to_radians()),
        ),
    ]
}

/// Billboard reflections over a lit G-Buffer scene.
#[derive(Debug)]
pub struct SsrDemo {
    controls: SceneControls,
    options: SsrOptions,
    placements: Vec<Mat4>,
    gbuffer_pass: RenderPass,
    composite_pass: RenderPass,
    reflection_pass: RenderPass,
    overlay_pass: RenderPass,
}

impl SsrDemo {
    /// Load the billboard image and set the demo up.
    ///
    /// # Errors
    ///
    /// [`VolrenError::Image`] if the billboard cannot be decoded, otherwise
    /// as [`new`](Self::new).
    pub fn load(ctx: &mut Context, options: &Options, size: (u32, u32)) -> Result<Self, VolrenError> {
        let path = options.paths.resources.join(&options.ssr.billboard_texture);
        let billboard = ctx.load_texture(&path)?;
        Self::new(ctx, options, size, billboard)
    }

    /// Set the demo up with `billboard` as the billboard's texture.
    ///
    /// # Errors
    ///
    /// [`VolrenError::Shader`] if a program fails to link.
    pub fn new(
        ctx: &mut Context,
        options: &Options,
        size: (u32, u32),
        billboard: TextureHandle,
    ) -> Result<Self, VolrenError> {
        let mut debug = DebugLog::new(false);
        debug.log("Setting up screen-space reflections");
        debug.indent();

        let shaders = &options.paths.shaders;
        let gbuffer_program = ctx.add_program(builtin::load_program(
            shaders,
            "gbuffer.vert.wgsl",
            "gbuffer.frag.wgsl",
        )?);
        let composite_program = ctx.add_program(builtin::load_program(
            shaders,
            "fullscreen.vert.wgsl",
            "composite.frag.wgsl",
        )?);
        let reflection_program = ctx.add_program(builtin::load_program(
            shaders,
            "fullscreen.vert.wgsl",
            "ssr.frag.wgsl",
        )?);
        let overlay_program = ctx.add_program(builtin::load_program(
            shaders,
            "fullscreen.vert.wgsl",
            "show_texture.frag.wgsl",
        )?);

        let mut gbuffer_pass = RenderPass::new(gbuffer_program, None);
        let mut placements = Vec::new();
        for (mesh, placement) in scene() {
            gbuffer_pass.add_renderable(ctx.add_mesh(mesh));
            placements.push(placement);
        }
        debug.log_value("objects", placements.len());
        let quad = ctx.add_mesh(Mesh::quad());

        let outputs = ctx
            .program(gbuffer_program)
            .ok_or(ContextError::UnknownProgram(gbuffer_program))?
            .outputs()
            .clone();
        let gbuffer = ctx.create_framebuffer_with_outputs(&outputs, size.0, size.1, AttachmentConfig::RGBA32F);
        gbuffer_pass.set_framebuffer(Some(gbuffer));
        gbuffer_pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
        gbuffer_pass.add_enable(Capability::DepthTest);
        gbuffer_pass.add_disable(Capability::Blend);
        ctx.program_mut(gbuffer_program)
            .ok_or(ContextError::UnknownProgram(gbuffer_program))?
            .add_texture("tex", billboard);

        let color = output_texture(ctx, gbuffer, "fragColor")?;
        let normal = output_texture(ctx, gbuffer, "fragNormal")?;
        let position = output_texture(ctx, gbuffer, "fragPosition")?;

        let maps = Parameters::new()
            .with_texture("colorMap", color)
            .with_texture("normalMap", normal)
            .with_texture("positionMap", position);
        ctx.program_mut(composite_program)
            .ok_or(ContextError::UnknownProgram(composite_program))?
            .apply(&maps);
        let mut composite_pass = RenderPass::new(composite_program, None);
        composite_pass.add_renderable(quad);
        composite_pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
        composite_pass.add_disable(Capability::DepthTest);
        composite_pass.set_clear_color(BACKGROUND);
        composite_pass.set_viewport(Viewport::full(size.0, size.1));

        let reflection_outputs = ctx
            .program(reflection_program)
            .ok_or(ContextError::UnknownProgram(reflection_program))?
            .outputs()
            .clone();
        let reflections = ctx.create_framebuffer_with_outputs(
            &reflection_outputs,
            size.0,
            size.1,
            AttachmentConfig::RGBA8,
        );
        let reflected = ctx
            .framebuffer(reflections)
            .and_then(|fb| fb.targets().first().copied())
            .ok_or_else(|| VolrenError::Viewer("reflection buffer has no color target".to_owned()))?;
        let sources = Parameters::new()
            .with("bbWidth", BILLBOARD_SIZE)
            .with("bbHeight", BILLBOARD_SIZE)
            .with("strength", options.ssr.strength)
            .with_texture("positionMap", position)
            .with_texture("normalMap", normal)
            .with_texture("bbTex", billboard);
        ctx.program_mut(reflection_program)
            .ok_or(ContextError::UnknownProgram(reflection_program))?
            .apply(&sources);
        let mut reflection_pass = RenderPass::new(reflection_program, Some(reflections));
        reflection_pass.add_renderable(quad);
        reflection_pass.add_clear_bits(ClearMask::COLOR);
        reflection_pass.add_disable(Capability::DepthTest);

        ctx.program_mut(overlay_program)
            .ok_or(ContextError::UnknownProgram(overlay_program))?
            .add_texture("tex", reflected);
        let mut overlay_pass = RenderPass::new(overlay_program, None);
        overlay_pass.add_renderable(quad);
        overlay_pass.add_enable(Capability::Blend);
        overlay_pass.add_disable(Capability::DepthTest);
        overlay_pass.set_viewport(Viewport::full(size.0, size.1));

        let mut camera = Camera::new(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            Projection::Perspective {
                fovy: 65.0,
                znear: 0.1,
                zfar: 10.0,
            },
        );
        camera.resize(size.0, size.1);

        debug.outdent();
        debug.print();
        Ok(Self {
            controls: SceneControls::new(camera, &options.camera),
            options: options.ssr.clone(),
            placements,
            gbuffer_pass,
            composite_pass,
            reflection_pass,
            overlay_pass,
        })
    }

    /// Per-object G-Buffer parameters of scene object `index`.
    fn object_parameters(&self, index: usize, rotation: Mat4) -> Parameters {
        let placement = self.placements.get(index).copied().unwrap_or(Mat4::IDENTITY);
        let mix = if index == BILLBOARD { 1.0_f32 } else { 0.0 };
        Parameters::new()
            .with("model", rotation * placement)
            .with("color", Vec4::from_array(self.options.color))
            .with("mixTexture", mix)
    }
}

impl Demo for SsrDemo {
    fn title(&self) -> &str {
        "Screen-Space Reflections"
    }

    fn frame(&mut self, ctx: &mut Context, dt: f32) -> Result<(), ContextError> {
        self.controls.update(dt);
        let camera = &self.controls.camera;
        let view = camera.view();
        let rotation = self.controls.rotation();

        let frame = Parameters::new()
            .with("view", view)
            .with("projection", camera.projection_matrix());
        self.gbuffer_pass
            .render_each(ctx, &frame, |index, _| self.object_parameters(index, rotation))?;

        let billboard_model = rotation * self.placements.get(BILLBOARD).copied().unwrap_or(Mat4::IDENTITY);
        self.reflection_pass.render(
            ctx,
            &Parameters::new()
                .with("view", view)
                .with("bbModel", billboard_model),
        )?;

        let light = view * rotation * Vec4::from_array(self.options.light_pos);
        self.composite_pass
            .render(ctx, &Parameters::new().with("vLightPos", light))?;
        self.overlay_pass.render(ctx, &Parameters::new())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.controls.camera.resize(width, height);
        self.composite_pass.set_viewport(Viewport::full(width, height));
        self.overlay_pass.set_viewport(Viewport::full(width, height));
    }

    fn handle(&mut self, command: InputCommand) {
        self.controls.apply(command);
    }
}
