//! Depth peeling of nested boxes.
//!
//! Each peel pass renders the whole scene into its own G-Buffer. Layer 0
//! keeps the nearest surfaces; layer `n` discards everything at or in
//! front of layer `n - 1`'s depth. One layer is composited with a toon
//! shader, and every layer's color is shown as a thumbnail along the
//! bottom edge.

use glam::{Vec3, Vec4};

use super::{output_texture, Demo, SceneControls};
use crate::camera::{Camera, Projection};
use crate::context::{
    AttachmentConfig, Capability, ClearMask, Context, ContextError, Filter, FramebufferId,
    MeshId, TextureDesc, TextureHandle, Viewport, DEPTH_FORMAT,
};
use crate::error::VolrenError;
use crate::input::InputCommand;
use crate::mesh::Mesh;
use crate::options::{Options, PeelingOptions};
use crate::render_pass::RenderPass;
use crate::shader::{builtin, Parameters};
use crate::util::{DebugLog, Updatable};

const BACKGROUND: Vec4 = Vec4::new(0.25, 0.25, 0.35, 0.0);

/// Thumbnails take this fraction of the surface on each axis.
const THUMBNAIL_SCALE: u32 = 4;

/// Half extent of box `index` out of `count`, innermost first.
fn box_extent(index: u32, count: u32) -> f32 {
    0.8 * (index + 1) as f32 / count.max(1) as f32
}

/// Base color darkened towards the innermost box.
fn box_tint(color: Vec4, index: u32, count: u32) -> Vec4 {
    let shade = 0.4 + 0.6 * (index + 1) as f32 / count.max(1) as f32;
    (color.truncate() * shade).extend(color.w)
}

/// Thumbnail viewport of layer `index` on a `width × height` surface.
fn thumbnail(index: u32, width: u32, height: u32) -> Viewport {
    let w = width / THUMBNAIL_SCALE;
    let h = height / THUMBNAIL_SCALE;
    Viewport {
        x: index * w,
        y: height - h,
        width: w,
        height: h,
    }
}

#[derive(Debug)]
struct PeelLayer {
    fbo: FramebufferId,
    pass: RenderPass,
    /// Depth the layer peels against.
    last_depth: TextureHandle,
    color: TextureHandle,
}

/// Depth peeling with a toon-shaded composite of one layer.
#[derive(Debug)]
pub struct DepthPeelDemo {
    controls: SceneControls,
    options: PeelingOptions,
    layers: Vec<PeelLayer>,
    composite_pass: RenderPass,
    thumbnail_passes: Vec<RenderPass>,
    shown: usize,
}

impl DepthPeelDemo {
    /// Set the demo up on `ctx`.
    ///
    /// # Errors
    ///
    /// [`VolrenError::Shader`] if a program fails to link.
    pub fn new(ctx: &mut Context, options: &Options, size: (u32, u32)) -> Result<Self, VolrenError> {
        let peeling = options.peeling.clone();
        let layer_count = peeling.layers.max(1);
        let mut debug = DebugLog::new(false);
        debug.log("Setting up depth peeling");
        debug.indent();
        debug.log_value("layers", layer_count);
        debug.log_value("objects", peeling.objects);

        let shaders = &options.paths.shaders;
        let peel_program = ctx.add_program(builtin::load_program(
            shaders,
            "gbuffer.vert.wgsl",
            "peel.frag.wgsl",
        )?);
        let npr_program = ctx.add_program(builtin::load_program(
            shaders,
            "fullscreen.vert.wgsl",
            "npr.frag.wgsl",
        )?);
        let show_program = ctx.add_program(builtin::load_program(
            shaders,
            "fullscreen.vert.wgsl",
            "show_texture.frag.wgsl",
        )?);

        let boxes: Vec<MeshId> = (0..peeling.objects)
            .map(|i| ctx.add_mesh(Mesh::volume_cube(box_extent(i, peeling.objects))))
            .collect();
        let quad = ctx.add_mesh(Mesh::quad());

        let outputs = ctx
            .program(peel_program)
            .ok_or(ContextError::UnknownProgram(peel_program))?
            .outputs()
            .clone();
        // Layer 0 peels against nothing, but the binding still needs a
        // depth texture that is not its own attachment.
        let mut last_depth = ctx.create_texture(TextureDesc::new_2d(1, 1, DEPTH_FORMAT, Filter::Nearest));
        let mut layers = Vec::with_capacity(layer_count as usize);
        for _ in 0..layer_count {
            let fbo = ctx.create_framebuffer_with_outputs(
                &outputs,
                size.0,
                size.1,
                AttachmentConfig::RGBA32F,
            );
            let mut pass = RenderPass::new(peel_program, Some(fbo));
            for &mesh in &boxes {
                pass.add_renderable(mesh);
            }
            pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
            pass.add_enable(Capability::DepthTest);
            pass.add_disable(Capability::Blend);

            let color = output_texture(ctx, fbo, "fragColor")?;
            layers.push(PeelLayer {
                fbo,
                pass,
                last_depth,
                color,
            });
            last_depth = ctx
                .framebuffer(fbo)
                .ok_or(ContextError::UnknownFramebuffer(fbo))?
                .depth_texture();
        }

        let shown = (peeling.show_layer.min(layer_count - 1)) as usize;
        let shown_fbo = layers[shown].fbo;
        let maps = Parameters::new()
            .with("strength", peeling.strength)
            .with_texture("colorMap", output_texture(ctx, shown_fbo, "fragColor")?)
            .with_texture("normalMap", output_texture(ctx, shown_fbo, "fragNormal")?)
            .with_texture("positionMap", output_texture(ctx, shown_fbo, "fragPosition")?);
        ctx.program_mut(npr_program)
            .ok_or(ContextError::UnknownProgram(npr_program))?
            .apply(&maps);
        debug.log_value("shown layer", shown);

        let mut composite_pass = RenderPass::new(npr_program, None);
        composite_pass.add_renderable(quad);
        composite_pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
        composite_pass.add_disable(Capability::DepthTest);
        composite_pass.set_clear_color(BACKGROUND);
        composite_pass.set_viewport(Viewport::full(size.0, size.1));

        let thumbnail_passes = (0..layer_count)
            .map(|i| {
                let mut pass = RenderPass::new(show_program, None);
                pass.add_renderable(quad);
                pass.add_enable(Capability::Blend);
                pass.add_disable(Capability::DepthTest);
                pass.set_viewport(thumbnail(i, size.0, size.1));
                pass
            })
            .collect();

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
            options: peeling,
            layers,
            composite_pass,
            thumbnail_passes,
            shown,
        })
    }

    /// Number of peeled layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Layer composited onto the surface.
    #[must_use]
    pub fn shown_layer(&self) -> usize {
        self.shown
    }
}

impl Demo for DepthPeelDemo {
    fn title(&self) -> &str {
        "Depth Peeling"
    }

    fn frame(&mut self, ctx: &mut Context, dt: f32) -> Result<(), ContextError> {
        self.controls.update(dt);
        let camera = &self.controls.camera;
        let view = camera.view();
        let model = self.controls.rotation();
        let color = Vec4::from_array(self.options.color);
        let objects = self.options.objects;

        for (level, layer) in self.layers.iter().enumerate() {
            let frame = Parameters::new()
                .with("view", view)
                .with("projection", camera.projection_matrix())
                .with("model", model)
                .with("peel_level", level as i32)
                .with_texture("lastDepth", layer.last_depth);
            layer.pass.render_each(ctx, &frame, |index, _| {
                Parameters::new().with("color", box_tint(color, index as u32, objects))
            })?;
        }

        let light = view * Vec4::from_array(self.options.light_pos);
        self.composite_pass
            .render(ctx, &Parameters::new().with("vLightPos", light))?;

        for (pass, layer) in self.thumbnail_passes.iter().zip(&self.layers) {
            pass.render(ctx, &Parameters::new().with_texture("tex", layer.color))?;
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.controls.camera.resize(width, height);
        self.composite_pass.set_viewport(Viewport::full(width, height));
        for (i, pass) in self.thumbnail_passes.iter_mut().enumerate() {
            pass.set_viewport(thumbnail(i as u32, width, height));
        }
    }

    fn handle(&mut self, command: InputCommand) {
        self.controls.apply(command);
    }
}
