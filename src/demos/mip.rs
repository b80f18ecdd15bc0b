//! Two-pass maximum intensity projection.
//!
//! The first pass rasterizes the volume box into a two-attachment
//! framebuffer holding the unit-cube coordinate of each pixel's ray exit
//! (back faces) and entry (front faces). The second pass draws the box
//! again onto the surface and marches the ray between the two through the
//! 3D texture, keeping the brightest sample.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::{output_texture, Demo, SceneControls};
use crate::camera::{Camera, Projection};
use crate::context::{
    AttachmentConfig, Capability, ClearMask, Context, ContextError, Filter, Viewport,
};
use crate::error::VolrenError;
use crate::importer::{self, ByteOrder, VolumeData};
use crate::input::InputCommand;
use crate::mesh::Mesh;
use crate::options::{Dataset, MipOptions, Options};
use crate::render_pass::RenderPass;
use crate::shader::{builtin, Parameters};
use crate::util::{DebugLog, Updatable};

/// Entry/exit coordinates need more than 8 bits and must blend.
const UVW_ATTACHMENTS: AttachmentConfig = AttachmentConfig {
    format: wgpu::TextureFormat::Rgba16Float,
    filter: Filter::Nearest,
};

/// Load the configured data set from the resource root.
#[must_use]
pub fn load_dataset(options: &Options) -> VolumeData<i16> {
    let resources = &options.paths.resources;
    match options.mip.dataset {
        Dataset::CtHead => {
            let [x, y, z] = options.mip.slice_size;
            importer::load_3d_data(
                &resources.join(&options.mip.slice_prefix),
                x,
                y,
                z,
                2,
                ByteOrder::BigEndian,
            )
        }
        Dataset::Bruder => importer::load_bruder(resources),
    }
}

/// Uniform values that only depend on the data and the options.
struct VolumeUniforms {
    min: f32,
    range: f32,
    step: f32,
    window_min: f32,
    window_max: f32,
    lmip_threshold: f32,
}

impl VolumeUniforms {
    fn new(volume: &VolumeData<i16>, options: &MipOptions) -> Self {
        let min = f32::from(volume.min);
        let range = (f32::from(volume.max) - min).max(1.0);
        let normalize = |v: f32| (v - min) / range;
        Self {
            min,
            range,
            step: 1.0 / (2.0 * volume.size_x.max(1) as f32),
            window_min: normalize(options.window_min.unwrap_or(min)),
            window_max: normalize(options.window_max.unwrap_or(min + range)),
            lmip_threshold: normalize(options.lmip_threshold.unwrap_or(min + range)),
        }
    }

    fn parameters(&self, options: &MipOptions) -> Parameters {
        Parameters::new()
            .with("uMinVal", self.min)
            .with("uRange", self.range)
            .with("uStepSize", self.step)
            .with("uRayParamStart", options.ray_start)
            .with("uRayParamEnd", options.ray_end)
            .with("uWindowingMinVal", self.window_min)
            .with("uWindowingMaxVal", self.window_max)
            .with("uWindowingRange", self.window_max - self.window_min)
            .with("uMaxDistColor", Vec4::from_array(options.max_dist_color))
            .with("uMinDistColor", Vec4::from_array(options.min_dist_color))
            .with("uColorEffectInfl", options.color_effect)
            .with("uContrastEffectInfl", options.contrast_effect)
            .with("uThresholdLMIP", self.lmip_threshold)
            .with("uMinStepsLMIP", options.lmip_min_steps)
            .with("uMinDepthRange", options.min_depth_range)
            .with("uMaxDepthRange", options.max_depth_range)
            .with("uMinValThreshold", options.min_value_threshold)
            .with("uMaxValThreshold", options.max_value_threshold)
    }
}

/// Interactive MIP of a CT or MRT volume.
#[derive(Debug)]
pub struct MipDemo {
    controls: SceneControls,
    uvw_pass: RenderPass,
    mip_pass: RenderPass,
    size: (u32, u32),
}

impl MipDemo {
    /// Load the configured data set and set the demo up.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn load(ctx: &mut Context, options: &Options, size: (u32, u32)) -> Result<Self, VolrenError> {
        let volume = load_dataset(options);
        Self::new(ctx, options, size, &volume)
    }

    /// Set the demo up around `volume`.
    ///
    /// The entry/exit framebuffer keeps the initial surface size; the
    /// ray-cast pass rescales its lookups after a resize.
    ///
    /// # Errors
    ///
    /// [`VolrenError::Shader`] if a program fails to link.
    pub fn new(
        ctx: &mut Context,
        options: &Options,
        size: (u32, u32),
        volume: &VolumeData<i16>,
    ) -> Result<Self, VolrenError> {
        let mut debug = DebugLog::new(false);
        debug.log("Setting up MIP");
        debug.indent();

        let shaders = &options.paths.shaders;
        let uvw_program = ctx.add_program(builtin::load_program(
            shaders,
            "volume.vert.wgsl",
            "uvw.frag.wgsl",
        )?);
        let mip_program = ctx.add_program(builtin::load_program(
            shaders,
            "volume.vert.wgsl",
            "mip.frag.wgsl",
        )?);

        let [ex, ey, ez] = options.mip.volume_extent;
        let box_mesh = ctx.add_mesh(Mesh::volume(ex, ey, ez));
        debug.log_value("volume extent", Vec3::new(ex, ey, ez));

        let outputs = ctx
            .program(uvw_program)
            .ok_or(ContextError::UnknownProgram(uvw_program))?
            .outputs()
            .clone();
        let uvw_fbo = ctx.create_framebuffer_with_outputs(&outputs, size.0, size.1, UVW_ATTACHMENTS);
        let back = output_texture(ctx, uvw_fbo, "fragUVRCoordBack")?;
        let front = output_texture(ctx, uvw_fbo, "fragUVRCoordFront")?;
        let volume_texture = ctx.create_volume_texture(volume);
        debug.log_value("volume samples", volume.len());
        debug.log_value("min", volume.min);
        debug.log_value("max", volume.max);

        let statics = VolumeUniforms::new(volume, &options.mip);
        let program = ctx
            .program_mut(mip_program)
            .ok_or(ContextError::UnknownProgram(mip_program))?;
        program.apply(&statics.parameters(&options.mip));
        program.add_texture("back_uvw", back);
        program.add_texture("front_uvw", front);
        program.add_texture("volume_texture", volume_texture);
        debug.log_value("step size", statics.step);
        debug.log_value("LMIP threshold", statics.lmip_threshold);

        let mut uvw_pass = RenderPass::new(uvw_program, Some(uvw_fbo));
        uvw_pass.add_renderable(box_mesh);
        uvw_pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
        uvw_pass.add_disable(Capability::DepthTest);
        uvw_pass.add_enable(Capability::Blend);

        let mut mip_pass = RenderPass::new(mip_program, None);
        mip_pass.add_renderable(box_mesh);
        mip_pass.add_clear_bits(ClearMask::COLOR | ClearMask::DEPTH);
        mip_pass.add_enable(Capability::DepthTest);
        mip_pass.add_disable(Capability::Blend);
        mip_pass.set_viewport(Viewport::full(size.0, size.1));

        let mut camera = Camera::new(
            Vec3::new(2.5, 0.5, 2.5),
            Vec3::ZERO,
            Projection::Orthographic {
                half_extent: 2.0,
                znear: -1.0,
                zfar: 6.0,
            },
        );
        camera.resize(size.0, size.1);

        debug.outdent();
        debug.print();
        Ok(Self {
            controls: SceneControls::new(camera, &options.camera),
            uvw_pass,
            mip_pass,
            size,
        })
    }

    /// Current model matrix. The data is stored top row first, so y is
    /// flipped.
    #[must_use]
    pub fn model(&self) -> Mat4 {
        self.controls.rotation() * Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
    }

    /// Camera, turntable and auto-rotation.
    #[must_use]
    pub fn controls(&self) -> &SceneControls {
        &self.controls
    }
}

impl Demo for MipDemo {
    fn title(&self) -> &str {
        "Interactive MIP"
    }

    fn frame(&mut self, ctx: &mut Context, dt: f32) -> Result<(), ContextError> {
        self.controls.update(dt);
        let camera = &self.controls.camera;
        let transform = Parameters::new()
            .with("model", self.model())
            .with("view", camera.view())
            .with("projection", camera.projection_matrix());

        self.uvw_pass.render(ctx, &transform)?;
        let raycast = transform.with(
            "uViewportSize",
            Vec2::new(self.size.0 as f32, self.size.1 as f32),
        );
        self.mip_pass.render(ctx, &raycast)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.controls.camera.resize(width, height);
        self.mip_pass.set_viewport(Viewport::full(width, height));
    }

    fn handle(&mut self, command: InputCommand) {
        self.controls.apply(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Command;
    use crate::demos::test_support::draws_by_target;

    fn volume() -> VolumeData<i16> {
        let samples = (0..16).map(|i| i * 10).collect();
        VolumeData::from_samples(4, 2, 2, samples)
    }

    fn demo(ctx: &mut Context) -> MipDemo {
        ctx.set_surface_size(800, 800);
        MipDemo::new(ctx, &Options::default(), (800, 800), &volume()).unwrap()
    }

    #[test]
    fn one_frame_fills_the_uvw_buffer_then_the_surface() {
        let mut ctx = Context::default();
        let mut mip = demo(&mut ctx);
        mip.frame(&mut ctx, 0.016).unwrap();

        let groups = draws_by_target(&ctx);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, mip.uvw_pass.framebuffer());
        assert!(groups[0].0.is_some());
        assert_eq!(groups[0].1[0].program, mip.uvw_pass.program());
        assert_eq!(groups[1].0, None);
        let raycast = &groups[1].1[0];
        assert_eq!(raycast.program, mip.mip_pass.program());
        assert_eq!(raycast.mesh, mip.mip_pass.renderables()[0]);
        assert_eq!(raycast.textures.len(), 3);
    }

    #[test]
    fn frame_leaves_capabilities_as_found() {
        let mut ctx = Context::default();
        let mut mip = demo(&mut ctx);
        let before = ctx.capabilities();
        mip.frame(&mut ctx, 0.016).unwrap();
        assert_eq!(ctx.capabilities(), before);
    }

    #[test]
    fn data_range_reaches_the_shader() {
        let mut ctx = Context::default();
        let mip = demo(&mut ctx);
        let program = ctx.program(mip.mip_pass.program()).unwrap();
        assert_eq!(program.read_uniform::<f32>("uMinVal"), Some(0.0));
        assert_eq!(program.read_uniform::<f32>("uRange"), Some(150.0));
        assert_eq!(program.read_uniform::<f32>("uStepSize"), Some(0.125));
        assert_eq!(program.read_uniform::<f32>("uWindowingRange"), Some(1.0));
        assert_eq!(program.read_uniform::<f32>("uThresholdLMIP"), Some(1.0));
    }

    #[test]
    fn resize_moves_the_surface_viewport() {
        let mut ctx = Context::default();
        let mut mip = demo(&mut ctx);
        mip.resize(640, 480);
        mip.frame(&mut ctx, 0.0).unwrap();

        let viewports: Vec<Viewport> = ctx
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Viewport(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(viewports, [Viewport::full(800, 800), Viewport::full(640, 480)]);
    }

    #[test]
    fn model_flips_y() {
        let mut ctx = Context::default();
        let mip = demo(&mut ctx);
        assert_eq!(mip.model().transform_point3(Vec3::Y), Vec3::new(0.0, -1.0, 0.0));
    }
}
