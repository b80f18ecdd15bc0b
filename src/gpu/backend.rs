//! Replays a [`Context`]'s recorded frame on the GPU.
//!
//! The backend mirrors every registered resource lazily: textures when they
//! first appear in the registry, meshes and shader modules the first frame
//! they are reachable. Pipelines and bind group layouts are cached by the
//! state that shapes them, so a steady-state frame creates nothing but
//! bind groups.

use std::borrow::Cow;
use std::num::NonZeroU64;

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::frame_plan::{self, PlannedDraw, PlannedPass};
use super::pipeline_helpers;
use super::render_context::RenderContext;
use super::texture::GpuTexture;
use super::uniform_block::UniformBlock;
use crate::context::{
    CapabilitySet, Context, Filter, FramebufferId, MeshId, ProgramId, TextureDesc, TextureHandle,
    Viewport, DEPTH_FORMAT,
};
use crate::mesh::{float_format, Mesh, Topology};
use crate::shader::reflect::SampleKind;
use crate::shader::ShaderProgram;

struct GpuMesh {
    vertex_buffers: FxHashMap<u32, wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffers = mesh
            .attributes()
            .iter()
            .map(|attr| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Attribute Buffer"),
                    contents: bytemuck::cast_slice(&attr.data),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                (attr.location, buffer)
            })
            .collect();
        let index_buffer = mesh.indices().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        Self {
            vertex_buffers,
            index_buffer,
        }
    }
}

struct ProgramModules {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    entries: Vec<wgpu::BindGroupLayoutEntry>,
    vertex: Vec<(u32, wgpu::VertexFormat, u64)>,
    topology: Topology,
    indexed: bool,
    colors: Vec<wgpu::TextureFormat>,
    capabilities: CapabilitySet,
}

struct CachedLayout {
    bind_group: wgpu::BindGroupLayout,
    pipeline: wgpu::PipelineLayout,
}

/// Sampler chosen for one sampler slot.
#[derive(Clone, Copy)]
enum SamplerChoice {
    Linear,
    Nearest,
    Comparison,
}

/// A draw resolved against GPU resources, ready to encode.
struct PreparedDraw {
    pipeline: PipelineKey,
    entries: Vec<wgpu::BindGroupLayoutEntry>,
    textures: Vec<(u32, TextureHandle)>,
    samplers: Vec<(u32, SamplerChoice)>,
    uniforms: Vec<(u32, u64, u64)>,
    mesh: MeshId,
    vertex_locations: Vec<u32>,
    elements: u32,
    indexed: bool,
    viewport: Viewport,
}

/// Color formats and size of a pass target.
struct TargetInfo {
    formats: Vec<wgpu::TextureFormat>,
    size: (u32, u32),
}

/// Realizes a [`Context`]'s resources on a device and replays its commands.
pub struct GpuBackend {
    textures: FxHashMap<TextureHandle, GpuTexture>,
    meshes: FxHashMap<MeshId, GpuMesh>,
    modules: FxHashMap<ProgramId, ProgramModules>,
    layouts: FxHashMap<Vec<wgpu::BindGroupLayoutEntry>, CachedLayout>,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,
    uniforms: UniformBlock,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    comparison_sampler: wgpu::Sampler,
    surface_depth: Option<GpuTexture>,
    frame_capabilities: CapabilitySet,
}

impl GpuBackend {
    /// Backend with empty caches on `rc`'s device.
    #[must_use]
    pub fn new(rc: &RenderContext) -> Self {
        let device = &rc.device;
        Self {
            textures: FxHashMap::default(),
            meshes: FxHashMap::default(),
            modules: FxHashMap::default(),
            layouts: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            uniforms: UniformBlock::new(device, 16),
            linear_sampler: pipeline_helpers::clamped_sampler(
                device,
                "Linear Sampler",
                wgpu::FilterMode::Linear,
            ),
            nearest_sampler: pipeline_helpers::clamped_sampler(
                device,
                "Nearest Sampler",
                wgpu::FilterMode::Nearest,
            ),
            comparison_sampler: pipeline_helpers::comparison_sampler(device),
            surface_depth: None,
            frame_capabilities: CapabilitySet::default(),
        }
    }

    /// Number of pipelines created so far.
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Create GPU textures for newly registered handles and flush pending
    /// uploads.
    fn sync_textures(&mut self, rc: &RenderContext, ctx: &mut Context) {
        for (handle, desc) in ctx.textures.iter() {
            if !self.textures.contains_key(&handle) {
                let label = format!("Texture {}", handle.raw());
                let _ = self
                    .textures
                    .insert(handle, GpuTexture::new(&rc.device, &label, *desc));
            }
        }
        for (handle, data) in ctx.textures.take_uploads() {
            match self.textures.get(&handle) {
                Some(texture) => texture.upload(&rc.queue, &data),
                None => log::warn!("upload to unknown texture {}", handle.raw()),
            }
        }
    }

    fn ensure_mesh(&mut self, device: &wgpu::Device, ctx: &Context, id: MeshId) -> bool {
        if self.meshes.contains_key(&id) {
            return true;
        }
        let Some(mesh) = ctx.mesh(id) else {
            return false;
        };
        let _ = self.meshes.insert(id, GpuMesh::new(device, mesh));
        true
    }

    fn ensure_modules(&mut self, device: &wgpu::Device, id: ProgramId, program: &ShaderProgram) {
        if self.modules.contains_key(&id) {
            return;
        }
        let create = |label: &str, module: &naga::Module| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Naga(Cow::Owned(module.clone())),
            })
        };
        let modules = ProgramModules {
            vertex: create("Vertex Stage", &program.vertex_stage().module),
            fragment: create("Fragment Stage", &program.fragment_stage().module),
        };
        let _ = self.modules.insert(id, modules);
    }

    fn ensure_surface_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) {
        let current = self
            .surface_depth
            .as_ref()
            .map(|t| (t.desc.width, t.desc.height));
        if current != Some(size) {
            let desc = TextureDesc::new_2d(size.0, size.1, DEPTH_FORMAT, Filter::Nearest);
            self.surface_depth = Some(GpuTexture::new(device, "Surface Depth", desc));
        }
    }

    fn target_info(
        &self,
        ctx: &Context,
        target: Option<FramebufferId>,
        surface: (wgpu::TextureFormat, (u32, u32)),
    ) -> Option<TargetInfo> {
        let Some(id) = target else {
            return Some(TargetInfo {
                formats: vec![surface.0],
                size: surface.1,
            });
        };
        let fb = ctx.framebuffer(id)?;
        let formats = fb
            .targets()
            .iter()
            .map(|&tex| self.textures.get(&tex).map(|t| t.desc.format))
            .collect::<Option<Vec<_>>>()?;
        Some(TargetInfo {
            formats,
            size: (fb.width(), fb.height()),
        })
    }

    /// Resolve one recorded draw, or `None` (with a log line) when it cannot
    /// be drawn.
    fn prepare_draw(
        &mut self,
        device: &wgpu::Device,
        ctx: &Context,
        draw: &PlannedDraw,
        target: &TargetInfo,
        uniform_base: usize,
    ) -> Option<PreparedDraw> {
        let call = &draw.call;
        let Some(program) = ctx.program(call.program) else {
            log::warn!("draw skipped: unknown program {:?}", call.program);
            return None;
        };
        let Some(viewport) = draw.state.viewport.clipped_to(target.size.0, target.size.1) else {
            log::debug!("draw skipped: empty viewport {:?}", draw.state.viewport);
            return None;
        };
        if !self.ensure_mesh(device, ctx, call.mesh) {
            log::warn!("draw skipped: unknown mesh {:?}", call.mesh);
            return None;
        }
        let mesh = ctx.mesh(call.mesh)?;

        let mut vertex = Vec::with_capacity(program.vertex_inputs().len());
        for input in program.vertex_inputs() {
            let Some(attr) = mesh.attribute(input.location) else {
                log::warn!(
                    "draw skipped: mesh has no attribute for input {} at location {}",
                    input.name,
                    input.location
                );
                return None;
            };
            // A shader may read fewer lanes than the mesh stores.
            let format = if input.components <= attr.components {
                float_format(input.components)
            } else {
                attr.format()
            };
            vertex.push((input.location, format, attr.stride()));
        }

        if let Some(max) = program.outputs().values().max() {
            if *max as usize >= target.formats.len() {
                log::warn!(
                    "draw skipped: output {max} has no color attachment ({} bound)",
                    target.formats.len()
                );
                return None;
            }
        }

        let mut entries = Vec::new();
        let mut uniforms = Vec::new();
        for region in program.uniform_bindings() {
            entries.push(pipeline_helpers::uniform_buffer(region.binding));
            uniforms.push((
                region.binding,
                (uniform_base + region.offset as usize) as u64,
                u64::from(region.size),
            ));
        }

        let mut textures = Vec::new();
        let mut all_filterable = true;
        let mut any_linear = false;
        for slot in program.texture_slots() {
            let Some(bound) = call.textures.iter().find(|b| b.binding == slot.binding) else {
                log::warn!("draw skipped: texture {} is not bound", slot.name);
                return None;
            };
            let Some(gpu) = self.textures.get(&bound.texture) else {
                log::warn!("draw skipped: texture {} is not realized", bound.texture.raw());
                return None;
            };
            let filterable = gpu.is_filterable();
            if slot.sample == SampleKind::Float {
                all_filterable &= filterable;
                any_linear |= gpu.desc.filter == Filter::Linear;
            }
            entries.push(pipeline_helpers::texture(slot, filterable));
            textures.push((slot.binding, bound.texture));
        }

        let mut samplers = Vec::new();
        for slot in program.sampler_slots() {
            let (kind, choice) = if slot.comparison {
                (wgpu::SamplerBindingType::Comparison, SamplerChoice::Comparison)
            } else if all_filterable {
                let choice = if any_linear {
                    SamplerChoice::Linear
                } else {
                    SamplerChoice::Nearest
                };
                (wgpu::SamplerBindingType::Filtering, choice)
            } else {
                (wgpu::SamplerBindingType::NonFiltering, SamplerChoice::Nearest)
            };
            entries.push(pipeline_helpers::sampler(slot.binding, kind));
            samplers.push((slot.binding, choice));
        }
        entries.sort_by_key(|e| e.binding);

        let indexed = mesh.indices().is_some();
        let pipeline = PipelineKey {
            program: call.program,
            entries: entries.clone(),
            vertex,
            topology: mesh.topology(),
            indexed,
            colors: target.formats.clone(),
            capabilities: draw.state.capabilities,
        };
        self.ensure_modules(device, call.program, program);
        self.ensure_pipeline(device, program, &pipeline);

        Some(PreparedDraw {
            vertex_locations: pipeline.vertex.iter().map(|(loc, _, _)| *loc).collect(),
            pipeline,
            entries,
            textures,
            samplers,
            uniforms,
            mesh: call.mesh,
            elements: mesh.element_count(),
            indexed,
            viewport,
        })
    }

    fn ensure_layout(&mut self, device: &wgpu::Device, entries: &[wgpu::BindGroupLayoutEntry]) {
        if self.layouts.contains_key(entries) {
            return;
        }
        let bind_group = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Program Bind Group Layout"),
            entries,
        });
        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &[&bind_group],
            push_constant_ranges: &[],
        });
        let _ = self.layouts.insert(
            entries.to_vec(),
            CachedLayout {
                bind_group,
                pipeline,
            },
        );
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, program: &ShaderProgram, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }
        self.ensure_layout(device, &key.entries);
        let (Some(layout), Some(modules)) =
            (self.layouts.get(&key.entries), self.modules.get(&key.program))
        else {
            return;
        };

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .vertex
            .iter()
            .map(|&(location, format, _)| {
                [wgpu::VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .vertex
            .iter()
            .zip(&attributes)
            .map(|(&(_, _, stride), attribute)| wgpu::VertexBufferLayout {
                array_stride: stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let written: Vec<u32> = program.outputs().values().copied().collect();
        let targets: Vec<Option<wgpu::ColorTargetState>> = key
            .colors
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                let write_mask = if written.contains(&(i as u32)) {
                    wgpu::ColorWrites::ALL
                } else {
                    wgpu::ColorWrites::empty()
                };
                Some(wgpu::ColorTargetState {
                    format,
                    blend: pipeline_helpers::blend(key.capabilities, format),
                    write_mask,
                })
            })
            .collect();

        log::debug!(
            "creating pipeline for program {:?} ({} targets)",
            key.program,
            targets.len()
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Program Pipeline"),
            layout: Some(&layout.pipeline),
            vertex: wgpu::VertexState {
                module: &modules.vertex,
                entry_point: Some(program.vertex_stage().entry_point.as_str()),
                buffers: &buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &modules.fragment,
                entry_point: Some(program.fragment_stage().entry_point.as_str()),
                targets: &targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: pipeline_helpers::primitive(key.topology, key.indexed, key.capabilities),
            depth_stencil: Some(pipeline_helpers::depth_stencil(key.capabilities)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let _ = self.pipelines.insert(key.clone(), pipeline);
    }

    fn sampler(&self, choice: SamplerChoice) -> &wgpu::Sampler {
        match choice {
            SamplerChoice::Linear => &self.linear_sampler,
            SamplerChoice::Nearest => &self.nearest_sampler,
            SamplerChoice::Comparison => &self.comparison_sampler,
        }
    }

    fn bind_group(&self, device: &wgpu::Device, draw: &PreparedDraw) -> Option<wgpu::BindGroup> {
        let layout = self.layouts.get(&draw.entries)?;
        let mut entries = Vec::with_capacity(draw.entries.len());
        for &(binding, offset, size) in &draw.uniforms {
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: self.uniforms.buffer(),
                    offset,
                    size: NonZeroU64::new(size),
                }),
            });
        }
        for (binding, handle) in &draw.textures {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(&self.textures.get(handle)?.view),
            });
        }
        for &(binding, choice) in &draw.samplers {
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Sampler(self.sampler(choice)),
            });
        }
        Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &layout.bind_group,
            entries: &entries,
        }))
    }

    fn attachment_views<'a>(
        &'a self,
        ctx: &Context,
        target: Option<FramebufferId>,
        surface_view: &'a wgpu::TextureView,
    ) -> Option<(Vec<&'a wgpu::TextureView>, &'a wgpu::TextureView)> {
        match target {
            None => Some((vec![surface_view], &self.surface_depth.as_ref()?.view)),
            Some(id) => {
                let fb = ctx.framebuffer(id)?;
                let colors = fb
                    .targets()
                    .iter()
                    .map(|tex| self.textures.get(tex).map(|t| &t.view))
                    .collect::<Option<Vec<_>>>()?;
                let depth = &self.textures.get(&fb.depth_texture())?.view;
                Some((colors, depth))
            }
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        rc: &RenderContext,
        ctx: &Context,
        pass: &PlannedPass,
        draws: &[PreparedDraw],
        surface_view: &wgpu::TextureView,
    ) {
        let bind_groups: Vec<Option<wgpu::BindGroup>> = draws
            .iter()
            .map(|d| self.bind_group(&rc.device, d))
            .collect();
        let Some((colors, depth)) = self.attachment_views(ctx, pass.target, surface_view) else {
            return;
        };
        let load = pass.clear_color.map_or(wgpu::LoadOp::Load, |c| {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.x),
                g: f64::from(c.y),
                b: f64::from(c.z),
                a: f64::from(c.w),
            })
        });
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = colors
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();
        let depth_load = if pass.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Recorded Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        for (draw, bind_group) in draws.iter().zip(&bind_groups) {
            let (Some(pipeline), Some(mesh), Some(bind_group)) = (
                self.pipelines.get(&draw.pipeline),
                self.meshes.get(&draw.mesh),
                bind_group,
            ) else {
                continue;
            };
            let vp = draw.viewport;
            render_pass.set_viewport(
                vp.x as f32,
                vp.y as f32,
                vp.width as f32,
                vp.height as f32,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            for (slot, location) in draw.vertex_locations.iter().enumerate() {
                if let Some(buffer) = mesh.vertex_buffers.get(location) {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
            }
            match (&mesh.index_buffer, draw.indexed) {
                (Some(indices), true) => {
                    render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..draw.elements, 0, 0..1);
                }
                _ => render_pass.draw(0..draw.elements, 0..1),
            }
        }
    }

    /// Replay everything recorded on `ctx` since the last frame into
    /// `surface_view`, then submit.
    pub fn render_frame(
        &mut self,
        rc: &RenderContext,
        ctx: &mut Context,
        surface_view: &wgpu::TextureView,
    ) {
        self.sync_textures(rc, ctx);
        self.ensure_surface_depth(&rc.device, rc.size());

        let commands = ctx.take_commands();
        let passes = frame_plan::plan_from(&commands, self.frame_capabilities);
        self.frame_capabilities = ctx.capabilities();

        let surface = (rc.format(), rc.size());
        let mut prepared: Vec<(&PlannedPass, Vec<PreparedDraw>)> = Vec::with_capacity(passes.len());
        for pass in &passes {
            let Some(target) = self.target_info(ctx, pass.target, surface) else {
                log::warn!("pass skipped: target {:?} is not realized", pass.target);
                continue;
            };
            let mut draws = Vec::with_capacity(pass.draws.len());
            for draw in &pass.draws {
                let base = self.uniforms.staging().next_region();
                if let Some(ready) = self.prepare_draw(&rc.device, ctx, draw, &target, base) {
                    if !ready.uniforms.is_empty() {
                        let _ = self.uniforms.staging().push(&draw.call.uniforms);
                    }
                    draws.push(ready);
                }
            }
            prepared.push((pass, draws));
        }
        self.uniforms.upload(&rc.device, &rc.queue);

        let mut encoder = rc.create_encoder();
        for (pass, draws) in &prepared {
            self.encode_pass(&mut encoder, rc, ctx, pass, draws, surface_view);
        }
        rc.submit(encoder);
    }
}
