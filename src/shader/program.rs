//! Linked shader programs with reflected outputs, uniforms and textures.

use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::FxHashMap;

use super::layout::ProgramLayout;
use super::reflect::{self, SamplerSlot, StageInterface, TextureSlot, UniformBlockDecl, Varying};
use super::stage::{Shader, ShaderError, ShaderStage};
use super::uniform::{self, Parameters, UniformKind, UniformType, UniformValue};
use crate::context::{TextureBinding, TextureHandle};

/// Byte alignment of each uniform binding's region inside the block.
///
/// Matches the default `min_uniform_buffer_offset_alignment`.
pub const UNIFORM_REGION_ALIGN: u32 = 256;

/// A compiled stage ready for pipeline creation.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    /// Validated naga module.
    pub module: naga::Module,
    /// Entry point used by the program.
    pub entry_point: String,
}

/// Where a uniform lives in the program's uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    /// Location handed out to callers.
    pub location: u32,
    /// Declared type.
    pub kind: UniformKind,
    /// Absolute byte offset in the block.
    pub offset: u32,
}

/// Byte range of the block bound to one `var<uniform>` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBinding {
    /// `@binding` index in group 0.
    pub binding: u32,
    /// Start of the region in the block.
    pub offset: u32,
    /// Size of the region.
    pub size: u32,
}

/// A linked vertex + fragment program.
///
/// Holds the current value of every uniform in a CPU-side block laid out
/// as the GPU expects, so each draw can snapshot it.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex: CompiledStage,
    fragment: CompiledStage,
    vertex_inputs: Vec<Varying>,
    declared: Vec<(String, UniformSlot)>,
    uniforms: FxHashMap<String, u32>,
    outputs: FxHashMap<String, u32>,
    textures: FxHashMap<String, TextureHandle>,
    texture_slots: Vec<TextureSlot>,
    samplers: Vec<SamplerSlot>,
    bindings: Vec<UniformBinding>,
    block: Vec<u8>,
}

fn compile(stage: ShaderStage, source: &str) -> Result<Shader, ShaderError> {
    let mut shader = Shader::new(stage);
    let _ = shader.load_from_str(source);
    shader.compile()?;
    Ok(shader)
}

fn compile_file(stage: ShaderStage, path: &Path) -> Result<Shader, ShaderError> {
    let mut shader = Shader::new(stage);
    let _ = shader.load_from_file(path)?;
    shader.compile()?;
    Ok(shader)
}

fn link_error(msg: String) -> ShaderError {
    log::error!("Shader program linking failed: {msg}");
    ShaderError::Link(msg)
}

fn stage_of(shader: &Shader) -> Result<(CompiledStage, StageInterface), ShaderError> {
    let stage = shader.stage();
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
        ShaderStage::Geometry => return Err(ShaderError::UnsupportedStage(stage)),
    };
    let module = shader
        .module()
        .ok_or_else(|| link_error(format!("{stage} shader is not compiled")))?;
    let interface = reflect::reflect(module, naga_stage).map_err(link_error)?;
    Ok((
        CompiledStage {
            module: module.clone(),
            entry_point: interface.entry_point.clone(),
        },
        interface,
    ))
}

/// Insert `item` under `binding`, failing if a different declaration is
/// already there.
fn merge<T: PartialEq>(
    into: &mut BTreeMap<u32, T>,
    binding: u32,
    item: T,
    what: &str,
) -> Result<(), ShaderError> {
    match into.get(&binding) {
        Some(existing) if *existing != item => Err(link_error(format!(
            "{what} at binding {binding} is declared differently by the stages"
        ))),
        Some(_) => Ok(()),
        None => {
            let _ = into.insert(binding, item);
            Ok(())
        }
    }
}

impl ShaderProgram {
    /// Compile and link a program from WGSL vertex and fragment sources.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Compile`] if either stage fails to compile,
    /// [`ShaderError::Link`] if the stages do not fit together.
    pub fn new(vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let vertex = compile(ShaderStage::Vertex, vertex)?;
        let fragment = compile(ShaderStage::Fragment, fragment)?;
        Self::link(&[vertex, fragment])
    }

    /// Compile and link a program from files relative to `root`.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`ShaderError::Io`] for unreadable files.
    pub fn from_files(root: &Path, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let vertex = compile_file(ShaderStage::Vertex, &root.join(vertex))?;
        let fragment = compile_file(ShaderStage::Fragment, &root.join(fragment))?;
        Self::link(&[vertex, fragment])
    }

    /// Vertex + fragment + geometry program.
    ///
    /// # Errors
    ///
    /// Always [`ShaderError::UnsupportedStage`]: WGSL has no geometry
    /// stage. Compile errors of the other stages are reported first.
    pub fn with_geometry(vertex: &str, fragment: &str, geometry: &str) -> Result<Self, ShaderError> {
        let _ = compile(ShaderStage::Vertex, vertex)?;
        let _ = compile(ShaderStage::Fragment, fragment)?;
        let _ = compile(ShaderStage::Geometry, geometry)?;
        Err(ShaderError::UnsupportedStage(ShaderStage::Geometry))
    }

    /// Compile, link, and check the program against an explicit layout.
    ///
    /// Every declared output must exist at the declared index, the program
    /// must have no other outputs, and every declared uniform must exist
    /// with the declared type.
    ///
    /// # Errors
    ///
    /// [`ShaderError::LayoutMismatch`] on any disagreement, otherwise as
    /// [`new`](Self::new).
    pub fn with_layout(
        vertex: &str,
        fragment: &str,
        layout: &ProgramLayout,
    ) -> Result<Self, ShaderError> {
        let program = Self::new(vertex, fragment)?;
        let mismatch = |msg: String| {
            log::error!("Shader layout mismatch: {msg}");
            ShaderError::LayoutMismatch(msg)
        };

        for (name, index) in layout.outputs() {
            match program.outputs.get(name) {
                Some(found) if found == index => {}
                Some(found) => {
                    return Err(mismatch(format!(
                        "output {name} is at {found}, expected {index}"
                    )))
                }
                None => return Err(mismatch(format!("output {name} is not declared"))),
            }
        }
        if program.outputs.len() != layout.outputs().len() {
            return Err(mismatch(format!(
                "program has {} outputs, layout declares {}",
                program.outputs.len(),
                layout.outputs().len()
            )));
        }
        for (name, kind) in layout.uniforms() {
            match program.slot(name) {
                Some(slot) if slot.kind == *kind => {}
                Some(slot) => {
                    return Err(mismatch(format!(
                        "uniform {name} is {}, expected {kind}",
                        slot.kind
                    )))
                }
                None => return Err(mismatch(format!("uniform {name} is not declared"))),
            }
        }
        Ok(program)
    }

    /// Link compiled stages into a program.
    ///
    /// Needs at least two shaders, exactly one vertex and one fragment
    /// stage. Every fragment input location must be written by the vertex
    /// stage, and resources bound by both stages must be declared alike.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Link`] describing the first problem found.
    pub fn link(shaders: &[Shader]) -> Result<Self, ShaderError> {
        if shaders.len() < 2 {
            log::error!(
                "Can't link shaders - you need at least 2, but attached shader count is only: {}",
                shaders.len()
            );
            return Err(ShaderError::Link(format!(
                "need at least 2 shaders, got {}",
                shaders.len()
            )));
        }

        let mut vertex = None;
        let mut fragment = None;
        for shader in shaders {
            let slot = match shader.stage() {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
                ShaderStage::Geometry => {
                    return Err(ShaderError::UnsupportedStage(ShaderStage::Geometry))
                }
            };
            if slot.is_some() {
                return Err(link_error(format!("more than one {} shader", shader.stage())));
            }
            *slot = Some(stage_of(shader)?);
        }
        let (Some((vertex, vs)), Some((fragment, fs))) = (vertex, fragment) else {
            return Err(link_error("a vertex and a fragment shader are required".to_owned()));
        };

        for input in &fs.inputs {
            if !vs.outputs.iter().any(|o| o.location == input.location) {
                return Err(link_error(format!(
                    "fragment input {} at location {} is not written by the vertex stage",
                    input.name, input.location
                )));
            }
        }

        let mut blocks: BTreeMap<u32, UniformBlockDecl> = BTreeMap::new();
        let mut textures: BTreeMap<u32, TextureSlot> = BTreeMap::new();
        let mut samplers: BTreeMap<u32, SamplerSlot> = BTreeMap::new();
        for iface in [&vs, &fs] {
            for block in &iface.uniforms {
                merge(&mut blocks, block.binding, block.clone(), "uniform block")?;
            }
            for tex in &iface.textures {
                merge(&mut textures, tex.binding, tex.clone(), "texture")?;
            }
            for sampler in &iface.samplers {
                merge(&mut samplers, sampler.binding, sampler.clone(), "sampler")?;
            }
        }
        for binding in blocks.keys() {
            if textures.contains_key(binding) || samplers.contains_key(binding) {
                return Err(link_error(format!("binding {binding} is used twice")));
            }
        }
        if let Some(binding) = textures.keys().find(|b| samplers.contains_key(*b)) {
            return Err(link_error(format!("binding {binding} is used twice")));
        }

        let outputs: FxHashMap<String, u32> = fs
            .outputs
            .iter()
            .map(|o| (o.name.clone(), o.location))
            .collect();
        for output in &fs.outputs {
            log::debug!("Output {}: {}", output.location, output.name);
        }

        let mut declared = Vec::new();
        let mut bindings = Vec::new();
        let mut block_len = 0_u32;
        for block in blocks.values() {
            let base = block_len.div_ceil(UNIFORM_REGION_ALIGN) * UNIFORM_REGION_ALIGN;
            bindings.push(UniformBinding {
                binding: block.binding,
                offset: base,
                size: block.size,
            });
            for member in &block.members {
                let location = declared.len() as u32;
                declared.push((
                    member.name.clone(),
                    UniformSlot {
                        location,
                        kind: member.kind,
                        offset: base + member.offset,
                    },
                ));
            }
            block_len = base + block.size;
        }

        log::debug!("Number of uniforms {}", declared.len());
        let mut uniforms = FxHashMap::default();
        for (name, slot) in &declared {
            log::debug!("Uniform added {} : {name}", slot.location);
            let _ = uniforms.insert(name.clone(), slot.location);
        }

        log::info!("Shader program linking OK.");
        Ok(Self {
            vertex,
            fragment,
            vertex_inputs: vs.inputs,
            declared,
            uniforms,
            outputs,
            textures: FxHashMap::default(),
            texture_slots: textures.into_values().collect(),
            samplers: samplers.into_values().collect(),
            bindings,
            block: vec![0; block_len as usize],
        })
    }

    // ── Uniforms ──

    fn slot(&self, name: &str) -> Option<UniformSlot> {
        let location = self.uniforms.get(name)?;
        self.declared.get(*location as usize).map(|(_, slot)| *slot)
    }

    fn write(&mut self, name: &str, value: &UniformValue) {
        let Some(slot) = self.slot(name) else {
            log::error!("Could not find uniform in shader program: {name}");
            return;
        };
        let start = slot.offset as usize;
        let end = start + slot.kind.size() as usize;
        let Some(dst) = self.block.get_mut(start..end) else {
            log::error!("uniform {name} lies outside the uniform block");
            return;
        };
        match uniform::write_value(value, slot.kind, dst) {
            Ok(written) => {
                let given = match value {
                    UniformValue::Vec2Array(v) => v.len(),
                    UniformValue::Vec3Array(v) => v.len(),
                    UniformValue::Vec4Array(v) => v.len(),
                    _ => 1,
                };
                if written < given {
                    log::warn!("uniform {name}: {given} elements truncated to {written}");
                }
            }
            Err(e) => log::error!("uniform {name}: {e}"),
        }
    }

    /// Set uniform `name`. Unknown names and type mismatches are logged
    /// and leave the block unchanged.
    pub fn update<V: Into<UniformValue>>(&mut self, name: &str, value: V) -> &mut Self {
        self.write(name, &value.into());
        self
    }

    /// Apply a parameter snapshot: every uniform, then every texture.
    pub fn apply(&mut self, params: &Parameters) {
        for (name, value) in params.uniforms() {
            self.write(name, value);
        }
        for (name, texture) in params.textures() {
            self.add_texture(name, *texture);
        }
    }

    /// Location of uniform `name`.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<u32> {
        let location = self.uniforms.get(name).copied();
        if location.is_none() {
            log::error!("Could not find uniform in shader program: {name}");
        }
        location
    }

    /// Re-register uniform `name` from the reflected declarations.
    pub fn add_uniform(&mut self, name: &str) -> Option<u32> {
        let Some((_, slot)) = self.declared.iter().find(|(n, _)| n == name) else {
            log::error!("Could not add uniform: {name} - not declared by the program");
            return None;
        };
        let location = slot.location;
        let _ = self.uniforms.insert(name.to_owned(), location);
        log::debug!("Uniform {name} bound to location: {location}");
        Some(location)
    }

    /// Current value at `location`, decoded from the uniform block.
    #[must_use]
    pub fn uniform_value(&self, location: u32) -> Option<UniformValue> {
        let (_, slot) = self.declared.get(location as usize)?;
        let start = slot.offset as usize;
        let end = start + slot.kind.size() as usize;
        uniform::read_value(slot.kind, self.block.get(start..end)?)
    }

    /// Current value of uniform `name` as `T`.
    #[must_use]
    pub fn read_uniform<T: UniformType>(&self, name: &str) -> Option<T> {
        let value = self.uniform_value(self.uniform(name)?)?;
        T::from_value(&value)
    }

    /// Declared type of uniform `name`.
    #[must_use]
    pub fn uniform_kind(&self, name: &str) -> Option<UniformKind> {
        self.slot(name).map(|s| s.kind)
    }

    /// Names of every active uniform.
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// The uniform block as uploaded for each draw.
    #[must_use]
    pub fn uniform_block(&self) -> &[u8] {
        &self.block
    }

    /// Block region of each uniform binding.
    #[must_use]
    pub fn uniform_bindings(&self) -> &[UniformBinding] {
        &self.bindings
    }

    // ── Outputs ──

    /// Attachment index of fragment output `name`.
    #[must_use]
    pub fn buffer(&self, name: &str) -> Option<u32> {
        let index = self.outputs.get(name).copied();
        if index.is_none() {
            log::error!("Could not find buffer in shader program: {name}");
        }
        index
    }

    /// Register output `name` at the next free index.
    pub fn add_buffer(&mut self, name: &str) -> u32 {
        let index = self.outputs.len() as u32;
        let _ = self.outputs.insert(name.to_owned(), index);
        log::debug!("ADD BUFFER: {name} {index}");
        index
    }

    /// Fragment output name → attachment index.
    #[must_use]
    pub fn outputs(&self) -> &FxHashMap<String, u32> {
        &self.outputs
    }

    // ── Textures ──

    /// Bind `texture` to the shader variable `name`.
    pub fn add_texture(&mut self, name: &str, texture: TextureHandle) {
        let _ = self.textures.insert(name.to_owned(), texture);
    }

    /// Texture bound to `name`.
    #[must_use]
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        let tex = self.textures.get(name).copied();
        if tex.is_none() {
            log::error!("Could not find texture in shader program: {name}");
        }
        tex
    }

    /// Texture variables declared by the program, in binding order.
    #[must_use]
    pub fn texture_slots(&self) -> &[TextureSlot] {
        &self.texture_slots
    }

    /// Sampler variables declared by the program, in binding order.
    #[must_use]
    pub fn sampler_slots(&self) -> &[SamplerSlot] {
        &self.samplers
    }

    /// Resolve every texture slot to its bound texture.
    ///
    /// # Errors
    ///
    /// The name of the first slot with no texture bound.
    pub fn texture_bindings(&self) -> Result<Vec<TextureBinding>, String> {
        self.texture_slots
            .iter()
            .map(|slot| {
                self.textures
                    .get(&slot.name)
                    .map(|&texture| TextureBinding {
                        binding: slot.binding,
                        texture,
                    })
                    .ok_or_else(|| slot.name.clone())
            })
            .collect()
    }

    // ── Stages ──

    /// Vertex stage.
    #[must_use]
    pub fn vertex_stage(&self) -> &CompiledStage {
        &self.vertex
    }

    /// Fragment stage.
    #[must_use]
    pub fn fragment_stage(&self) -> &CompiledStage {
        &self.fragment
    }

    /// Location inputs of the vertex stage.
    #[must_use]
    pub fn vertex_inputs(&self) -> &[Varying] {
        &self.vertex_inputs
    }
}

#[cfg(test)]
mod tests {
    use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

    use super::*;
    use crate::shader::uniform::ArrayElement;

    const VERTEX: &str = "
struct Uniforms {
    flag: i32,
    count: i32,
    gain: f32,
    dval: f32,
    iv2: vec2<i32>,
    iv3: vec3<i32>,
    iv4: vec4<i32>,
    v2: vec2<f32>,
    v3: vec3<f32>,
    v4: vec4<f32>,
    m2: mat2x2<f32>,
    m3: mat3x3<f32>,
    m4: mat4x4<f32>,
    points: array<vec4<f32>, 3>,
    normals: array<vec3<f32>, 2>,
    colors: array<vec4<f32>, 2>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) passNormal: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(2) normal: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.m4 * vec4<f32>(position, 1.0);
    out.passNormal = normal;
    return out;
}
";

    const FRAGMENT: &str = "
struct FragmentOut {
    @location(0) fragColor: vec4<f32>,
    @location(1) fragNormal: vec4<f32>,
}
@group(0) @binding(1) var colorMap: texture_2d<f32>;

@fragment
fn fs_main(@location(0) passNormal: vec3<f32>) -> FragmentOut {
    var out: FragmentOut;
    out.fragColor = textureLoad(colorMap, vec2<i32>(0), 0);
    out.fragNormal = vec4<f32>(passNormal, 0.0);
    return out;
}
";

    fn program() -> ShaderProgram {
        ShaderProgram::new(VERTEX, FRAGMENT).unwrap()
    }

    #[test]
    fn outputs_are_reflected_by_location() {
        let program = program();
        let expected: FxHashMap<String, u32> =
            [("fragColor".to_owned(), 0), ("fragNormal".to_owned(), 1)]
                .into_iter()
                .collect();
        assert_eq!(program.outputs(), &expected);
        assert_eq!(program.buffer("fragNormal"), Some(1));
        assert_eq!(program.buffer("fragDepth"), None);
    }

    #[test]
    fn update_then_read_back_per_type() {
        let mut program = program();
        let m2 = Mat2::from_cols_array(&[1.0, 2.0, 3.0, 4.0]);
        let m3 = Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let m4 = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));
        let points = vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Vec2::new(5.0, 6.0)];
        let normals = vec![Vec3::X, Vec3::Z];
        let colors = vec![Vec4::ONE, Vec4::W];

        let _ = program
            .update("flag", true)
            .update("count", 7_i32)
            .update("gain", 0.5_f32)
            .update("dval", 0.125_f64)
            .update("iv2", IVec2::new(1, -1))
            .update("iv3", IVec3::new(1, 2, 3))
            .update("iv4", IVec4::new(-4, 3, -2, 1))
            .update("v2", Vec2::new(0.25, 0.75))
            .update("v3", Vec3::new(1.0, 2.0, 3.0))
            .update("v4", Vec4::new(4.0, 3.0, 2.0, 1.0))
            .update("m2", m2)
            .update("m3", m3)
            .update("m4", m4)
            .update("points", points.as_slice())
            .update("normals", normals.as_slice())
            .update("colors", colors.clone());

        assert_eq!(program.read_uniform::<bool>("flag"), Some(true));
        assert_eq!(program.read_uniform::<i32>("count"), Some(7));
        assert_eq!(program.read_uniform::<f32>("gain"), Some(0.5));
        assert_eq!(program.read_uniform::<f64>("dval"), Some(0.125));
        assert_eq!(program.read_uniform::<IVec2>("iv2"), Some(IVec2::new(1, -1)));
        assert_eq!(program.read_uniform::<IVec3>("iv3"), Some(IVec3::new(1, 2, 3)));
        assert_eq!(
            program.read_uniform::<IVec4>("iv4"),
            Some(IVec4::new(-4, 3, -2, 1))
        );
        assert_eq!(program.read_uniform::<Vec2>("v2"), Some(Vec2::new(0.25, 0.75)));
        assert_eq!(program.read_uniform::<Vec3>("v3"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            program.read_uniform::<Vec4>("v4"),
            Some(Vec4::new(4.0, 3.0, 2.0, 1.0))
        );
        assert_eq!(program.read_uniform::<Mat2>("m2"), Some(m2));
        assert_eq!(program.read_uniform::<Mat3>("m3"), Some(m3));
        assert_eq!(program.read_uniform::<Mat4>("m4"), Some(m4));
        assert_eq!(program.read_uniform::<Vec<Vec2>>("points"), Some(points));
        assert_eq!(program.read_uniform::<Vec<Vec3>>("normals"), Some(normals));
        assert_eq!(program.read_uniform::<Vec<Vec4>>("colors"), Some(colors));
    }

    #[test]
    fn unknown_and_mismatched_updates_write_nothing() {
        let mut program = program();
        let before = program.uniform_block().to_vec();
        let _ = program
            .update("uDoesNotExist", 1.0_f32)
            .update("m4", Vec3::ONE);
        assert_eq!(program.uniform_block(), before.as_slice());
        assert_eq!(program.uniform("uDoesNotExist"), None);
    }

    #[test]
    fn long_arrays_are_truncated() {
        let mut program = program();
        let normals = [Vec3::X, Vec3::Y, Vec3::Z];
        let _ = program.update("normals", &normals[..]);
        assert_eq!(
            program.read_uniform::<Vec<Vec3>>("normals"),
            Some(vec![Vec3::X, Vec3::Y])
        );
        assert_eq!(
            program.uniform_kind("normals"),
            Some(UniformKind::array(ArrayElement::Vec3, 2))
        );
    }

    #[test]
    fn texture_bindings_need_every_slot() {
        let mut program = program();
        assert_eq!(program.texture_bindings(), Err("colorMap".to_owned()));
        let tex = TextureHandle::from_raw(5).unwrap();
        program.apply(&Parameters::new().with_texture("colorMap", tex).with("gain", 2.0_f32));
        assert_eq!(
            program.texture_bindings(),
            Ok(vec![TextureBinding {
                binding: 1,
                texture: tex
            }])
        );
        assert_eq!(program.read_uniform::<f32>("gain"), Some(2.0));
    }

    #[test]
    fn add_buffer_appends_and_add_uniform_checks_declarations() {
        let mut program = program();
        assert_eq!(program.add_buffer("fragPosition"), 2);
        assert_eq!(program.buffer("fragPosition"), Some(2));
        assert_eq!(program.add_uniform("gain"), program.uniform("gain"));
        assert_eq!(program.add_uniform("uUnknown"), None);
    }

    #[test]
    fn link_needs_two_stages() {
        let mut vertex = Shader::new(ShaderStage::Vertex);
        let _ = vertex.load_from_str(VERTEX);
        vertex.compile().unwrap();
        match ShaderProgram::link(&[vertex]) {
            Err(ShaderError::Link(msg)) => assert_eq!(msg, "need at least 2 shaders, got 1"),
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let fragment = "
@fragment
fn fs_main(@location(3) passUVW: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(passUVW, 1.0);
}
";
        assert!(matches!(
            ShaderProgram::new(VERTEX, fragment),
            Err(ShaderError::Link(_))
        ));
    }

    #[test]
    fn conflicting_uniform_declarations_fail_to_link() {
        let fragment = "
@group(0) @binding(0) var<uniform> gain: vec4<f32>;
@fragment
fn fs_main(@location(0) passNormal: vec3<f32>) -> @location(0) vec4<f32> {
    return gain * passNormal.x;
}
";
        assert!(matches!(
            ShaderProgram::new(VERTEX, fragment),
            Err(ShaderError::Link(_))
        ));
    }

    #[test]
    fn layout_is_checked() {
        let good = ProgramLayout::new()
            .with_output("fragColor", 0)
            .with_output("fragNormal", 1)
            .with_uniform("m4", UniformKind::Mat4);
        assert!(ShaderProgram::with_layout(VERTEX, FRAGMENT, &good).is_ok());

        let swapped = ProgramLayout::new()
            .with_output("fragColor", 1)
            .with_output("fragNormal", 0);
        assert!(matches!(
            ShaderProgram::with_layout(VERTEX, FRAGMENT, &swapped),
            Err(ShaderError::LayoutMismatch(_))
        ));

        let wrong_kind = good.with_uniform("gain", UniformKind::Vec4);
        assert!(matches!(
            ShaderProgram::with_layout(VERTEX, FRAGMENT, &wrong_kind),
            Err(ShaderError::LayoutMismatch(_))
        ));
    }

    #[test]
    fn geometry_programs_are_rejected() {
        assert!(matches!(
            ShaderProgram::with_geometry(VERTEX, FRAGMENT, VERTEX),
            Err(ShaderError::UnsupportedStage(ShaderStage::Geometry))
        ));
    }
}
