//! Interface reflection over validated naga modules.
//!
//! Everything a program needs to know about a stage is read from the IR:
//! stage inputs and outputs by location, `var<uniform>` members with their
//! typed kinds and byte offsets, and texture / sampler bindings.

use naga::{
    AddressSpace, ArraySize, Binding, ImageClass, ImageDimension, Module, ScalarKind, TypeInner,
    VectorSize,
};

use super::uniform::{ArrayElement, UniformKind};

/// A location-bound stage input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    /// `@location` index.
    pub location: u32,
    /// Member or argument name; `location<n>` when unnamed.
    pub name: String,
    /// Number of scalar components (1 to 4).
    pub components: u32,
}

/// A member of a uniform block (or a non-struct uniform variable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    /// Member name.
    pub name: String,
    /// Declared type.
    pub kind: UniformKind,
    /// Byte offset inside the block.
    pub offset: u32,
}

/// One `var<uniform>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockDecl {
    /// `@binding` index in group 0.
    pub binding: u32,
    /// Size of the bound type in bytes.
    pub size: u32,
    /// Members in declaration order.
    pub members: Vec<UniformMember>,
}

/// Texel type a texture binding samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// `texture_*<f32>`.
    Float,
    /// `texture_*<i32>`.
    Sint,
    /// `texture_*<u32>`.
    Uint,
    /// `texture_depth_*`.
    Depth,
}

/// Dimension of a texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// 2D texture.
    D2,
    /// 3D texture.
    D3,
}

/// A texture variable and its binding slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    /// Shader variable name.
    pub name: String,
    /// `@binding` index in group 0.
    pub binding: u32,
    /// Dimension.
    pub dimension: TextureDimension,
    /// Texel type.
    pub sample: SampleKind,
}

/// A sampler variable and its binding slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSlot {
    /// Shader variable name.
    pub name: String,
    /// `@binding` index in group 0.
    pub binding: u32,
    /// `sampler_comparison`.
    pub comparison: bool,
}

/// Reflected interface of one entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageInterface {
    /// Entry point name.
    pub entry_point: String,
    /// Location inputs in location order.
    pub inputs: Vec<Varying>,
    /// Location outputs in location order.
    pub outputs: Vec<Varying>,
    /// Uniform blocks in binding order.
    pub uniforms: Vec<UniformBlockDecl>,
    /// Texture bindings in binding order.
    pub textures: Vec<TextureSlot>,
    /// Sampler bindings in binding order.
    pub samplers: Vec<SamplerSlot>,
}

fn components(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(_) => Some(1),
        TypeInner::Vector { size, .. } => Some(vector_len(*size)),
        _ => None,
    }
}

fn vector_len(size: VectorSize) -> u32 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

/// Map a naga type onto a [`UniformKind`], if it is one we can write.
fn uniform_kind(module: &Module, inner: &TypeInner) -> Option<UniformKind> {
    match inner {
        TypeInner::Scalar(s) if s.width == 4 => match s.kind {
            ScalarKind::Sint => Some(UniformKind::Int),
            ScalarKind::Uint => Some(UniformKind::UInt),
            ScalarKind::Float => Some(UniformKind::Float),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.width == 4 => {
            match (scalar.kind, vector_len(*size)) {
                (ScalarKind::Sint, 2) => Some(UniformKind::IVec2),
                (ScalarKind::Sint, 3) => Some(UniformKind::IVec3),
                (ScalarKind::Sint, 4) => Some(UniformKind::IVec4),
                (ScalarKind::Float, 2) => Some(UniformKind::Vec2),
                (ScalarKind::Float, 3) => Some(UniformKind::Vec3),
                (ScalarKind::Float, 4) => Some(UniformKind::Vec4),
                _ => None,
            }
        }
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } if columns == rows && scalar.kind == ScalarKind::Float => {
            match vector_len(*columns) {
                2 => Some(UniformKind::Mat2),
                3 => Some(UniformKind::Mat3),
                _ => Some(UniformKind::Mat4),
            }
        }
        TypeInner::Array { base, size, stride } => {
            let ArraySize::Constant(len) = size else {
                return None;
            };
            let element = match uniform_kind(module, &module.types[*base].inner)? {
                UniformKind::Vec2 => ArrayElement::Vec2,
                UniformKind::Vec3 => ArrayElement::Vec3,
                UniformKind::Vec4 => ArrayElement::Vec4,
                _ => return None,
            };
            Some(UniformKind::Array {
                element,
                len: len.get(),
                stride: *stride,
            })
        }
        _ => None,
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

fn uniform_block(
    module: &Module,
    var_name: &str,
    binding: u32,
    ty: naga::Handle<naga::Type>,
) -> UniformBlockDecl {
    let inner = &module.types[ty].inner;
    let mut members = Vec::new();
    let size = if let TypeInner::Struct { members: fields, span } = inner {
        for field in fields {
            let name = field.name.clone().unwrap_or_default();
            match uniform_kind(module, &module.types[field.ty].inner) {
                Some(kind) => members.push(UniformMember {
                    name,
                    kind,
                    offset: field.offset,
                }),
                None => log::warn!("uniform {var_name}.{name} has an unsupported type, skipped"),
            }
        }
        *span
    } else if let Some(kind) = uniform_kind(module, inner) {
        members.push(UniformMember {
            name: var_name.to_owned(),
            kind,
            offset: 0,
        });
        kind.size()
    } else {
        log::warn!("uniform {var_name} has an unsupported type, skipped");
        0
    };
    UniformBlockDecl {
        binding,
        size: round_up(size, 16),
        members,
    }
}

/// Collect the location-bound members of an entry point argument or result.
fn push_varyings(
    module: &Module,
    name: Option<&str>,
    binding: Option<&Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<Varying>,
) {
    let inner = &module.types[ty].inner;
    if let Some(Binding::Location { location, .. }) = binding {
        out.push(Varying {
            location: *location,
            name: name.map_or_else(|| format!("location{location}"), str::to_owned),
            components: components(inner).unwrap_or(4),
        });
        return;
    }
    if let TypeInner::Struct { members, .. } = inner {
        for member in members {
            push_varyings(
                module,
                member.name.as_deref(),
                member.binding.as_ref(),
                member.ty,
                out,
            );
        }
    }
}

/// Reflect the interface of the module's entry point for `stage`.
///
/// # Errors
///
/// Returns a message if the module has no such entry point or binds a
/// resource outside group 0.
pub fn reflect(module: &Module, stage: naga::ShaderStage) -> Result<StageInterface, String> {
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .ok_or_else(|| format!("no {stage:?} entry point"))?;

    let mut interface = StageInterface {
        entry_point: entry.name.clone(),
        ..StageInterface::default()
    };

    for arg in &entry.function.arguments {
        push_varyings(
            module,
            arg.name.as_deref(),
            arg.binding.as_ref(),
            arg.ty,
            &mut interface.inputs,
        );
    }
    if let Some(result) = &entry.function.result {
        push_varyings(
            module,
            None,
            result.binding.as_ref(),
            result.ty,
            &mut interface.outputs,
        );
    }

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else {
            continue;
        };
        let name = var.name.clone().unwrap_or_default();
        if binding.group != 0 {
            return Err(format!("{name} is bound to group {}, only group 0 is used", binding.group));
        }
        match (var.space, &module.types[var.ty].inner) {
            (AddressSpace::Uniform, _) => {
                interface
                    .uniforms
                    .push(uniform_block(module, &name, binding.binding, var.ty));
            }
            (AddressSpace::Handle, TypeInner::Image { dim, arrayed, class }) => {
                let dimension = match (dim, arrayed) {
                    (ImageDimension::D2, false) => TextureDimension::D2,
                    (ImageDimension::D3, false) => TextureDimension::D3,
                    _ => return Err(format!("texture {name} has an unsupported dimension")),
                };
                let sample = match class {
                    ImageClass::Depth { .. } => SampleKind::Depth,
                    ImageClass::Sampled { kind, .. } => match kind {
                        ScalarKind::Sint => SampleKind::Sint,
                        ScalarKind::Uint => SampleKind::Uint,
                        _ => SampleKind::Float,
                    },
                    _ => return Err(format!("texture {name} is not a sampled texture")),
                };
                interface.textures.push(TextureSlot {
                    name,
                    binding: binding.binding,
                    dimension,
                    sample,
                });
            }
            (AddressSpace::Handle, TypeInner::Sampler { comparison }) => {
                interface.samplers.push(SamplerSlot {
                    name,
                    binding: binding.binding,
                    comparison: *comparison,
                });
            }
            _ => return Err(format!("{name} uses an unsupported resource type")),
        }
    }

    interface.inputs.sort_by_key(|v| v.location);
    interface.outputs.sort_by_key(|v| v.location);
    interface.uniforms.sort_by_key(|u| u.binding);
    interface.textures.sort_by_key(|t| t.binding);
    interface.samplers.sort_by_key(|s| s.binding);
    Ok(interface)
}
