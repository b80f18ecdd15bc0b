//! WGSL shader stages and linked programs.
//!
//! [`Shader`] compiles one stage through naga. [`ShaderProgram`] links a
//! vertex and a fragment stage, reflects their interface from the IR
//! (fragment outputs, typed uniforms with byte offsets, texture and sampler
//! bindings) and keeps a CPU-side uniform block that every draw snapshots.

/// Demo shaders compiled into the crate.
pub mod builtin;
/// Explicit program interface declarations.
pub mod layout;
/// Linked programs.
pub mod program;
/// naga IR reflection.
pub mod reflect;
/// Single shader stages.
pub mod stage;
/// Typed uniform values and parameter snapshots.
pub mod uniform;

pub use layout::ProgramLayout;
pub use program::{CompiledStage, ShaderProgram, UniformBinding, UniformSlot};
pub use stage::{Shader, ShaderError, ShaderStage};
pub use uniform::{ArrayElement, Parameters, UniformKind, UniformType, UniformValue};
