//! Explicit program interface declarations.

use super::uniform::UniformKind;

/// The outputs and uniforms a caller expects a program to expose.
///
/// Passed to [`ShaderProgram::with_layout`](super::ShaderProgram::with_layout)
/// to pin the interface instead of trusting reflection alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    outputs: Vec<(String, u32)>,
    uniforms: Vec<(String, UniformKind)>,
}

impl ProgramLayout {
    /// Empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare fragment output `name` at attachment `index`.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, index: u32) -> Self {
        self.outputs.push((name.into(), index));
        self
    }

    /// Declare uniform `name` of type `kind`.
    #[must_use]
    pub fn with_uniform(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        self.uniforms.push((name.into(), kind));
        self
    }

    /// Declared outputs.
    #[must_use]
    pub fn outputs(&self) -> &[(String, u32)] {
        &self.outputs
    }

    /// Declared uniforms.
    #[must_use]
    pub fn uniforms(&self) -> &[(String, UniformKind)] {
        &self.uniforms
    }
}
