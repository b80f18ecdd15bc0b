//! Single shader stages: source loading and WGSL compilation through naga.

use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage a [`Shader`] is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Geometry stage. Accepted as a value, rejected by [`Shader::compile`].
    Geometry,
}

impl ShaderStage {
    /// Name used in log lines ("Vertex", "Fragment", "Geometry").
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "Vertex",
            Self::Fragment => "Fragment",
            Self::Geometry => "Geometry",
        }
    }

    fn naga(self) -> Option<naga::ShaderStage> {
        match self {
            Self::Vertex => Some(naga::ShaderStage::Vertex),
            Self::Fragment => Some(naga::ShaderStage::Fragment),
            Self::Geometry => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shader compilation, linking and layout errors.
#[derive(Debug)]
pub enum ShaderError {
    /// The stage's source failed to parse or validate.
    Compile {
        /// Stage being compiled.
        stage: ShaderStage,
        /// Compiler diagnostic.
        message: String,
    },
    /// The stage has no WGSL counterpart.
    UnsupportedStage(ShaderStage),
    /// The stages do not form a valid program.
    Link(String),
    /// The program disagrees with an explicit [`ProgramLayout`](super::ProgramLayout).
    LayoutMismatch(String),
    /// A source file could not be read.
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { stage, message } => {
                write!(f, "{stage} shader compilation failed: {message}")
            }
            Self::UnsupportedStage(stage) => {
                write!(f, "{stage} shaders are not supported by WGSL")
            }
            Self::Link(msg) => write!(f, "shader program linking failed: {msg}"),
            Self::LayoutMismatch(msg) => write!(f, "shader layout mismatch: {msg}"),
            Self::Io { path, source } => {
                write!(f, "failed to open file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One shader stage: its source and, once compiled, the validated naga module.
#[derive(Debug, Clone)]
pub struct Shader {
    stage: ShaderStage,
    source: String,
    module: Option<naga::Module>,
}

impl Shader {
    /// Empty shader for `stage`.
    #[must_use]
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            source: String::new(),
            module: None,
        }
    }

    /// Stage this shader is compiled for.
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Current source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the source. Any previous compilation result is dropped.
    pub fn load_from_str(&mut self, source: &str) -> &mut Self {
        source.clone_into(&mut self.source);
        self.module = None;
        self
    }

    /// Read the source from `path`.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Io`] if the file cannot be read.
    pub fn load_from_file(&mut self, path: &Path) -> Result<&mut Self, ShaderError> {
        let source = std::fs::read_to_string(path).map_err(|source| {
            log::error!("Failed to open file: {}", path.display());
            ShaderError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.source = source;
        self.module = None;
        Ok(self)
    }

    /// Parse and validate the source.
    ///
    /// The module must contain an entry point for this shader's stage.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Compile`] with the compiler's diagnostic, or
    /// [`ShaderError::UnsupportedStage`] for geometry shaders.
    pub fn compile(&mut self) -> Result<(), ShaderError> {
        let Some(naga_stage) = self.stage.naga() else {
            log::error!("{} shader compilation failed: unsupported stage", self.stage);
            return Err(ShaderError::UnsupportedStage(self.stage));
        };
        let fail = |message: String| {
            log::error!("{} shader compilation failed: {message}", self.stage);
            ShaderError::Compile {
                stage: self.stage,
                message,
            }
        };

        let module = naga::front::wgsl::parse_str(&self.source)
            .map_err(|e| fail(e.emit_to_string(&self.source)))?;
        let _info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(&self.source)))?;
        if !module.entry_points.iter().any(|ep| ep.stage == naga_stage) {
            return Err(fail(format!("no @{} entry point", self.stage.label().to_lowercase())));
        }

        log::info!("{} shader compilation OK", self.stage);
        self.module = Some(module);
        Ok(())
    }

    /// The validated module, once [`compile`](Self::compile) succeeded.
    #[must_use]
    pub fn module(&self) -> Option<&naga::Module> {
        self.module.as_ref()
    }

    /// Name of the module's entry point for this stage.
    #[must_use]
    pub fn entry_point(&self) -> Option<&str> {
        let stage = self.stage.naga()?;
        self.module
            .as_ref()?
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage)
            .map(|ep| ep.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSTHROUGH: &str = "
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
";

    #[test]
    fn compiles_valid_vertex_stage() {
        let mut shader = Shader::new(ShaderStage::Vertex);
        let _ = shader.load_from_str(PASSTHROUGH);
        assert!(shader.compile().is_ok());
        assert!(shader.module().is_some());
        assert_eq!(shader.entry_point(), Some("vs_main"));
    }

    #[test]
    fn syntax_error_carries_diagnostic() {
        let mut shader = Shader::new(ShaderStage::Fragment);
        let _ = shader.load_from_str("@fragment fn fs_main( -> {");
        match shader.compile() {
            Err(ShaderError::Compile { stage, message }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!message.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert!(shader.module().is_none());
    }

    #[test]
    fn reserved_word_member_is_rejected() {
        let mut shader = Shader::new(ShaderStage::Vertex);
        let _ = shader.load_from_str(&format!(
            "struct U {{ precise: f32, }}\n@group(0) @binding(0) var<uniform> u: U;\n{PASSTHROUGH}"
        ));
        match shader.compile() {
            Err(ShaderError::Compile { message, .. }) => assert!(message.contains("precise")),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn missing_entry_point_for_stage_fails() {
        let mut shader = Shader::new(ShaderStage::Fragment);
        let _ = shader.load_from_str(PASSTHROUGH);
        assert!(matches!(shader.compile(), Err(ShaderError::Compile { .. })));
    }

    #[test]
    fn geometry_stage_is_unsupported() {
        let mut shader = Shader::new(ShaderStage::Geometry);
        let _ = shader.load_from_str(PASSTHROUGH);
        assert!(matches!(
            shader.compile(),
            Err(ShaderError::UnsupportedStage(ShaderStage::Geometry))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut shader = Shader::new(ShaderStage::Vertex);
        let result = shader.load_from_file(Path::new("/nonexistent/volume.vert.wgsl"));
        assert!(matches!(result, Err(ShaderError::Io { .. })));
    }
}
