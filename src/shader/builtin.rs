//! The demo shaders, compiled into the crate.
//!
//! [`load_program`] prefers a file of the same name under the configured
//! shader root, so shaders can be edited without rebuilding; the embedded
//! copy is the fallback.

use std::path::Path;

use super::{ShaderError, ShaderProgram};

struct BuiltinSource {
    name: &'static str,
    source: &'static str,
}

const SOURCES: &[BuiltinSource] = &[
    BuiltinSource {
        name: "volume.vert.wgsl",
        source: include_str!("../../assets/shaders/volume.vert.wgsl"),
    },
    BuiltinSource {
        name: "uvw.frag.wgsl",
        source: include_str!("../../assets/shaders/uvw.frag.wgsl"),
    },
    BuiltinSource {
        name: "mip.frag.wgsl",
        source: include_str!("../../assets/shaders/mip.frag.wgsl"),
    },
    BuiltinSource {
        name: "gbuffer.vert.wgsl",
        source: include_str!("../../assets/shaders/gbuffer.vert.wgsl"),
    },
    BuiltinSource {
        name: "gbuffer.frag.wgsl",
        source: include_str!("../../assets/shaders/gbuffer.frag.wgsl"),
    },
    BuiltinSource {
        name: "peel.frag.wgsl",
        source: include_str!("../../assets/shaders/peel.frag.wgsl"),
    },
    BuiltinSource {
        name: "fullscreen.vert.wgsl",
        source: include_str!("../../assets/shaders/fullscreen.vert.wgsl"),
    },
    BuiltinSource {
        name: "composite.frag.wgsl",
        source: include_str!("../../assets/shaders/composite.frag.wgsl"),
    },
    BuiltinSource {
        name: "npr.frag.wgsl",
        source: include_str!("../../assets/shaders/npr.frag.wgsl"),
    },
    BuiltinSource {
        name: "ssr.frag.wgsl",
        source: include_str!("../../assets/shaders/ssr.frag.wgsl"),
    },
    BuiltinSource {
        name: "show_texture.frag.wgsl",
        source: include_str!("../../assets/shaders/show_texture.frag.wgsl"),
    },
];

/// Embedded source of the shader file `name`.
#[must_use]
pub fn source(name: &str) -> Option<&'static str> {
    SOURCES.iter().find(|s| s.name == name).map(|s| s.source)
}

/// Names of every embedded shader.
pub fn names() -> impl Iterator<Item = &'static str> {
    SOURCES.iter().map(|s| s.name)
}

fn read_source(root: &Path, name: &str) -> Result<String, ShaderError> {
    let path = root.join(name);
    if path.is_file() {
        log::debug!("shader {name} read from {}", path.display());
        return std::fs::read_to_string(&path).map_err(|source| {
            log::error!("Failed to open file: {}", path.display());
            ShaderError::Io { path, source }
        });
    }
    source(name).map(str::to_owned).ok_or_else(|| {
        log::error!("Failed to open file: {}", path.display());
        ShaderError::Io {
            path,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    })
}

/// Compile and link `vertex` + `fragment`, reading each from `root` when
/// the file exists and from the embedded copy otherwise.
///
/// # Errors
///
/// [`ShaderError::Io`] for a name that is neither on disk nor embedded,
/// otherwise as [`ShaderProgram::new`].
pub fn load_program(root: &Path, vertex: &str, fragment: &str) -> Result<ShaderProgram, ShaderError> {
    let vertex_src = read_source(root, vertex)?;
    let fragment_src = read_source(root, fragment)?;
    log::info!("Linking {vertex} + {fragment}");
    ShaderProgram::new(&vertex_src, &fragment_src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::reflect::SampleKind;

    const NO_ROOT: &str = "/nonexistent-shader-root";

    fn link(vertex: &str, fragment: &str) -> ShaderProgram {
        load_program(Path::new(NO_ROOT), vertex, fragment)
            .unwrap_or_else(|e| panic!("{vertex} + {fragment}: {e}"))
    }

    #[test]
    fn every_demo_program_links() {
        for (vertex, fragment) in [
            ("volume.vert.wgsl", "uvw.frag.wgsl"),
            ("volume.vert.wgsl", "mip.frag.wgsl"),
            ("gbuffer.vert.wgsl", "gbuffer.frag.wgsl"),
            ("gbuffer.vert.wgsl", "peel.frag.wgsl"),
            ("fullscreen.vert.wgsl", "composite.frag.wgsl"),
            ("fullscreen.vert.wgsl", "npr.frag.wgsl"),
            ("fullscreen.vert.wgsl", "ssr.frag.wgsl"),
            ("fullscreen.vert.wgsl", "show_texture.frag.wgsl"),
        ] {
            let _ = link(vertex, fragment);
        }
    }

    #[test]
    fn uvw_program_writes_back_then_front() {
        let program = link("volume.vert.wgsl", "uvw.frag.wgsl");
        assert_eq!(program.outputs().get("fragUVRCoordBack"), Some(&0));
        assert_eq!(program.outputs().get("fragUVRCoordFront"), Some(&1));
        assert!(program.uniform("model").is_some());
    }

    #[test]
    fn mip_program_exposes_its_parameters() {
        let program = link("volume.vert.wgsl", "mip.frag.wgsl");
        for name in ["uMinVal", "uStepSize", "uThresholdLMIP", "uMinValThreshold"] {
            assert!(program.uniform(name).is_some(), "{name}");
        }
        let volume = program
            .texture_slots()
            .iter()
            .find(|s| s.name == "volume_texture")
            .unwrap();
        assert_eq!(volume.sample, SampleKind::Sint);
    }

    #[test]
    fn peel_program_reads_a_depth_texture() {
        let program = link("gbuffer.vert.wgsl", "peel.frag.wgsl");
        assert_eq!(program.outputs().len(), 4);
        let slot = program.texture_slots().first().unwrap();
        assert_eq!(slot.name, "lastDepth");
        assert_eq!(slot.sample, SampleKind::Depth);
    }

    #[test]
    fn files_under_the_root_win() {
        let dir = std::env::temp_dir().join(format!("volren-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("show_texture.frag.wgsl"),
            "@fragment\nfn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }\n",
        )
        .unwrap();

        let program = load_program(&dir, "fullscreen.vert.wgsl", "show_texture.frag.wgsl").unwrap();
        assert!(program.texture_slots().is_empty());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unknown_names_are_io_errors() {
        let err = load_program(Path::new(NO_ROOT), "missing.vert.wgsl", "uvw.frag.wgsl").unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
        assert_eq!(names().count(), SOURCES.len());
    }
}
