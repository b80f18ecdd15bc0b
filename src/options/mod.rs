//! Demo configuration with TOML preset support.
//!
//! Every tweakable setting (paths, window, camera, per-demo parameters,
//! keybindings) is consolidated here. Options serialize to/from TOML, so a
//! preset file only needs the values it overrides.

mod camera;
mod keybindings;
mod mip;
mod paths;
mod peeling;
mod ssr;
mod window;

use std::path::Path;

pub use camera::CameraOptions;
pub use keybindings::KeybindingOptions;
pub use mip::{Dataset, MipOptions};
pub use paths::PathOptions;
pub use peeling::PeelingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use ssr::SsrOptions;
pub use window::WindowOptions;

use crate::error::VolrenError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[mip]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// Shader and resource roots.
    #[schemars(skip)]
    pub paths: PathOptions,
    /// Window size and frame pacing.
    pub window: WindowOptions,
    /// Turntable and navigation parameters.
    pub camera: CameraOptions,
    /// Maximum intensity projection demo.
    pub mip: MipOptions,
    /// Screen-space reflection demo.
    pub ssr: SsrOptions,
    /// Depth peeling demo.
    pub peeling: PeelingOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Generate JSON Schema describing the tweakable options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VolrenError::Io`] if the file cannot be read and
    /// [`VolrenError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, VolrenError> {
        let content = std::fs::read_to_string(path).map_err(VolrenError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`VolrenError::OptionsParse`] on malformed input.
    pub fn from_toml(content: &str) -> Result<Self, VolrenError> {
        let mut options: Self =
            toml::from_str(content).map_err(|e| VolrenError::OptionsParse(e.to_string()))?;
        options.keybindings.reindex();
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`VolrenError::OptionsParse`] if serialization fails and
    /// [`VolrenError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), VolrenError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| VolrenError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(VolrenError::Io)?;
        }
        std::fs::write(path, content).map_err(VolrenError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
