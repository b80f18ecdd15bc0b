use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Paths", inline)]
#[serde(default)]
/// Where shader sources and volume data are read from.
pub struct PathOptions {
    /// Root for WGSL sources. Files found here override the shaders built
    /// into the binary.
    pub shaders: PathBuf,
    /// Root for raw volumes and textures.
    pub resources: PathBuf,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            shaders: PathBuf::from("assets/shaders"),
            resources: PathBuf::from("assets/volumes"),
        }
    }
}
