use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Reflections", inline)]
#[serde(default)]
/// Screen-space reflection demo parameters.
pub struct SsrOptions {
    /// Base color of the scene objects.
    #[schemars(title = "Color")]
    pub color: [f32; 4],
    /// Light position in world space.
    #[schemars(skip)]
    pub light_pos: [f32; 4],
    /// Reflection strength.
    #[schemars(title = "Strength", range(min = 0.0, max = 2.0), extend("step" = 0.01))]
    pub strength: f32,
    /// Billboard image, relative to the resource root.
    #[schemars(skip)]
    pub billboard_texture: PathBuf,
}

impl Default for SsrOptions {
    fn default() -> Self {
        Self {
            color: [0.45 * 0.3, 0.44 * 0.3, 0.87 * 0.3, 1.0],
            light_pos: [2.0, 2.0, 2.0, 1.0],
            strength: 0.5,
            billboard_texture: PathBuf::from("neon_sign.png"),
        }
    }
}
