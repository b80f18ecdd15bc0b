use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Depth Peeling", inline)]
#[serde(default)]
/// Depth peeling demo parameters.
pub struct PeelingOptions {
    /// Number of depth layers peeled per frame.
    #[schemars(title = "Layers", range(min = 1, max = 8))]
    pub layers: u32,
    /// Layer shown on top of the composited G-Buffer.
    #[schemars(title = "Shown Layer", range(min = 0, max = 7))]
    pub show_layer: u32,
    /// Number of nested boxes.
    #[schemars(skip)]
    pub objects: u32,
    /// Base color of the boxes.
    #[schemars(title = "Color")]
    pub color: [f32; 4],
    /// Light position in world space.
    #[schemars(skip)]
    pub light_pos: [f32; 4],
    /// Shading strength of the compositing pass.
    #[schemars(title = "Strength", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub strength: f32,
}

impl Default for PeelingOptions {
    fn default() -> Self {
        Self {
            layers: 3,
            show_layer: 1,
            objects: 4,
            color: [0.45, 0.44, 0.87, 1.0],
            light_pos: [2.0, 2.0, 2.0, 1.0],
            strength: 0.05,
        }
    }
}
