use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Turntable and keyboard navigation parameters.
pub struct CameraOptions {
    /// Turntable radians per pixel of drag.
    #[schemars(title = "Drag Sensitivity", range(min = 0.001, max = 0.05), extend("step" = 0.001))]
    pub sensitivity: f32,
    /// Distance the eye moves per key press.
    #[schemars(title = "Move Step", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub move_step: f32,
    /// Spin the model around +Y at one radian per second.
    #[schemars(title = "Auto Rotate")]
    pub auto_rotate: bool,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            sensitivity: 0.01,
            move_step: 0.1,
            auto_rotate: false,
        }
    }
}
