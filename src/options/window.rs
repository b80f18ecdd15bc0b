use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
#[schemars(title = "Window", inline)]
#[serde(default)]
/// Window size and frame pacing. Unset sizes fall back to each demo's
/// own default.
pub struct WindowOptions {
    /// Inner width in physical pixels.
    pub width: Option<u32>,
    /// Inner height in physical pixels.
    pub height: Option<u32>,
    /// Frame cap (0 = unlimited).
    #[schemars(title = "Target FPS", range(min = 0, max = 240))]
    pub target_fps: u32,
}

impl WindowOptions {
    /// Configured size, or `default` for any unset dimension.
    #[must_use]
    pub fn size_or(&self, default: (u32, u32)) -> (u32, u32) {
        (
            self.width.unwrap_or(default.0),
            self.height.unwrap_or(default.1),
        )
    }
}
