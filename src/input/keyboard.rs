use serde::{Deserialize, Serialize};

/// Demo actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML presets stay readable:
/// ```toml
/// [keybindings.bindings]
/// move_forward = "KeyW"
/// toggle_auto_rotate = "KeyR"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Move eye and center forward along the view direction.
    MoveForward,
    /// Move eye and center to the left.
    MoveLeft,
    /// Move eye and center backward.
    MoveBack,
    /// Move eye and center to the right.
    MoveRight,
    /// Start or stop spinning the model.
    ToggleAutoRotate,
    /// Drop the accumulated turntable rotation.
    ResetRotation,
}
