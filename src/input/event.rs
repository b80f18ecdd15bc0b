use glam::Vec2;

/// A window event reduced to what the demo controls react to.
///
/// The viewer translates winit events into these; tests build them
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The cursor is now at this window position, in physical pixels.
    CursorMoved(Vec2),
    /// A mouse button changed state.
    MouseButton {
        /// The button.
        button: MouseButton,
        /// Down (`true`) or up (`false`).
        pressed: bool,
    },
    /// A key went down. Named by its physical key code, e.g. `"KeyW"`.
    KeyPressed(String),
}

/// The turntable only follows the primary button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button, or the primary button of a pointer device.
    Primary,
    /// Any other button.
    Other,
}

#[cfg(feature = "viewer")]
impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        if button == winit::event::MouseButton::Left {
            Self::Primary
        } else {
            Self::Other
        }
    }
}

#[cfg(feature = "viewer")]
impl InputEvent {
    /// Key event for a winit physical key code.
    #[must_use]
    pub fn key(code: winit::keyboard::KeyCode) -> Self {
        Self::KeyPressed(format!("{code:?}"))
    }
}
