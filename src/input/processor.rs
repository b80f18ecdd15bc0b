//! Converts raw platform events into demo commands.
//!
//! The `InputProcessor` owns all transient input state (cursor position,
//! drag state) and the key-binding map. It is the only thing that sits
//! between raw window events and the demo controls.

use glam::Vec2;

use super::event::{InputEvent, MouseButton};
use super::keyboard::KeyAction;
use crate::options::KeybindingOptions;

/// What an input event asks the demo controls to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputCommand {
    /// The primary button went down (`true`) or up (`false`).
    SetDragActive(bool),
    /// The cursor moved by `delta` pixels while dragging.
    Drag {
        /// Cursor movement since the previous event.
        delta: Vec2,
    },
    /// A bound key was pressed.
    Action(KeyAction),
}

/// Converts raw window events into [`InputCommand`]s.
#[derive(Debug, Clone)]
pub struct InputProcessor {
    /// Last cursor position; `None` until the first move.
    mouse_pos: Option<Vec2>,
    /// Whether the primary mouse button is currently held.
    mouse_pressed: bool,
    /// Key string → action mapping.
    key_bindings: KeybindingOptions,
}

impl InputProcessor {
    /// Create a new processor with default key bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_key_bindings(KeybindingOptions::default())
    }

    /// Create a processor with custom key bindings.
    #[must_use]
    pub fn with_key_bindings(key_bindings: KeybindingOptions) -> Self {
        Self {
            mouse_pos: None,
            mouse_pressed: false,
            key_bindings,
        }
    }

    /// Whether the primary mouse button is pressed.
    #[must_use]
    pub fn mouse_pressed(&self) -> bool {
        self.mouse_pressed
    }

    /// Look up a key press (`winit::keyboard::KeyCode` debug string, e.g.
    /// `"KeyW"`) and return the bound action, if any.
    #[must_use]
    pub fn handle_key_press(&self, key: &str) -> Option<InputCommand> {
        self.key_bindings.lookup(key).map(InputCommand::Action)
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<InputCommand> {
        match event {
            InputEvent::CursorMoved(pos) => {
                let delta = self.mouse_pos.map_or(Vec2::ZERO, |last| pos - last);
                self.mouse_pos = Some(pos);
                (self.mouse_pressed && delta != Vec2::ZERO)
                    .then_some(InputCommand::Drag { delta })
            }
            InputEvent::MouseButton {
                button: MouseButton::Primary,
                pressed,
            } => {
                self.mouse_pressed = pressed;
                Some(InputCommand::SetDragActive(pressed))
            }
            InputEvent::MouseButton { .. } => None,
            InputEvent::KeyPressed(key) => self.handle_key_press(&key),
        }
    }
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_deltas_only_while_pressed() {
        let mut input = InputProcessor::new();
        assert_eq!(input.handle_event(InputEvent::CursorMoved(Vec2::new(10.0, 10.0))), None);
        assert_eq!(
            input.handle_event(InputEvent::MouseButton {
                button: MouseButton::Primary,
                pressed: true,
            }),
            Some(InputCommand::SetDragActive(true))
        );
        assert_eq!(
            input.handle_event(InputEvent::CursorMoved(Vec2::new(13.0, 8.0))),
            Some(InputCommand::Drag {
                delta: Vec2::new(3.0, -2.0)
            })
        );
        let _ = input.handle_event(InputEvent::MouseButton {
            button: MouseButton::Primary,
            pressed: false,
        });
        assert!(!input.mouse_pressed());
        assert_eq!(input.handle_event(InputEvent::CursorMoved(Vec2::new(20.0, 8.0))), None);
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut input = InputProcessor::new();
        let cmd = input.handle_event(InputEvent::MouseButton {
            button: MouseButton::Other,
            pressed: true,
        });
        assert_eq!(cmd, None);
        assert!(!input.mouse_pressed());
    }

    #[test]
    fn bound_keys_map_to_actions() {
        let input = InputProcessor::default();
        assert_eq!(
            input.handle_key_press("KeyA"),
            Some(InputCommand::Action(KeyAction::MoveLeft))
        );
        assert_eq!(input.handle_key_press("KeyQ"), None);
    }

    #[test]
    fn key_events_go_through_bindings() {
        let mut input = InputProcessor::default();
        assert_eq!(
            input.handle_event(InputEvent::KeyPressed("KeyR".to_owned())),
            Some(InputCommand::Action(KeyAction::ToggleAutoRotate))
        );
        assert_eq!(input.handle_event(InputEvent::KeyPressed("Space".to_owned())), None);
    }
}
