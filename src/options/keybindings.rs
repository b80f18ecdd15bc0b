use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::input::KeyAction;

const DEFAULT_BINDINGS: [(KeyAction, &str); 6] = [
    (KeyAction::MoveForward, "KeyW"),
    (KeyAction::MoveLeft, "KeyA"),
    (KeyAction::MoveBack, "KeyS"),
    (KeyAction::MoveRight, "KeyD"),
    (KeyAction::ToggleAutoRotate, "KeyR"),
    (KeyAction::ResetRotation, "Backquote"),
];

/// Which physical key triggers each [`KeyAction`].
///
/// Keys are winit `KeyCode` names (`"KeyW"`, `"ArrowUp"`). A preset that
/// lists any binding replaces the whole table, so unlisted actions are
/// unbound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeybindingOptions {
    /// Action to key name.
    pub bindings: BTreeMap<KeyAction, String>,
    /// Key name to action, derived from `bindings`.
    #[serde(skip)]
    by_key: HashMap<String, KeyAction>,
}

impl Default for KeybindingOptions {
    fn default() -> Self {
        let mut options = Self {
            bindings: DEFAULT_BINDINGS
                .iter()
                .map(|&(action, key)| (action, key.to_owned()))
                .collect(),
            by_key: HashMap::new(),
        };
        options.reindex();
        options
    }
}

impl KeybindingOptions {
    /// Rebuild the key lookup after `bindings` changed. When two actions
    /// share a key the first action in declaration order wins.
    pub fn reindex(&mut self) {
        self.by_key.clear();
        for (action, key) in &self.bindings {
            if let Some(taken) = self.by_key.get(key) {
                log::warn!("key {key} bound to both {taken:?} and {action:?}; keeping {taken:?}");
                continue;
            }
            let _ = self.by_key.insert(key.clone(), *action);
        }
    }

    /// Bind `action` to `key`, replacing its previous key.
    pub fn bind(&mut self, action: KeyAction, key: impl Into<String>) {
        let _ = self.bindings.insert(action, key.into());
        self.reindex();
    }

    /// The action `key` triggers.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.by_key.get(key).copied()
    }

    /// The key bound to `action`.
    #[must_use]
    pub fn key_for(&self, action: KeyAction) -> Option<&str> {
        self.bindings.get(&action).map(String::as_str)
    }
}
