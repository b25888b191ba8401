//! Key handling for the overlay.
//!
//! The host decides how keyboard input reaches the engine and forwards it as
//! [`Key`] values. Fixed keys cover gesture control; single characters
//! switch the draw mode and can be rebound through the configuration.

use serde::{Deserialize, Serialize};

use crate::model::{DrawMode, ShapeKind};

/// A key forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Enter,
    /// The host's undo chord (e.g. Ctrl+Z).
    Undo,
    /// The host's redo chord (e.g. Ctrl+Shift+Z).
    Redo,
    Char(char),
}

/// What a key press asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Abort the current gesture.
    Cancel,
    /// Remove the selected shape.
    DeleteSelected,
    /// Close the polygon being drawn.
    FinishPolygon,
    Undo,
    Redo,
    SetMode(DrawMode),
}

/// Hotkeys for the draw modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyBindings {
    pub move_mode: char,
    pub circle: char,
    pub rectangle: char,
    pub ellipse: char,
    pub arrow: char,
    pub polygon: char,
    pub ruler: char,
    pub flag: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_mode: 'v',
            circle: 'c',
            rectangle: 'r',
            ellipse: 'e',
            arrow: 'a',
            polygon: 'p',
            ruler: 'l',
            flag: 'f',
        }
    }
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the hotkey bound to a draw mode.
    pub fn hotkey_for(&self, mode: DrawMode) -> char {
        match mode {
            DrawMode::Move => self.move_mode,
            DrawMode::Draw(ShapeKind::Circle) => self.circle,
            DrawMode::Draw(ShapeKind::Rectangle) => self.rectangle,
            DrawMode::Draw(ShapeKind::Ellipse) => self.ellipse,
            DrawMode::Draw(ShapeKind::Arrow) => self.arrow,
            DrawMode::Draw(ShapeKind::Polygon) => self.polygon,
            DrawMode::Draw(ShapeKind::Ruler) => self.ruler,
            DrawMode::Draw(ShapeKind::Flag) => self.flag,
        }
    }

    /// Get the draw mode bound to a character, case-insensitively.
    pub fn mode_for_char(&self, c: char) -> Option<DrawMode> {
        let c = c.to_ascii_lowercase();
        std::iter::once(DrawMode::Move)
            .chain(ShapeKind::all().iter().map(|kind| DrawMode::Draw(*kind)))
            .find(|mode| self.hotkey_for(*mode).to_ascii_lowercase() == c)
    }

    /// Map a key press to an action.
    pub fn action_for(&self, key: Key) -> Option<KeyAction> {
        match key {
            Key::Escape => Some(KeyAction::Cancel),
            Key::Delete | Key::Backspace => Some(KeyAction::DeleteSelected),
            Key::Enter => Some(KeyAction::FinishPolygon),
            Key::Undo => Some(KeyAction::Undo),
            Key::Redo => Some(KeyAction::Redo),
            Key::Char(c) => self.mode_for_char(c).map(KeyAction::SetMode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hotkeys_are_unique() {
        let bindings = KeyBindings::default();
        let mut keys: Vec<char> = ShapeKind::all()
            .iter()
            .map(|k| bindings.hotkey_for(DrawMode::Draw(*k)))
            .collect();
        keys.push(bindings.move_mode);
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_char_maps_to_mode() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.action_for(Key::Char('P')),
            Some(KeyAction::SetMode(DrawMode::Draw(ShapeKind::Polygon)))
        );
        assert_eq!(
            bindings.action_for(Key::Char('v')),
            Some(KeyAction::SetMode(DrawMode::Move))
        );
        assert_eq!(bindings.action_for(Key::Char('z')), None);
    }

    #[test]
    fn test_fixed_keys() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for(Key::Escape), Some(KeyAction::Cancel));
        assert_eq!(
            bindings.action_for(Key::Backspace),
            Some(KeyAction::DeleteSelected)
        );
        assert_eq!(
            bindings.action_for(Key::Enter),
            Some(KeyAction::FinishPolygon)
        );
    }

    #[test]
    fn test_rebinding() {
        let bindings = KeyBindings {
            ruler: 'm',
            ..KeyBindings::default()
        };
        assert_eq!(
            bindings.mode_for_char('m'),
            Some(DrawMode::Draw(ShapeKind::Ruler))
        );
        assert_eq!(bindings.mode_for_char('l'), None);
    }
}
