//! Input event vocabulary shared by the viewport controller and the
//! keyboard shortcut watcher.
//!
//! The embedding shell translates platform events (DOM, winit, ...) into
//! these types. Pointer events carry a stable per-contact id so touch
//! contacts can be tracked individually; a mouse uses a single fixed id.

use crate::model::NoteId;
use kurbo::{Point, Vec2};

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform command chord: Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What a pointer-down landed on, as hit-tested by the embedding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Background,
    Note(NoteId),
}

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are absolute screen coordinates; the viewport controller
/// makes them viewport-local itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        id: u64,
        position: Point,
        button: PointerButton,
        target: PointerTarget,
    },
    Move {
        id: u64,
        position: Point,
    },
    Up {
        id: u64,
        position: Point,
    },
    /// Contact lost without a proper up (capture lost, touch cancelled).
    Cancel {
        id: u64,
    },
    Wheel {
        position: Point,
        delta: Vec2,
    },
}

/// A key press routed to the global shortcut watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    /// Lowercase key value ("c", "v", ...).
    pub key: String,
    pub modifiers: Modifiers,
    /// True when the press originated in a text input or other editable
    /// element; global shortcuts must not fire there.
    pub editable_target: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            editable_target: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_chord_matches_either_modifier() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::default()
        };
        let meta = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert!(ctrl.command());
        assert!(meta.command());
        assert!(!Modifiers::default().command());
    }
}
