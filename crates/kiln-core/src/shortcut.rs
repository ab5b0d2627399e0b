//! Keyboard shortcut routing.
//!
//! A fixed mapping from modifier-qualified key identity to one action,
//! evaluated on every key-down event while the application has focus. The
//! router holds no state of its own; dispatch executes against the current
//! manager references, so actions always act on current data.

use serde::{Deserialize, Serialize};

/// A modifier-qualified key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub key: char,
}

impl KeyChord {
    pub fn ctrl(key: char) -> Self {
        Self {
            ctrl: true,
            shift: false,
            key,
        }
    }

    pub fn ctrl_shift(key: char) -> Self {
        Self {
            ctrl: true,
            shift: true,
            key,
        }
    }
}

/// An action a recognized chord maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    SaveActiveDocument,
    OpenDocument,
    CreateDocument,
    RequestQuit,
    ZoomIn,
    ZoomOut,
}

/// Resolves a chord to its action.
///
/// Exactly one action fires per recognized chord; `Some` also tells the
/// caller to suppress the platform's default handling for that combination.
/// Unrecognized chords return `None` and pass through.
pub fn resolve(chord: KeyChord) -> Option<ShortcutAction> {
    match (chord.ctrl, chord.shift, chord.key.to_ascii_lowercase()) {
        (true, false, 's') => Some(ShortcutAction::SaveActiveDocument),
        (true, false, 'o') => Some(ShortcutAction::OpenDocument),
        (true, false, 'n') => Some(ShortcutAction::CreateDocument),
        (true, false, 'q') => Some(ShortcutAction::RequestQuit),
        // Ctrl+Shift+= is the unshifted identity of Ctrl+Shift+Plus.
        (true, true, '=') | (true, true, '+') => Some(ShortcutAction::ZoomIn),
        (true, false, '-') => Some(ShortcutAction::ZoomOut),
        _ => None,
    }
}
