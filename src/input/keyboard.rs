//! Key chord interception for browser-style shortcuts

use super::events::{KeyEvent, KeyEventKind, KeyModifiers};

/// Host key codes used by the shortcuts
pub mod keys {
    pub const KEY_0: i32 = 48;
    pub const KEY_MINUS: i32 = 45;
    pub const KEY_EQUAL: i32 = 61;
    pub const KEY_R: i32 = 82;
    pub const KEY_RIGHT: i32 = 262;
    pub const KEY_LEFT: i32 = 263;
}

/// Zoom levels are clamped to `-MAX_ZOOM_LEVEL..=MAX_ZOOM_LEVEL`
pub const MAX_ZOOM_LEVEL: f64 = 9.0;

/// A shortcut consumed instead of being forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserCommand {
    Reload,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    GoBack,
    GoForward,
}

/// What to do with a host key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Send the event to the engine
    Forward(KeyEvent),
    /// Run a browser command instead
    Command(BrowserCommand),
    /// Drop the event
    Suppress,
}

/// History state needed to decide whether back/forward chords apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigation {
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Decides which key events are shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardFilter {
    /// Control+R reloads
    pub browser_controls: bool,
    /// Zoom and history chords
    pub extended_controls: bool,
}

impl Default for KeyboardFilter {
    fn default() -> Self {
        Self {
            browser_controls: true,
            extended_controls: false,
        }
    }
}

impl KeyboardFilter {
    /// Shortcut bound to `code` with exactly `modifiers` held
    pub fn chord(&self, code: i32, modifiers: KeyModifiers, nav: Navigation) -> Option<BrowserCommand> {
        if !self.browser_controls {
            return None;
        }
        if modifiers == KeyModifiers::CONTROL {
            match code {
                keys::KEY_R => return Some(BrowserCommand::Reload),
                keys::KEY_EQUAL if self.extended_controls => return Some(BrowserCommand::ZoomIn),
                keys::KEY_MINUS if self.extended_controls => return Some(BrowserCommand::ZoomOut),
                keys::KEY_0 if self.extended_controls => return Some(BrowserCommand::ResetZoom),
                _ => {}
            }
        } else if modifiers == KeyModifiers::ALT && self.extended_controls {
            match code {
                keys::KEY_LEFT if nav.can_go_back => return Some(BrowserCommand::GoBack),
                keys::KEY_RIGHT if nav.can_go_forward => return Some(BrowserCommand::GoForward),
                _ => {}
            }
        }
        None
    }

    /// A key went down
    pub fn press(&self, code: i32, scan_code: i64, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        match self.chord(code, modifiers, nav) {
            Some(command) => KeyAction::Command(command),
            None => KeyAction::Forward(KeyEvent::key(KeyEventKind::Press, code, scan_code, modifiers)),
        }
    }

    /// A key went up; releases of consumed chords are dropped
    pub fn release(&self, code: i32, scan_code: i64, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        match self.chord(code, modifiers, nav) {
            Some(_) => KeyAction::Suppress,
            None => KeyAction::Forward(KeyEvent::key(KeyEventKind::Release, code, scan_code, modifiers)),
        }
    }

    /// A character was typed
    pub fn typed(&self, character: char, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        if character == '\0' || self.chord(character as i32, modifiers, nav).is_some() {
            return KeyAction::Suppress;
        }
        KeyAction::Forward(KeyEvent::typed(character, modifiers))
    }
}
