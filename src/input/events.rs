//! Event shapes sent to the browser engine

use bitflags::bitflags;

bitflags! {
    /// Modifier and button state attached to engine mouse events.
    ///
    /// The engine treats held mouse buttons as modifier bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u32 {
        const CAPS_LOCK_ON = 1 << 0;
        const SHIFT_DOWN = 1 << 1;
        const CONTROL_DOWN = 1 << 2;
        const ALT_DOWN = 1 << 3;
        const LEFT_MOUSE_BUTTON = 1 << 4;
        const MIDDLE_MOUSE_BUTTON = 1 << 5;
        const RIGHT_MOUSE_BUTTON = 1 << 6;
        const COMMAND_DOWN = 1 << 7;

        const MOUSE_BUTTONS = Self::LEFT_MOUSE_BUTTON.bits()
            | Self::MIDDLE_MOUSE_BUTTON.bits()
            | Self::RIGHT_MOUSE_BUTTON.bits();
    }
}

bitflags! {
    /// Keyboard modifiers as reported by the host
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyModifiers: u32 {
        const SHIFT = 0x0001;
        const CONTROL = 0x0002;
        const ALT = 0x0004;
        const SUPER = 0x0008;
        const CAPS_LOCK = 0x0010;
        const NUM_LOCK = 0x0020;
    }
}

/// Mouse button in the engine's numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary = 0,
    Middle = 1,
    Secondary = 2,
}

impl MouseButton {
    /// Engine button code to button, `None` for extra buttons
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }

    /// Modifier bit set while the button is held
    pub fn flag(self) -> EventFlags {
        match self {
            Self::Primary => EventFlags::LEFT_MOUSE_BUTTON,
            Self::Middle => EventFlags::MIDDLE_MOUSE_BUTTON,
            Self::Secondary => EventFlags::RIGHT_MOUSE_BUTTON,
        }
    }
}

/// Kind of mouse event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Pressed,
    Released,
    Moved,
}

/// Mouse event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: i32,
    pub y: i32,
    pub click_count: u8,
    /// Engine button code
    pub button: u32,
    pub modifiers: EventFlags,
}

/// Scroll wheel event data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub x: i32,
    pub y: i32,
    pub delta: f64,
    pub modifiers: KeyModifiers,
}

/// Kind of key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
    Typed,
}

/// Keyboard event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub code: i32,
    pub scan_code: i64,
    pub character: char,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Press or release of a physical key; the character mirrors the key code
    pub fn key(kind: KeyEventKind, code: i32, scan_code: i64, modifiers: KeyModifiers) -> Self {
        Self {
            kind,
            code,
            scan_code,
            character: u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\0'),
            modifiers,
        }
    }

    /// A typed character
    pub fn typed(character: char, modifiers: KeyModifiers) -> Self {
        Self {
            kind: KeyEventKind::Typed,
            code: character as i32,
            scan_code: 0,
            character,
            modifiers,
        }
    }
}
