//! Host pointer and keyboard primitives to engine event sequences

use std::time::{Duration, Instant};

use super::events::{
    EventFlags, KeyModifiers, MouseButton, MouseEvent, MouseEventKind, WheelEvent,
};
use super::keyboard::{KeyAction, KeyboardFilter, Navigation};
use crate::drag::DragController;

/// Two presses of the same button closer than this form a double click
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Wheel notches are scaled by this on platforms without native smooth scrolling
pub const SCROLL_MULTIPLIER: f64 = 3.0;

/// Swap the host's secondary and middle button codes into the engine's order.
///
/// Involution on `{1, 2}`, identity elsewhere.
pub fn translate_button(host_button: u32) -> u32 {
    match host_button {
        1 => 2,
        2 => 1,
        other => other,
    }
}

/// Wheel delta as sent to the engine.
///
/// Without native smooth scrolling the delta is rounded away from zero and
/// scaled, which removes the "smooth scroll" feel.
pub fn scroll_delta(raw: f64, native_smooth_scroll: bool) -> f64 {
    if native_smooth_scroll {
        return raw;
    }
    let rounded = if raw < 0.0 { raw.floor() } else { raw.ceil() };
    rounded * SCROLL_MULTIPLIER
}

/// Button and click state. Only the translator mutates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    /// Held buttons
    pub buttons: EventFlags,
    /// Time and engine button code of the last press
    pub last_press: Option<(Instant, u32)>,
    /// 1 or 2
    pub click_count: u8,
    /// Engine code of the button currently held
    pub active_button: u32,
}

/// Translates host input into engine events
#[derive(Debug, Clone)]
pub struct InputTranslator {
    pointer: PointerState,
    native_smooth_scroll: bool,
    keyboard: KeyboardFilter,
}

impl InputTranslator {
    /// Create a translator
    pub fn new(native_smooth_scroll: bool, keyboard: KeyboardFilter) -> Self {
        Self {
            pointer: PointerState {
                click_count: 1,
                ..Default::default()
            },
            native_smooth_scroll,
            keyboard,
        }
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn keyboard(&self) -> &KeyboardFilter {
        &self.keyboard
    }

    /// Held buttons as a modifier mask
    pub fn button_mask(&self) -> EventFlags {
        self.pointer.buttons
    }

    /// A host button went down
    pub fn press(&mut self, x: i32, y: i32, host_button: u32) -> MouseEvent {
        self.press_at(x, y, host_button, Instant::now())
    }

    /// [`press`](Self::press) with an explicit timestamp
    pub fn press_at(
        &mut self,
        x: i32,
        y: i32,
        host_button: u32,
        now: Instant,
    ) -> MouseEvent {
        let button = translate_button(host_button);
        if let Some(b) = MouseButton::from_code(button) {
            self.pointer.buttons |= b.flag();
        }

        let repeat = self.pointer.last_press.is_some_and(|(at, last)| {
            last == button && now.saturating_duration_since(at) < DOUBLE_CLICK_WINDOW
        });
        self.pointer.click_count = if repeat { 2 } else { 1 };
        self.pointer.last_press = Some((now, button));
        self.pointer.active_button = button;

        MouseEvent {
            kind: MouseEventKind::Pressed,
            x,
            y,
            click_count: self.pointer.click_count,
            button,
            modifiers: self.pointer.buttons,
        }
    }

    /// A host button went up.
    ///
    /// The caller finishes an active drag before sending the event when the
    /// released button is [`MouseButton::Primary`].
    pub fn release(&mut self, x: i32, y: i32, host_button: u32) -> MouseEvent {
        let button = translate_button(host_button);
        if let Some(b) = MouseButton::from_code(button) {
            self.pointer.buttons.remove(b.flag());
        }

        let event = MouseEvent {
            kind: MouseEventKind::Released,
            x,
            y,
            click_count: self.pointer.click_count,
            button,
            modifiers: self.pointer.buttons,
        };
        self.pointer.active_button = 0;
        event
    }

    /// The pointer moved
    pub fn move_to(&self, x: i32, y: i32, drag: &DragController) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Moved,
            x,
            y,
            click_count: self.pointer.click_count,
            button: self.pointer.active_button,
            modifiers: drag.virtual_modifiers(self.pointer.buttons),
        }
    }

    /// The wheel turned
    pub fn scroll(&self, x: i32, y: i32, raw_delta: f64, modifiers: KeyModifiers) -> WheelEvent {
        WheelEvent {
            x,
            y,
            delta: scroll_delta(raw_delta, self.native_smooth_scroll),
            modifiers,
        }
    }

    /// Whether a wheel turn with `modifiers` zooms instead of scrolling
    pub fn wheel_zooms(&self, modifiers: KeyModifiers) -> bool {
        self.keyboard.browser_controls
            && self.keyboard.extended_controls
            && modifiers.contains(KeyModifiers::CONTROL)
    }

    pub fn key_press(&self, code: i32, scan_code: i64, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        self.keyboard.press(code, scan_code, modifiers, nav)
    }

    pub fn key_release(&self, code: i32, scan_code: i64, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        self.keyboard.release(code, scan_code, modifiers, nav)
    }

    pub fn key_typed(&self, character: char, modifiers: KeyModifiers, nav: Navigation) -> KeyAction {
        self.keyboard.typed(character, modifiers, nav)
    }
}
