//! Input translation
//!
//! Converts discrete host input primitives (button codes, wheel deltas, key
//! codes) into the stateful event sequence the engine expects.

mod events;
mod keyboard;
mod translator;

pub use events::{
    EventFlags, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    WheelEvent,
};
pub use keyboard::{keys, BrowserCommand, KeyAction, KeyboardFilter, Navigation, MAX_ZOOM_LEVEL};
pub use translator::{
    scroll_delta, translate_button, InputTranslator, PointerState, DOUBLE_CLICK_WINDOW,
    SCROLL_MULTIPLIER,
};
