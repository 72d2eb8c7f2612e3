//! Browser engine seams
//!
//! The bridge talks to a concrete engine binding through two narrow traits:
//! 1. [`BrowserEngine`]: commands the bridge sends into the engine
//! 2. [`EngineCallbacks`]: notifications the engine delivers, possibly on its own thread
//!
//! Neither depends on the engine's own type hierarchy, so bindings and test
//! doubles can be swapped freely.

mod recording;

pub use recording::{EngineCommand, RecordingEngine};

use crate::compositor::DamageRect;
use crate::drag::{DragData, DragOperations};
use crate::input::{EventFlags, KeyEvent, MouseEvent, WheelEvent};

/// Commands sent to the browser engine
#[cfg_attr(test, mockall::automock)]
pub trait BrowserEngine: Send {
    fn send_mouse_event(&mut self, event: MouseEvent);

    fn send_wheel_event(&mut self, event: WheelEvent);

    fn send_key_event(&mut self, event: KeyEvent);

    /// The view now has `width` x `height` pixels
    fn was_resized(&mut self, width: u32, height: u32);

    fn drag_target_drag_enter(
        &mut self,
        data: &DragData,
        x: i32,
        y: i32,
        modifiers: EventFlags,
        allowed: DragOperations,
    );

    fn drag_target_drag_over(&mut self, x: i32, y: i32, modifiers: EventFlags, allowed: DragOperations);

    fn drag_target_drop(&mut self, x: i32, y: i32, modifiers: EventFlags);

    fn drag_target_drag_leave(&mut self);

    fn reload(&mut self);

    fn zoom_level(&self) -> f64;

    fn set_zoom_level(&mut self, level: f64);

    fn can_go_back(&self) -> bool;

    fn can_go_forward(&self) -> bool;

    fn go_back(&mut self);

    fn go_forward(&mut self);

    /// Tear down the engine-side browser
    fn close(&mut self);
}

/// Notifications delivered by the engine
pub trait EngineCallbacks {
    /// New pixels for the page (`popup == false`) or the popup layer.
    ///
    /// `buffer` is only valid for the duration of the call.
    fn on_paint(&mut self, popup: bool, regions: &[DamageRect], buffer: &[u8], width: u32, height: u32);

    fn on_cursor_change(&mut self, cursor_id: i32);

    fn on_popup_show(&mut self, visible: bool);

    fn on_popup_geometry(&mut self, bounds: DamageRect);

    /// The page started a drag. Returns `true` when the drag is handled off-screen.
    fn on_start_dragging(&mut self, data: DragData, allowed: DragOperations, x: i32, y: i32) -> bool;

    fn on_drag_cursor_update(&mut self, operation: DragOperations);
}
