//! Cursor management
//!
//! Engine cursor notifications pass through the drag controller, which may
//! substitute a drag-outcome cursor, before reaching the host listener.

mod types;
mod window;

pub use types::CursorType;
pub use window::{cursor_icon, WinitCursor};

use std::sync::Arc;

use crate::drag::{DragController, DragOperations};

/// Host callback receiving the cursor to show
pub type CursorListener = Arc<dyn Fn(CursorType) + Send + Sync>;

/// Delivers cursor changes to the host
#[derive(Default)]
pub struct CursorManager {
    listener: Option<CursorListener>,
    last: Option<CursorType>,
}

impl CursorManager {
    /// Create a manager without a listener
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the host listener
    pub fn set_listener(&mut self, listener: CursorListener) {
        self.listener = Some(listener);
    }

    /// Remove the host listener
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Last cursor sent to the host
    pub fn last_cursor(&self) -> Option<CursorType> {
        self.last
    }

    /// The engine reported a new cursor
    pub fn on_engine_cursor_change(&mut self, cursor: CursorType, drag: &mut DragController) -> CursorType {
        let shown = drag.virtualize(cursor);
        self.apply(shown);
        shown
    }

    /// The engine reported which operation a drop would perform
    pub fn on_drag_cursor_update(&mut self, operation: DragOperations, drag: &mut DragController) {
        if !drag.update_cursor(operation) {
            return;
        }
        let shown = drag.virtualize(drag.actual_cursor());
        if self.last != Some(shown) {
            self.apply(shown);
        }
    }

    /// Send `cursor` to the host listener, if any
    pub fn apply(&mut self, cursor: CursorType) {
        self.last = Some(cursor);
        if let Some(listener) = &self.listener {
            listener(cursor);
        }
    }
}
