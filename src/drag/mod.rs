//! Drag-and-drop controller
//!
//! Off-screen surfaces cannot use native OS drag rendering, so a drag
//! started by the page is tracked here and replayed to the engine as
//! drag-target events driven by host pointer input.
//!
//! ```text
//! Idle --start--> Dragging --drop/cancel--> Idle
//!                    |  ^
//!                    +--+ drag over
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::cursor::CursorType;
use crate::engine::BrowserEngine;
use crate::input::EventFlags;

bitflags! {
    /// Drag operations allowed by the drag source
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DragOperations: u32 {
        const COPY = 1;
        const LINK = 2;
        const GENERIC = 4;
        const PRIVATE = 8;
        const MOVE = 16;
        const DELETE = 32;
        const EVERY = u32::MAX;
    }
}

impl DragOperations {
    /// Cursor communicating what a drop would do, `None` if the engine gave no hint
    pub fn cursor(self) -> Option<CursorType> {
        if self.is_empty() {
            Some(CursorType::NoDrop)
        } else if self == Self::EVERY {
            None
        } else if self.contains(Self::COPY) {
            Some(CursorType::Copy)
        } else if self.contains(Self::MOVE) {
            Some(CursorType::Move)
        } else if self.contains(Self::LINK) {
            Some(CursorType::Alias)
        } else {
            None
        }
    }
}

/// Drag payload. Opaque to the bridge; engine bindings downcast it.
#[derive(Clone)]
pub struct DragData {
    inner: Arc<dyn Any + Send + Sync>,
}

impl DragData {
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            inner: Arc::new(payload),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for DragData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragData").finish_non_exhaustive()
    }
}

/// A drag in flight
#[derive(Debug, Clone)]
pub struct DragSession {
    pub data: DragData,
    pub allowed: DragOperations,
    pub cursor_override: Option<CursorType>,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

/// Owns the single in-flight drag session
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
    actual_cursor: CursorType,
}

impl DragController {
    /// Create an idle controller
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        if self.session.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Cursor last reported by the engine, ignoring drag overrides
    pub fn actual_cursor(&self) -> CursorType {
        self.actual_cursor
    }

    /// Begin a drag and announce it to the engine.
    ///
    /// Always returns `true`: the drag is handled here and never natively.
    pub fn start_dragging(
        &mut self,
        engine: &mut dyn BrowserEngine,
        data: DragData,
        allowed: DragOperations,
        x: i32,
        y: i32,
        buttons: EventFlags,
    ) -> bool {
        if self.session.take().is_some() {
            log::debug!("Replacing drag session still in flight");
            engine.drag_target_drag_leave();
        }
        engine.drag_target_drag_enter(&data, x, y, buttons, allowed);
        self.session = Some(DragSession {
            data,
            allowed,
            cursor_override: None,
        });
        log::debug!("Drag started at ({}, {}) with {:?}", x, y, allowed);
        true
    }

    /// Forward pointer movement during a drag
    pub fn drag_over(&mut self, engine: &mut dyn BrowserEngine, x: i32, y: i32) {
        if let Some(session) = &self.session {
            engine.drag_target_drag_over(x, y, EventFlags::empty(), session.allowed);
        }
    }

    /// Drop at `(x, y)`. Returns the cursor to restore, or `None` when idle.
    pub fn drop_at(
        &mut self,
        engine: &mut dyn BrowserEngine,
        x: i32,
        y: i32,
        buttons: EventFlags,
    ) -> Option<CursorType> {
        self.session.as_ref()?;
        engine.drag_target_drop(x, y, buttons);
        engine.drag_target_drag_leave();
        self.session = None;
        log::debug!("Drag dropped at ({}, {})", x, y);
        Some(self.actual_cursor)
    }

    /// Abandon the drag. Returns the cursor to restore, or `None` when idle.
    pub fn cancel(&mut self, engine: &mut dyn BrowserEngine) -> Option<CursorType> {
        self.session.as_ref()?;
        engine.drag_target_drag_leave();
        self.session = None;
        log::debug!("Drag cancelled");
        Some(self.actual_cursor)
    }

    /// Suppress held buttons while dragging so the page does not re-select under the drag
    pub fn virtual_modifiers(&self, buttons: EventFlags) -> EventFlags {
        if self.is_dragging() {
            buttons - EventFlags::MOUSE_BUTTONS
        } else {
            buttons
        }
    }

    /// Record the engine's drag operation hint.
    ///
    /// Returns `true` when it yields a new cursor override.
    pub fn update_cursor(&mut self, operation: DragOperations) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let previous = session.cursor_override;
        session.cursor_override = operation.cursor();
        session.cursor_override.is_some() && session.cursor_override != previous
    }

    /// Map an engine cursor to the one to show, remembering it as the actual cursor
    pub fn virtualize(&mut self, cursor: CursorType) -> CursorType {
        self.actual_cursor = cursor;
        self.session
            .as_ref()
            .and_then(|s| s.cursor_override)
            .unwrap_or(cursor)
    }
}
