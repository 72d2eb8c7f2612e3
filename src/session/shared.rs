//! Thread-safe session handle with a panic boundary for engine callbacks

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::{lock, BrowserSession};
use crate::compositor::{DamageRect, TextureHandle};
use crate::drag::{DragData, DragOperations};
use crate::engine::EngineCallbacks;

/// Shared handle to a [`BrowserSession`].
///
/// The host keeps one clone and the engine binding another; callbacks may be
/// delivered from the engine's own thread.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<BrowserSession>>,
    failures: Arc<AtomicUsize>,
}

impl SharedSession {
    pub fn new(session: BrowserSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run `f` with exclusive access to the session
    pub fn with_session<R>(&self, f: impl FnOnce(&mut BrowserSession) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Close the session. Returns `false` if already closed.
    pub fn close(&self) -> bool {
        self.with_session(|s| s.close())
    }

    pub fn is_closed(&self) -> bool {
        self.with_session(|s| s.is_closed())
    }

    pub fn surface_handle(&self) -> Option<TextureHandle> {
        self.with_session(|s| s.surface_handle())
    }

    /// Callbacks that panicked so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<BrowserSession>> {
        Arc::downgrade(&self.inner)
    }

    /// Run a callback, containing any panic so it never unwinds into the engine
    fn guarded<R>(&self, callback: &'static str, fallback: R, f: impl FnOnce(&mut BrowserSession) -> R) -> R {
        match panic::catch_unwind(AssertUnwindSafe(|| self.with_session(f))) {
            Ok(value) => value,
            Err(payload) => {
                let count = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                log::error!(
                    "Panic in {} callback ({} so far): {}",
                    callback,
                    count,
                    panic_message(payload.as_ref())
                );
                fallback
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

impl EngineCallbacks for SharedSession {
    fn on_paint(&mut self, popup: bool, regions: &[DamageRect], buffer: &[u8], width: u32, height: u32) {
        self.guarded("paint", (), |s| s.on_paint(popup, regions, buffer, width, height));
    }

    fn on_cursor_change(&mut self, cursor_id: i32) {
        self.guarded("cursor change", (), |s| s.on_cursor_change(cursor_id));
    }

    fn on_popup_show(&mut self, visible: bool) {
        self.guarded("popup show", (), |s| s.on_popup_show(visible));
    }

    fn on_popup_geometry(&mut self, bounds: DamageRect) {
        self.guarded("popup geometry", (), |s| s.on_popup_geometry(bounds));
    }

    fn on_start_dragging(&mut self, data: DragData, allowed: DragOperations, x: i32, y: i32) -> bool {
        // native drag is never possible off-screen, even if tracking failed
        self.guarded("start dragging", true, |s| s.on_start_dragging(data, allowed, x, y))
    }

    fn on_drag_cursor_update(&mut self, operation: DragOperations) {
        self.guarded("drag cursor update", (), |s| s.on_drag_cursor_update(operation));
    }
}
