//! Browser session
//!
//! A [`BrowserSession`] owns one off-screen browser: the engine handle, the
//! surface compositor and the input, drag and cursor state. It exposes the
//! host API and implements [`EngineCallbacks`] for the engine binding.
//!
//! Compositing failures are logged and never returned to the engine. Use
//! [`SharedSession`] when callbacks arrive on another thread; it also
//! contains panics at the callback boundary.

mod context;
mod shared;

pub use context::SessionContext;
pub use shared::SharedSession;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::compositor::{DamageRect, SurfaceCompositor, TextureBackend, TextureHandle};
use crate::cursor::{CursorListener, CursorManager, CursorType};
use crate::drag::{DragController, DragData, DragOperations, DragState};
use crate::engine::{BrowserEngine, EngineCallbacks};
use crate::input::{
    BrowserCommand, InputTranslator, KeyAction, KeyModifiers, MouseButton, Navigation, PointerState,
    MAX_ZOOM_LEVEL,
};
use crate::render_queue::RenderSubmitter;
use crate::utils::SurfaceError;

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// One off-screen browser
pub struct BrowserSession {
    engine: Box<dyn BrowserEngine>,
    compositor: Arc<Mutex<SurfaceCompositor>>,
    input: InputTranslator,
    drag: DragController,
    cursor: CursorManager,
    render: RenderSubmitter,
    closed: bool,
}

impl BrowserSession {
    /// Create a session. Texture initialization is queued on the render thread.
    pub fn new(
        engine: Box<dyn BrowserEngine>,
        backend: Box<dyn TextureBackend>,
        input: InputTranslator,
        render: RenderSubmitter,
    ) -> Self {
        let compositor = Arc::new(Mutex::new(SurfaceCompositor::new(backend)));
        let pending = Arc::clone(&compositor);
        let queued = render.submit(move || {
            if let Err(e) = lock(&pending).initialize() {
                log::warn!("Failed to initialize surface: {}", e);
            }
        });
        if !queued {
            log::warn!("Render queue is gone, surface stays uninitialized");
        }

        Self {
            engine,
            compositor,
            input,
            drag: DragController::new(),
            cursor: CursorManager::new(),
            render,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Texture the host samples for presentation
    pub fn surface_handle(&self) -> Option<TextureHandle> {
        lock(&self.compositor).handle()
    }

    /// Run `f` against the compositor
    pub fn with_compositor<R>(&self, f: impl FnOnce(&SurfaceCompositor) -> R) -> R {
        f(&lock(&self.compositor))
    }

    pub fn pointer(&self) -> &PointerState {
        self.input.pointer()
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// Last cursor sent to the host
    pub fn cursor(&self) -> Option<CursorType> {
        self.cursor.last_cursor()
    }

    /// Install the host's cursor listener
    pub fn set_cursor_listener(&mut self, listener: CursorListener) {
        self.cursor.set_listener(listener);
    }

    fn navigation(&self) -> Navigation {
        Navigation {
            can_go_back: self.engine.can_go_back(),
            can_go_forward: self.engine.can_go_forward(),
        }
    }

    /// The host resized the view
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.closed {
            return;
        }
        self.engine.was_resized(width, height);
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if self.closed {
            return;
        }
        let event = self.input.move_to(x, y, &self.drag);
        self.engine.send_mouse_event(event);
        self.drag.drag_over(self.engine.as_mut(), x, y);
    }

    pub fn pointer_press(&mut self, x: i32, y: i32, host_button: u32) {
        if self.closed {
            return;
        }
        let event = self.input.press(x, y, host_button);
        self.engine.send_mouse_event(event);
    }

    /// A host button went up. Releasing the primary button drops an active drag first.
    pub fn pointer_release(&mut self, x: i32, y: i32, host_button: u32) {
        if self.closed {
            return;
        }
        let event = self.input.release(x, y, host_button);
        if event.button == MouseButton::Primary as u32 {
            self.finish_drag(x, y);
        }
        self.engine.send_mouse_event(event);
    }

    pub fn wheel(&mut self, x: i32, y: i32, raw_delta: f64) {
        self.wheel_with_modifiers(x, y, raw_delta, KeyModifiers::empty());
    }

    /// Wheel turn with held keys; Control zooms when extended controls are on
    pub fn wheel_with_modifiers(&mut self, x: i32, y: i32, raw_delta: f64, modifiers: KeyModifiers) {
        if self.closed {
            return;
        }
        if self.input.wheel_zooms(modifiers) {
            let command = if raw_delta > 0.0 {
                BrowserCommand::ZoomIn
            } else {
                BrowserCommand::ZoomOut
            };
            self.run_command(command);
            return;
        }
        let event = self.input.scroll(x, y, raw_delta, modifiers);
        self.engine.send_wheel_event(event);
    }

    pub fn key_press(&mut self, code: i32, scan_code: i64, modifiers: KeyModifiers) {
        if self.closed {
            return;
        }
        let action = self.input.key_press(code, scan_code, modifiers, self.navigation());
        self.dispatch_key(action);
    }

    pub fn key_release(&mut self, code: i32, scan_code: i64, modifiers: KeyModifiers) {
        if self.closed {
            return;
        }
        let action = self.input.key_release(code, scan_code, modifiers, self.navigation());
        self.dispatch_key(action);
    }

    pub fn key_typed(&mut self, character: char, modifiers: KeyModifiers) {
        if self.closed {
            return;
        }
        let action = self.input.key_typed(character, modifiers, self.navigation());
        self.dispatch_key(action);
    }

    fn dispatch_key(&mut self, action: KeyAction) {
        match action {
            KeyAction::Forward(event) => self.engine.send_key_event(event),
            KeyAction::Command(command) => self.run_command(command),
            KeyAction::Suppress => {}
        }
    }

    fn run_command(&mut self, command: BrowserCommand) {
        log::debug!("Browser command {:?}", command);
        match command {
            BrowserCommand::Reload => self.engine.reload(),
            BrowserCommand::ZoomIn | BrowserCommand::ZoomOut => {
                let step = if command == BrowserCommand::ZoomIn { 1.0 } else { -1.0 };
                let level = self.engine.zoom_level() + step;
                if level.abs() <= MAX_ZOOM_LEVEL {
                    self.engine.set_zoom_level(level);
                }
            }
            BrowserCommand::ResetZoom => self.engine.set_zoom_level(0.0),
            BrowserCommand::GoBack => self.engine.go_back(),
            BrowserCommand::GoForward => self.engine.go_forward(),
        }
    }

    /// Begin a drag carrying data from outside the page
    pub fn start_external_drag(&mut self, data: DragData, allowed: DragOperations, x: i32, y: i32) -> bool {
        if self.closed {
            return false;
        }
        let buttons = self.input.button_mask();
        self.drag
            .start_dragging(self.engine.as_mut(), data, allowed, x, y, buttons)
    }

    /// Drop the active drag at `(x, y)`; no-op when idle
    pub fn finish_drag(&mut self, x: i32, y: i32) {
        let buttons = self.input.button_mask();
        if let Some(cursor) = self.drag.drop_at(self.engine.as_mut(), x, y, buttons) {
            self.cursor.apply(cursor);
        }
    }

    /// Abandon the active drag; no-op when idle
    pub fn cancel_drag(&mut self) {
        if let Some(cursor) = self.drag.cancel(self.engine.as_mut()) {
            self.cursor.apply(cursor);
        }
    }

    /// Close the browser and release the surface. Returns `false` if already closed.
    pub fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.cancel_drag();
        self.cursor.apply(CursorType::Pointer);

        let compositor = Arc::clone(&self.compositor);
        let queued = self.render.submit(move || {
            lock(&compositor).release();
        });
        if !queued {
            log::warn!("Render queue is gone, releasing surface on the calling thread");
            lock(&self.compositor).release();
        }

        self.engine.close();
        log::debug!("Session closed");
        true
    }

    fn report(result: Result<(), SurfaceError>, layer: &str) {
        match result {
            Ok(()) => {}
            Err(SurfaceError::NotInitialized) => {
                log::trace!("Skipping {} paint, surface not initialized", layer)
            }
            Err(e) => log::warn!("Failed to composite {} paint: {}", layer, e),
        }
    }
}

impl EngineCallbacks for BrowserSession {
    fn on_paint(&mut self, popup: bool, regions: &[DamageRect], buffer: &[u8], width: u32, height: u32) {
        if self.closed {
            return;
        }
        let mut compositor = lock(&self.compositor);
        if popup {
            Self::report(compositor.apply_popup_damage(buffer, width, height, regions), "popup");
        } else {
            Self::report(compositor.apply_primary_damage(buffer, width, height, regions), "primary");
        }
    }

    fn on_cursor_change(&mut self, cursor_id: i32) {
        let Some(cursor) = CursorType::from_id(cursor_id) else {
            log::debug!("Ignoring unknown cursor id {}", cursor_id);
            return;
        };
        self.cursor.on_engine_cursor_change(cursor, &mut self.drag);
    }

    fn on_popup_show(&mut self, visible: bool) {
        lock(&self.compositor).on_popup_show(visible);
    }

    fn on_popup_geometry(&mut self, bounds: DamageRect) {
        lock(&self.compositor).on_popup_geometry(bounds);
    }

    fn on_start_dragging(&mut self, data: DragData, allowed: DragOperations, x: i32, y: i32) -> bool {
        if self.closed {
            // nothing to render a native drag into either
            return true;
        }
        let buttons = self.input.button_mask();
        self.drag
            .start_dragging(self.engine.as_mut(), data, allowed, x, y, buttons)
    }

    fn on_drag_cursor_update(&mut self, operation: DragOperations) {
        self.cursor.on_drag_cursor_update(operation, &mut self.drag);
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::{frame_len, SoftwareTexture};
    use crate::engine::{EngineCommand, MockBrowserEngine, RecordingEngine};
    use crate::input::{keys, EventFlags, KeyEvent, KeyEventKind, KeyboardFilter, MouseEventKind};
    use crate::render_queue::RenderQueue;
    use pretty_assertions::assert_eq;

    struct Harness {
        session: BrowserSession,
        engine: RecordingEngine,
        texture: SoftwareTexture,
        queue: RenderQueue,
    }

    fn harness_with(filter: KeyboardFilter, engine: RecordingEngine) -> Harness {
        let queue = RenderQueue::new();
        let texture = SoftwareTexture::new();
        let session = BrowserSession::new(
            Box::new(engine.clone()),
            Box::new(texture.clone()),
            InputTranslator::new(false, filter),
            queue.submitter(),
        );
        queue.run_pending();
        Harness {
            session,
            engine,
            texture,
            queue,
        }
    }

    fn harness() -> Harness {
        harness_with(KeyboardFilter::default(), RecordingEngine::new())
    }

    fn extended() -> KeyboardFilter {
        KeyboardFilter {
            browser_controls: true,
            extended_controls: true,
        }
    }

    #[test]
    fn test_initialization_runs_on_render_queue() {
        let queue = RenderQueue::new();
        let session = BrowserSession::new(
            Box::new(RecordingEngine::new()),
            Box::new(SoftwareTexture::new()),
            InputTranslator::new(false, KeyboardFilter::default()),
            queue.submitter(),
        );
        assert!(session.surface_handle().is_none());
        assert_eq!(queue.run_pending(), 1);
        assert!(session.surface_handle().is_some());
    }

    #[test]
    fn test_paint_before_initialization_is_skipped() {
        let queue = RenderQueue::new();
        let texture = SoftwareTexture::new();
        let mut session = BrowserSession::new(
            Box::new(RecordingEngine::new()),
            Box::new(texture.clone()),
            InputTranslator::new(false, KeyboardFilter::default()),
            queue.submitter(),
        );
        let buffer = vec![1; frame_len(2, 2)];
        session.on_paint(false, &[DamageRect::full(2, 2)], &buffer, 2, 2);
        assert_eq!(texture.stats().full_uploads, 0);

        queue.run_pending();
        session.on_paint(false, &[DamageRect::full(2, 2)], &buffer, 2, 2);
        assert_eq!(texture.stats().full_uploads, 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut h = harness();
        let seen = Arc::new(Mutex::new(Vec::<CursorType>::new()));
        let sink = Arc::clone(&seen);
        h.session
            .set_cursor_listener(Arc::new(move |c: CursorType| sink.lock().unwrap().push(c)));

        assert!(h.session.close());
        assert!(!h.session.close());
        assert_eq!(h.queue.run_pending(), 1);

        assert_eq!(h.texture.stats().destroyed, 1);
        assert_eq!(h.engine.count(|c| *c == EngineCommand::Close), 1);
        assert_eq!(*seen.lock().unwrap(), vec![CursorType::Pointer]);
        assert!(h.session.surface_handle().is_none());
    }

    #[test]
    fn test_close_without_render_queue_releases_inline() {
        let mut h = harness();
        drop(h.queue);
        assert!(h.session.close());
        assert_eq!(h.texture.stats().destroyed, 1);
    }

    #[test]
    fn test_input_after_close_is_ignored() {
        let mut h = harness();
        h.session.close();
        h.engine.drain();

        h.session.pointer_press(0, 0, 0);
        h.session.wheel(0, 0, 1.0);
        h.session.key_press(65, 30, KeyModifiers::empty());
        h.session.resize(10, 10);
        assert!(h.engine.commands().is_empty());
    }

    #[test]
    fn test_ctrl_r_reloads_and_suppresses_release() {
        let mut h = harness();
        h.session.key_press(keys::KEY_R, 19, KeyModifiers::CONTROL);
        h.session.key_release(keys::KEY_R, 19, KeyModifiers::CONTROL);
        h.session.key_press(keys::KEY_R, 19, KeyModifiers::SHIFT);

        assert_eq!(
            h.engine.commands(),
            vec![
                EngineCommand::Reload,
                EngineCommand::Key(KeyEvent::key(KeyEventKind::Press, keys::KEY_R, 19, KeyModifiers::SHIFT)),
            ]
        );
    }

    #[test]
    fn test_null_typed_character_dropped() {
        let mut h = harness();
        h.session.key_typed('\0', KeyModifiers::empty());
        h.session.key_typed('a', KeyModifiers::empty());
        assert_eq!(
            h.engine.commands(),
            vec![EngineCommand::Key(KeyEvent::typed('a', KeyModifiers::empty()))]
        );
    }

    #[test]
    fn test_zoom_chords_clamp() {
        let mut h = harness_with(extended(), RecordingEngine::new());
        for _ in 0..12 {
            h.session.key_press(keys::KEY_EQUAL, 13, KeyModifiers::CONTROL);
        }
        assert_eq!(h.engine.zoom_level(), MAX_ZOOM_LEVEL);

        h.session.key_press(keys::KEY_0, 11, KeyModifiers::CONTROL);
        assert_eq!(h.engine.zoom_level(), 0.0);

        for _ in 0..12 {
            h.session.wheel_with_modifiers(0, 0, -1.0, KeyModifiers::CONTROL);
        }
        assert_eq!(h.engine.zoom_level(), -MAX_ZOOM_LEVEL);
        assert_eq!(h.engine.count(|c| matches!(c, EngineCommand::Wheel(_))), 0);
    }

    #[test]
    fn test_history_chords_follow_engine_state() {
        let mut h = harness_with(extended(), RecordingEngine::with_history(0, 0));
        h.session.key_press(keys::KEY_LEFT, 105, KeyModifiers::ALT);
        assert_eq!(h.engine.count(|c| *c == EngineCommand::GoBack), 0);
        assert_eq!(h.engine.count(|c| matches!(c, EngineCommand::Key(_))), 1);

        let mut h = harness_with(extended(), RecordingEngine::with_history(1, 0));
        h.session.key_press(keys::KEY_LEFT, 105, KeyModifiers::ALT);
        assert_eq!(h.engine.count(|c| *c == EngineCommand::GoBack), 1);
    }

    #[test]
    fn test_scroll_is_rounded_and_scaled() {
        let mut h = harness();
        h.session.wheel(4, 5, 0.3);
        h.session.wheel(4, 5, -0.3);
        let deltas: Vec<f64> = h
            .engine
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                EngineCommand::Wheel(w) => Some(w.delta),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec![3.0, -3.0]);
    }

    #[test]
    fn test_release_primary_drops_before_release_event() {
        let mut h = harness();
        h.session.pointer_press(1, 1, 0);
        assert!(h.session.on_start_dragging(DragData::new(7u32), DragOperations::COPY, 1, 1));
        h.session.pointer_move(8, 9);
        h.session.pointer_release(10, 11, 0);

        let commands = h.engine.drain();
        let kinds: Vec<&str> = commands
            .iter()
            .map(|c| match c {
                EngineCommand::Mouse(m) if m.kind == MouseEventKind::Pressed => "press",
                EngineCommand::Mouse(m) if m.kind == MouseEventKind::Moved => "move",
                EngineCommand::Mouse(_) => "release",
                EngineCommand::DragEnter { .. } => "enter",
                EngineCommand::DragOver { .. } => "over",
                EngineCommand::Drop { .. } => "drop",
                EngineCommand::DragLeave => "leave",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["press", "enter", "move", "over", "drop", "leave", "release"]);
        assert_eq!(h.session.drag_state(), DragState::Idle);

        // move while dragging reports no held buttons
        let moved = commands.iter().find_map(|c| match c {
            EngineCommand::Mouse(m) if m.kind == MouseEventKind::Moved => Some(m.modifiers),
            _ => None,
        });
        assert_eq!(moved, Some(EventFlags::empty()));
    }

    #[test]
    fn test_secondary_release_keeps_drag() {
        let mut h = harness();
        h.session.on_start_dragging(DragData::new(()), DragOperations::MOVE, 0, 0);
        h.session.pointer_press(0, 0, 1);
        h.session.pointer_release(0, 0, 1);
        assert_eq!(h.session.drag_state(), DragState::Dragging);

        h.session.cancel_drag();
        h.session.cancel_drag();
        assert_eq!(h.engine.count(|c| *c == EngineCommand::DragLeave), 1);
    }

    #[test]
    fn test_press_during_drag_reports_held_buttons() {
        let mut h = harness();
        h.session.pointer_press(2, 2, 0);
        h.session.on_start_dragging(DragData::new(()), DragOperations::COPY, 2, 2);
        h.engine.drain();

        // host 1 is the engine's secondary button
        h.session.pointer_press(3, 3, 1);
        let pressed = h.engine.drain().iter().find_map(|c| match c {
            EngineCommand::Mouse(m) if m.kind == MouseEventKind::Pressed => Some(m.modifiers),
            _ => None,
        });
        assert_eq!(
            pressed,
            Some(EventFlags::LEFT_MOUSE_BUTTON | EventFlags::RIGHT_MOUSE_BUTTON)
        );
        assert_eq!(h.session.drag_state(), DragState::Dragging);
    }

    #[test]
    fn test_drag_cursor_restored_after_drop() {
        let mut h = harness();
        h.session.on_cursor_change(CursorType::Hand.id());
        h.session.on_start_dragging(DragData::new(()), DragOperations::COPY, 0, 0);
        h.session.on_drag_cursor_update(DragOperations::COPY);
        assert_eq!(h.session.cursor(), Some(CursorType::Copy));

        h.session.finish_drag(3, 3);
        assert_eq!(h.session.cursor(), Some(CursorType::Hand));
    }

    #[test]
    fn test_unknown_cursor_id_ignored() {
        let mut h = harness();
        h.session.on_cursor_change(9999);
        assert_eq!(h.session.cursor(), None);
    }

    #[test]
    fn test_external_drag_uses_mock_engine() {
        let mut engine = MockBrowserEngine::new();
        engine
            .expect_drag_target_drag_enter()
            .withf(|_, x, y, _, allowed| (*x, *y) == (4, 2) && *allowed == DragOperations::LINK)
            .times(1)
            .return_const(());
        engine.expect_drag_target_drag_leave().times(1).return_const(());
        engine.expect_close().times(1).return_const(());

        let queue = RenderQueue::new();
        let mut session = BrowserSession::new(
            Box::new(engine),
            Box::new(SoftwareTexture::new()),
            InputTranslator::new(false, KeyboardFilter::default()),
            queue.submitter(),
        );
        assert!(session.start_external_drag(DragData::new("file"), DragOperations::LINK, 4, 2));
        session.close();
    }
}
