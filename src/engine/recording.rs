//! In-process engine that records every command
//!
//! Used by the demo binary, integration tests and benchmarks in place of a
//! real engine binding.

use std::sync::{Arc, Mutex, MutexGuard};

use super::BrowserEngine;
use crate::drag::{DragData, DragOperations};
use crate::input::{EventFlags, KeyEvent, MouseEvent, WheelEvent};

/// A command received by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Mouse(MouseEvent),
    Wheel(WheelEvent),
    Key(KeyEvent),
    Resized {
        width: u32,
        height: u32,
    },
    DragEnter {
        x: i32,
        y: i32,
        modifiers: EventFlags,
        allowed: DragOperations,
    },
    DragOver {
        x: i32,
        y: i32,
        allowed: DragOperations,
    },
    Drop {
        x: i32,
        y: i32,
        modifiers: EventFlags,
    },
    DragLeave,
    Reload,
    SetZoom(f64),
    GoBack,
    GoForward,
    Close,
}

#[derive(Debug, Default)]
struct Recorded {
    commands: Vec<EngineCommand>,
    zoom_level: f64,
    history_back: usize,
    history_forward: usize,
}

/// Engine double. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    state: Arc<Mutex<Recorded>>,
}

impl RecordingEngine {
    /// Create an engine with empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that can go back `back` times and forward `forward` times
    pub fn with_history(back: usize, forward: usize) -> Self {
        let engine = Self::new();
        {
            let mut state = engine.lock();
            state.history_back = back;
            state.history_forward = forward;
        }
        engine
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, command: EngineCommand) {
        log::trace!("engine <- {:?}", command);
        self.lock().commands.push(command);
    }

    /// Everything received so far
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.lock().commands.clone()
    }

    /// Pop all recorded commands
    pub fn drain(&self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.lock().commands)
    }

    /// Number of recorded commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&EngineCommand) -> bool) -> usize {
        self.lock().commands.iter().filter(|c| predicate(c)).count()
    }
}

impl BrowserEngine for RecordingEngine {
    fn send_mouse_event(&mut self, event: MouseEvent) {
        self.record(EngineCommand::Mouse(event));
    }

    fn send_wheel_event(&mut self, event: WheelEvent) {
        self.record(EngineCommand::Wheel(event));
    }

    fn send_key_event(&mut self, event: KeyEvent) {
        self.record(EngineCommand::Key(event));
    }

    fn was_resized(&mut self, width: u32, height: u32) {
        self.record(EngineCommand::Resized { width, height });
    }

    fn drag_target_drag_enter(
        &mut self,
        _data: &DragData,
        x: i32,
        y: i32,
        modifiers: EventFlags,
        allowed: DragOperations,
    ) {
        self.record(EngineCommand::DragEnter {
            x,
            y,
            modifiers,
            allowed,
        });
    }

    fn drag_target_drag_over(&mut self, x: i32, y: i32, _modifiers: EventFlags, allowed: DragOperations) {
        self.record(EngineCommand::DragOver { x, y, allowed });
    }

    fn drag_target_drop(&mut self, x: i32, y: i32, modifiers: EventFlags) {
        self.record(EngineCommand::Drop { x, y, modifiers });
    }

    fn drag_target_drag_leave(&mut self) {
        self.record(EngineCommand::DragLeave);
    }

    fn reload(&mut self) {
        self.record(EngineCommand::Reload);
    }

    fn zoom_level(&self) -> f64 {
        self.lock().zoom_level
    }

    fn set_zoom_level(&mut self, level: f64) {
        self.lock().zoom_level = level;
        self.record(EngineCommand::SetZoom(level));
    }

    fn can_go_back(&self) -> bool {
        self.lock().history_back > 0
    }

    fn can_go_forward(&self) -> bool {
        self.lock().history_forward > 0
    }

    fn go_back(&mut self) {
        {
            let mut state = self.lock();
            state.history_back = state.history_back.saturating_sub(1);
            state.history_forward += 1;
        }
        self.record(EngineCommand::GoBack);
    }

    fn go_forward(&mut self) {
        {
            let mut state = self.lock();
            state.history_forward = state.history_forward.saturating_sub(1);
            state.history_back += 1;
        }
        self.record(EngineCommand::GoForward);
    }

    fn close(&mut self) {
        self.record(EngineCommand::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let engine = RecordingEngine::new();
        let mut handle = engine.clone();
        handle.reload();
        handle.was_resized(10, 20);

        assert_eq!(
            engine.commands(),
            vec![
                EngineCommand::Reload,
                EngineCommand::Resized {
                    width: 10,
                    height: 20
                }
            ]
        );
        assert_eq!(engine.drain().len(), 2);
        assert!(engine.commands().is_empty());
    }

    #[test]
    fn test_history_navigation() {
        let mut engine = RecordingEngine::with_history(1, 0);
        assert!(engine.can_go_back());
        assert!(!engine.can_go_forward());

        engine.go_back();
        assert!(!engine.can_go_back());
        assert!(engine.can_go_forward());
    }
}
