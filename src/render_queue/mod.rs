//! Render-thread task queue
//!
//! GPU resources may only be touched on the host's render thread. Work
//! originating elsewhere (session creation, teardown) is submitted here and
//! executed when the render thread calls [`RenderQueue::run_pending`].

use std::sync::mpsc::{channel, Receiver, Sender};

/// Work to run on the render thread
pub type RenderTask = Box<dyn FnOnce() + Send>;

/// Single-consumer queue, owned by the render thread
pub struct RenderQueue {
    sender: Sender<RenderTask>,
    receiver: Receiver<RenderTask>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { sender, receiver }
    }

    /// Handle for submitting tasks from any thread
    pub fn submitter(&self) -> RenderSubmitter {
        RenderSubmitter {
            sender: self.sender.clone(),
        }
    }

    /// Run every queued task. Returns the number run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable producer side of a [`RenderQueue`]
#[derive(Clone)]
pub struct RenderSubmitter {
    sender: Sender<RenderTask>,
}

impl RenderSubmitter {
    /// Queue `task`. Returns `false` if the render queue is gone.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.sender.send(Box::new(task)).is_ok()
    }
}
