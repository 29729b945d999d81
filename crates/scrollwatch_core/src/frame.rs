//! Next-frame work queue
//!
//! Work that must not run inside the callback that discovered it (for
//! example rebuilding watchers while their entries are still being
//! iterated) is queued here and drained by the host's next animation frame.
//! Tasks are plain values, consumed by whoever owns the state they touch,
//! the same way pending scroll commands are taken by a renderer each frame.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Queue of deferred tasks, drained once per animation frame
///
/// Requesting a task that is already queued is a no-op, so a burst of
/// identical requests inside one frame collapses to one execution.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    queue: RefCell<VecDeque<T>>,
    frames: Cell<u64>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            frames: Cell::new(0),
        }
    }
}

impl<T: PartialEq + std::fmt::Debug> FrameScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` for the next frame
    ///
    /// Returns false if an equal task is already waiting.
    pub fn request(&self, task: T) -> bool {
        let mut queue = self.queue.borrow_mut();
        if queue.contains(&task) {
            return false;
        }
        tracing::trace!(?task, "frame task queued");
        queue.push_back(task);
        true
    }

    /// Drain every task queued before this call and advance the frame counter
    ///
    /// Tasks requested while the returned batch is being processed land in
    /// the following frame.
    pub fn take_frame(&self) -> Vec<T> {
        self.frames.set(self.frames.get() + 1);
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Drop a queued task without running it
    pub fn cancel(&self, task: &T) -> bool {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|t| t != task);
        queue.len() != before
    }

    pub fn is_pending(&self, task: &T) -> bool {
        self.queue.borrow().contains(task)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Number of frames processed so far
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }
}
