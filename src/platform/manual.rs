//! Hand-driven clock and scheduler
//!
//! Nothing here fires on its own: the owner advances time and delivers
//! frames by calling `CrashGraph::on_frame`. Used by tests and by the
//! headless native loop.

use std::cell::Cell;
use std::rc::Rc;

use crate::controller::{Clock, FrameHandle, Scheduler};

/// Clock whose time only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    /// Move time forward and return the new reading
    pub fn advance(&self, delta_ms: f64) -> f64 {
        let now = self.now.get() + delta_ms;
        self.now.set(now);
        now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Scheduler that only records which frames are outstanding
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    /// Total requests ever made
    pub requested: u64,
    /// Total cancellations ever made
    pub cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Mark the oldest outstanding frame as delivered
    pub fn fire(&mut self) -> Option<FrameHandle> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|h| *h != handle);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_clones_share_time() {
        let clock = ManualClock::new(5.0);
        let view = clock.clone();
        assert_eq!(clock.advance(10.0), 15.0);
        assert_eq!(view.now_ms(), 15.0);
        view.set(100.0);
        assert_eq!(clock.now_ms(), 100.0);
    }

    #[test]
    fn test_scheduler_request_and_cancel() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert_ne!(a, b);
        assert_eq!(scheduler.pending(), &[a, b]);

        scheduler.cancel_frame(a);
        scheduler.cancel_frame(a);
        assert_eq!(scheduler.cancelled, 1);
        assert_eq!(scheduler.fire(), Some(b));
        assert_eq!(scheduler.fire(), None);
        assert_eq!(scheduler.requested, 2);
    }
}
