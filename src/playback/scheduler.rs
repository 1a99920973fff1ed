use std::collections::VecDeque;
use std::time::Duration;

/// Identifies one scheduled tick. Handles are never reused by a scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TickHandle(pub u64);

/// Deferred-callback service supplied by the host (a browser timer, an event loop, a test).
///
/// Contract: after `schedule` returns `h`, the host eventually delivers `h` back to the widget
/// exactly once, unless `cancel(h)` was called first.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

/// Scheduler that only records requests; ticks are delivered by whoever drives it.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<(TickHandle, Duration)>,
    scheduled: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests not yet delivered or cancelled.
    pub fn pending(&self) -> impl Iterator<Item = &(TickHandle, Duration)> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return the oldest outstanding request.
    pub fn next_due(&mut self) -> Option<(TickHandle, Duration)> {
        self.queue.pop_front()
    }

    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        self.scheduled += 1;
        self.queue.push_back((handle, delay));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let before = self.queue.len();
        self.queue.retain(|(h, _)| *h != handle);
        if self.queue.len() != before {
            self.cancelled += 1;
        }
    }
}

/// Blocking scheduler for command-line playback: waiting for the next tick sleeps for its delay.
#[derive(Debug, Default)]
pub struct SleepScheduler {
    inner: ManualScheduler,
    realtime: bool,
}

impl SleepScheduler {
    /// With `realtime == false` delays are recorded but not slept.
    pub fn new(realtime: bool) -> Self {
        Self {
            inner: ManualScheduler::new(),
            realtime,
        }
    }

    pub fn wait_next(&mut self) -> Option<TickHandle> {
        let (handle, delay) = self.inner.next_due()?;
        if self.realtime && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Some(handle)
    }
}

impl Scheduler for SleepScheduler {
    fn schedule(&mut self, delay: Duration) -> TickHandle {
        self.inner.schedule(delay)
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.inner.cancel(handle);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
