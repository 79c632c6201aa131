use std::time::Duration;

use super::timers::{Scheduler, TimerId};

/// Trailing-edge debounce: every trigger cancels the pending timer and starts
/// a fresh one, so a burst collapses into one firing `delay` after the last
/// trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn trigger<K: Clone>(&mut self, scheduler: &mut Scheduler<K>, kind: K) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
        self.pending = Some(scheduler.schedule(kind, self.delay));
    }

    /// Claim a fired timer. Returns false for timers this debouncer no longer owns.
    pub fn fired(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<K: Clone>(&mut self, scheduler: &mut Scheduler<K>) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Periodic task that only keeps a timer alive while it has work.
///
/// The owner calls [`PeriodicTask::ensure_running`] when work arrives and
/// [`PeriodicTask::reschedule_if`] after each run; once the work is gone no
/// timer remains scheduled.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    interval: Duration,
    pending: Option<TimerId>,
}

impl PeriodicTask {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn ensure_running<K: Clone>(&mut self, scheduler: &mut Scheduler<K>, kind: K) {
        if self.pending.is_none_or(|id| !scheduler.is_pending(id)) {
            self.pending = Some(scheduler.schedule(kind, self.interval));
        }
    }

    pub fn fired(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Schedule the next run when `has_work`, otherwise go idle.
    pub fn reschedule_if<K: Clone>(&mut self, scheduler: &mut Scheduler<K>, kind: K, has_work: bool) {
        if has_work {
            self.ensure_running(scheduler, kind);
        } else {
            self.suspend(scheduler);
        }
    }

    pub fn suspend<K: Clone>(&mut self, scheduler: &mut Scheduler<K>) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }
}
