use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<K> {
    due_ms: u64,
    kind: K,
}

/// One-shot timers keyed by a caller-defined kind, fired by advancing the clock.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer<K>>,
}

impl<K: Clone> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            timers: BTreeMap::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, kind: K, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.timers.insert(
            id,
            Timer {
                due_ms: self.now_ms.saturating_add(delay_ms),
                kind,
            },
        );
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn active(&self) -> usize {
        self.timers.len()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Move the clock to `now_ms` (never backwards) and pop every timer that
    /// came due, earliest first. Ties fire in scheduling order.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<(TimerId, K)> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut due: Vec<(u64, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.due_ms <= self.now_ms)
            .map(|(id, t)| (t.due_ms, *id))
            .collect();
        due.sort_unstable();
        due.into_iter()
            .filter_map(|(_, id)| self.timers.remove(&id).map(|t| (id, t.kind)))
            .collect()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<u64> {
        self.timers.values().map(|t| t.due_ms).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn fires_in_due_order() {
        let mut sched = Scheduler::new();
        sched.schedule(Kind::B, Duration::from_millis(20));
        sched.schedule(Kind::A, Duration::from_millis(10));
        let fired: Vec<Kind> = sched.advance_to(25).into_iter().map(|(_, k)| k).collect();
        assert_eq!(fired, vec![Kind::A, Kind::B]);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn not_yet_due_timers_stay_pending() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(Kind::A, Duration::from_millis(100));
        assert!(sched.advance_to(99).is_empty());
        assert!(sched.is_pending(id));
        assert_eq!(sched.next_due(), Some(100));
        assert_eq!(sched.advance_to(100).len(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut sched = Scheduler::new();
        let id = sched.schedule(Kind::A, Duration::from_millis(5));
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(sched.advance_to(10).is_empty());
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut sched: Scheduler<Kind> = Scheduler::new();
        sched.advance_to(50);
        sched.advance_to(10);
        assert_eq!(sched.now_ms(), 50);
        sched.schedule(Kind::A, Duration::from_millis(5));
        assert_eq!(sched.next_due(), Some(55));
    }
}
