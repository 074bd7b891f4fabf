//! Deterministic task queue for the timer.
//!
//! The queue runs on a virtual clock: nothing fires until the owner calls
//! [`TaskQueue::pop_due`] with an instant at or past a task's deadline.
//! Tests advance the clock directly; the async driver maps real elapsed
//! time onto it.
//!
//! Every scheduled task is identified by a [`TaskHandle`]. Cancelling a
//! handle removes the task, and a handle is never reused, so a consumer
//! that compares fired handles against the ones it currently owns can
//! always tell a live firing from a stale one.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a scheduled task is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// One-second countdown tick.
    Tick,
    /// Deferred return to idle after a completed session.
    CompletionHold,
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    id: u64,
    kind: TaskKind,
}

impl TaskHandle {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
struct Pending {
    kind: TaskKind,
    due: Duration,
    period: Option<Duration>,
}

/// Virtual-time queue of one-shot and periodic tasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<u64, Pending>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time, measured from queue creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule a task to fire once after `delay`.
    pub fn schedule_once(&mut self, kind: TaskKind, delay: Duration) -> TaskHandle {
        self.insert(kind, delay, None)
    }

    /// Schedule a task to fire every `period`, first after one period.
    ///
    /// A zero period is treated as one millisecond so the queue always
    /// makes progress.
    pub fn schedule_every(&mut self, kind: TaskKind, period: Duration) -> TaskHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(kind, period, Some(period))
    }

    /// Cancel a task. Returns `false` if it already fired (one-shot) or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.pending.remove(&handle.id).is_some()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.contains_key(&handle.id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.values().map(|p| p.due).min()
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// The clock moves to the task's deadline. Periodic tasks are re-armed
    /// one period later under the same handle. Ties fire in scheduling
    /// order. Callers should pop one task at a time and act on it before
    /// popping the next, since acting may cancel later tasks.
    pub fn pop_due(&mut self, until: Duration) -> Option<TaskHandle> {
        let (&id, pending) = self
            .pending
            .iter()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(id, p)| (p.due, **id))?;

        let (kind, due, period) = (pending.kind, pending.due, pending.period);
        self.now = self.now.max(due);

        match period {
            Some(period) => {
                if let Some(p) = self.pending.get_mut(&id) {
                    p.due = due + period;
                }
            }
            None => {
                self.pending.remove(&id);
            }
        }
        Some(TaskHandle { id, kind })
    }

    /// Move the clock forward without firing anything.
    ///
    /// The clock never runs backwards; an earlier instant is ignored.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn insert(&mut self, kind: TaskKind, delay: Duration, period: Option<Duration>) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(
            id,
            Pending {
                kind,
                due: self.now + delay,
                period,
            },
        );
        TaskHandle { id, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn one_shot_fires_once() {
        let mut q = TaskQueue::new();
        let h = q.schedule_once(TaskKind::CompletionHold, Duration::from_millis(1500));

        assert_eq!(q.pop_due(SEC), None);
        assert_eq!(q.pop_due(2 * SEC), Some(h));
        assert_eq!(q.now(), Duration::from_millis(1500));
        assert_eq!(q.pop_due(10 * SEC), None);
        assert!(q.is_empty());
    }

    #[test]
    fn periodic_rearms_under_same_handle() {
        let mut q = TaskQueue::new();
        let h = q.schedule_every(TaskKind::Tick, SEC);

        let fired: Vec<_> = std::iter::from_fn(|| q.pop_due(3 * SEC)).collect();
        assert_eq!(fired, vec![h, h, h]);
        assert_eq!(q.now(), 3 * SEC);
        assert_eq!(q.next_due(), Some(4 * SEC));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut q = TaskQueue::new();
        let h = q.schedule_every(TaskKind::Tick, SEC);
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert_eq!(q.pop_due(5 * SEC), None);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut q = TaskQueue::new();
        let first = q.schedule_every(TaskKind::Tick, SEC);
        q.cancel(first);
        let second = q.schedule_every(TaskKind::Tick, SEC);
        assert_ne!(first, second);
        assert!(!q.is_pending(first));
        assert!(q.is_pending(second));
    }

    #[test]
    fn earliest_deadline_fires_first() {
        let mut q = TaskQueue::new();
        let hold = q.schedule_once(TaskKind::CompletionHold, Duration::from_millis(1500));
        let tick = q.schedule_every(TaskKind::Tick, SEC);

        assert_eq!(q.pop_due(2 * SEC), Some(tick));
        assert_eq!(q.pop_due(2 * SEC), Some(hold));
        assert_eq!(q.pop_due(2 * SEC), Some(tick));
        assert_eq!(q.pop_due(2 * SEC), None);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut q = TaskQueue::new();
        q.set_now(5 * SEC);
        q.set_now(2 * SEC);
        assert_eq!(q.now(), 5 * SEC);

        let h = q.schedule_once(TaskKind::CompletionHold, SEC);
        assert_eq!(q.next_due(), Some(6 * SEC));
        assert_eq!(q.pop_due(6 * SEC), Some(h));
    }
}
