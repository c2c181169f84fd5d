#![forbid(unsafe_code)]

//! Cancellable deferred tasks driven by frame timestamps.
//!
//! The pipeline has no background thread. Deferred actions (drag release
//! grace, click cooldown expiry, hold-to-edit) are registered with a
//! [`Scheduler`] and fire when a later frame calls
//! [`drain_due`](Scheduler::drain_due) with a timestamp at or past their
//! deadline.
//!
//! # Invariants
//!
//! 1. A cancelled task never fires.
//! 2. Each scheduled task fires at most once.
//! 3. Due tasks are returned in deadline order; equal deadlines keep
//!    scheduling order.
//! 4. After [`cancel_all`](Scheduler::cancel_all), nothing fires until new
//!    tasks are scheduled.
//!
//! Handles are never reused, so a stale handle cannot cancel a newer task.

use web_time::Instant;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TimerHandle,
    deadline: Instant,
    task: T,
}

/// A small set of pending deadline tasks.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::with_capacity(4),
        }
    }

    /// Register `task` to fire at `deadline`.
    pub fn schedule(&mut self, deadline: Instant, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            deadline,
            task,
        });
        handle
    }

    /// Cancel a pending task, returning it if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let idx = self.pending.iter().position(|s| s.handle == handle)?;
        Some(self.pending.remove(idx).task)
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    /// Cancel every pending task. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    /// Remove and return every task whose deadline is `<= now`.
    pub fn drain_due(&mut self, now: Instant) -> Vec<(TimerHandle, T)> {
        if !self.pending.iter().any(|s| s.deadline <= now) {
            return Vec::new();
        }
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|s| s.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|s| (s.deadline, s.handle));
        due.into_iter().map(|s| (s.handle, s.task)).collect()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|s| s.deadline).min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
