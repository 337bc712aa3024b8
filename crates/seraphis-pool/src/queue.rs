//! Bounded task queues. `TaskQueue` is a direct translation of the
//! original mutex + deque + condvar `TaskQueue` class: one lock guards
//! both the backing deque and the `shutting_down` flag so a push can
//! never race a shutdown into the queue. `SleepyTaskQueue` is new code —
//! the original left its sleepy-task queue as a stub, so this one is
//! built from the delayed-task description of the scheduling design
//! instead of translated line for line.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Instant;

use crate::task::SleepyTask;

/// Outcome of a queue operation. Used only for local steering inside the
/// pool — never surfaced through the pool's public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueResult {
    Success,
    QueueFull,
    QueueEmpty,
    TryLockFail,
    ShuttingDown,
}

struct Inner<T> {
    deque: VecDeque<T>,
    shutting_down: bool,
}

/// A single (priority, worker) queue slot.
pub struct TaskQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    max_size: usize,
}

impl<T> TaskQueue<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { deque: VecDeque::new(), shutting_down: false }),
            not_empty: Condvar::new(),
            max_size,
        }
    }

    /// Non-blocking push. Fails with `TryLockFail` if the lock is
    /// contended, `ShuttingDown` if the pool is tearing down, or
    /// `QueueFull` if the soft cap is already reached.
    pub fn try_push(&self, task: T) -> (QueueResult, Option<T>) {
        match self.inner.try_lock() {
            Ok(mut guard) => {
                if guard.shutting_down {
                    return (QueueResult::ShuttingDown, Some(task));
                }
                if guard.deque.len() >= self.max_size {
                    return (QueueResult::QueueFull, Some(task));
                }
                guard.deque.push_back(task);
                drop(guard);
                self.not_empty.notify_one();
                (QueueResult::Success, None)
            }
            Err(_) => (QueueResult::TryLockFail, Some(task)),
        }
    }

    /// Blocking push that ignores the soft cap — used when every queue in
    /// a submission cycle reported `QueueFull`/`TryLockFail` and the
    /// caller must not drop the task.
    pub fn force_push(&self, task: T) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.deque.push_back(task);
        drop(guard);
        self.not_empty.notify_one();
    }

    /// Pushes, then immediately pops the oldest entry back out under the
    /// same critical section. Used for the in-line fallback: a caller
    /// that could not hand a task to any worker queue executes it itself.
    pub fn force_push_pop(&self, task: T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.deque.push_back(task);
        guard.deque.pop_front().expect("just pushed")
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> (QueueResult, Option<T>) {
        match self.inner.try_lock() {
            Ok(mut guard) => match guard.deque.pop_front() {
                Some(t) => (QueueResult::Success, Some(t)),
                None => {
                    if guard.shutting_down {
                        (QueueResult::ShuttingDown, None)
                    } else {
                        (QueueResult::QueueEmpty, None)
                    }
                }
            },
            Err(_) => (QueueResult::TryLockFail, None),
        }
    }

    /// Blocks until an item is available or the queue shuts down.
    pub fn force_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(t) = guard.deque.pop_front() {
                return Some(t);
            }
            if guard.shutting_down {
                return None;
            }
            guard = self
                .not_empty
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Marks the queue as shutting down and wakes every blocked popper.
    /// Queued tasks are left in place so workers can drain them.
    pub fn shut_down(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.shutting_down = true;
        drop(guard);
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).deque.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-worker store of delayed tasks. Claiming is a two-step dance:
/// find the smallest unclaimed wake time, then atomically flip its
/// status from `Unclaimed` to `Reserved` so exactly one worker owns it.
pub struct SleepyTaskQueue {
    tasks: Mutex<Vec<SleepyTask>>,
}

impl SleepyTaskQueue {
    pub fn new() -> Self {
        Self { tasks: Mutex::new(Vec::new()) }
    }

    pub fn push(&self, task: SleepyTask) {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).push(task);
    }

    /// Returns the wake instant of the task with the smallest wake time
    /// that is still unclaimed, without reserving it.
    pub fn next_wake_instant(&self) -> Option<Instant> {
        let guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .iter()
            .filter(|t| matches!(t.status.load(), crate::task::SleepyTaskStatus::Unclaimed))
            .map(|t| t.wake_time.instant())
            .min()
    }

    /// Attempts to claim the unclaimed task with the smallest wake time.
    /// Returns its index and wake instant on success; the task stays in
    /// the vector (now `Reserved`) until maintenance removes it.
    pub fn claim_earliest(&self) -> Option<(usize, Instant)> {
        let guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let mut best: Option<(usize, Instant)> = None;
        for (i, t) in guard.iter().enumerate() {
            if !matches!(t.status.load(), crate::task::SleepyTaskStatus::Unclaimed) {
                continue;
            }
            let wake = t.wake_time.instant();
            if best.map(|(_, w)| wake < w).unwrap_or(true) {
                best = Some((i, wake));
            }
        }
        let (idx, wake) = best?;
        if guard[idx].status.try_reserve() {
            Some((idx, wake))
        } else {
            None
        }
    }

    pub fn release(&self, idx: usize) {
        let guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = guard.get(idx) {
            t.status.release_to_unclaimed();
        }
    }

    pub fn mark_dead(&self, idx: usize) {
        let guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(t) = guard.get(idx) {
            t.status.mark_dead();
        }
    }

    /// Pulls the task out of the vector (reserved tasks only) for the
    /// caller to run. Leaves a `Dead` placeholder behind if the slot is
    /// needed for indices elsewhere — here we just swap-remove since
    /// nothing else indexes by position across calls.
    pub fn take(&self, idx: usize) -> Option<SimpleTaskHandle> {
        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        if idx >= guard.len() {
            return None;
        }
        let task = guard.swap_remove(idx);
        Some(SimpleTaskHandle(task.task))
    }

    /// Removes every dead entry and force-wakes any sleeping claimant of
    /// an `Unclaimed` task whose wake time has passed by zeroing it — the
    /// caller (the pool's shutdown path) is expected to re-poll after.
    pub fn force_wake_all(&self) {
        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for t in guard.iter_mut() {
            t.wake_time.zero();
        }
    }

    pub fn retain_live(&self) {
        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|t| !matches!(t.status.load(), crate::task::SleepyTaskStatus::Dead));
    }
}

impl Default for SleepyTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Thin wrapper so callers don't need to reach into `task` module internals
/// to pull a runnable task back out of a claimed sleepy slot.
pub struct SimpleTaskHandle(pub crate::task::SimpleTask);
