//! Task variants handled by the pool: one-shot closures, sleepy
//! (delayed) closures, and scope-exit notifications.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// A boxed unit of work. Returning `TaskVariant::Simple` chains a
/// continuation onto the pool instead of recursing on the caller's stack.
pub type TaskFn = Box<dyn FnOnce() -> TaskVariant + Send + 'static>;

/// A task plus the priority level it was submitted at.
pub struct SimpleTask {
    pub priority: u8,
    pub task: TaskFn,
}

impl SimpleTask {
    pub fn new(priority: u8, task: impl FnOnce() -> TaskVariant + Send + 'static) -> Self {
        Self { priority, task: Box::new(task) }
    }

    pub fn run(self) -> TaskVariant {
        (self.task)()
    }
}

/// The instant a sleepy task becomes eligible to run: `start_time + duration`.
/// `start_time` defaults to the moment the sleepy task was constructed.
#[derive(Clone, Copy)]
pub struct WakeTime {
    pub start_time: Instant,
    pub duration: Duration,
}

impl WakeTime {
    pub fn from_now(duration: Duration) -> Self {
        Self { start_time: Instant::now(), duration }
    }

    pub fn instant(&self) -> Instant {
        self.start_time + self.duration
    }

    /// Forces the wake time into the past, used by shutdown to force-wake
    /// every sleeping claimant immediately.
    pub fn zero(&mut self) {
        self.duration = Duration::ZERO;
    }
}

/// Lifecycle of a sleepy task sitting in a [`crate::queue::SleepyTaskQueue`].
/// Transitions are `Unclaimed -> Reserved -> Dead`, driven by atomic
/// compare-exchange so exactly one worker claims a given task.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepyTaskStatus {
    Unclaimed = 0,
    Reserved = 1,
    Dead = 2,
}

impl SleepyTaskStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SleepyTaskStatus::Unclaimed,
            1 => SleepyTaskStatus::Reserved,
            _ => SleepyTaskStatus::Dead,
        }
    }
}

/// Atomic wrapper so the claim/wake/maintenance dance can run without a
/// queue-wide lock held for the whole operation.
pub struct AtomicSleepyStatus(AtomicU8);

impl AtomicSleepyStatus {
    pub fn new(status: SleepyTaskStatus) -> Self {
        Self(AtomicU8::new(status as u8))
    }

    pub fn load(&self) -> SleepyTaskStatus {
        SleepyTaskStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Attempts `Unclaimed -> Reserved`. Returns `true` if this caller won
    /// the claim.
    pub fn try_reserve(&self) -> bool {
        self.0
            .compare_exchange(
                SleepyTaskStatus::Unclaimed as u8,
                SleepyTaskStatus::Reserved as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn release_to_unclaimed(&self) {
        self.0.store(SleepyTaskStatus::Unclaimed as u8, Ordering::Release);
    }

    pub fn mark_dead(&self) {
        self.0.store(SleepyTaskStatus::Dead as u8, Ordering::Release);
    }
}

pub struct SleepyTask {
    pub task: SimpleTask,
    pub wake_time: WakeTime,
    pub status: AtomicSleepyStatus,
}

impl SleepyTask {
    pub fn new(task: SimpleTask, wake_time: WakeTime) -> Self {
        Self { task, wake_time, status: AtomicSleepyStatus::new(SleepyTaskStatus::Unclaimed) }
    }
}

/// Fires a closure exactly once when dropped, regardless of which exit
/// path (normal return, early return, or unwind) was taken. A panic
/// inside the closure is caught so it can't poison unrelated drop glue.
pub struct ScopedNotification {
    notify: Option<Box<dyn FnOnce() + Send>>,
}

impl ScopedNotification {
    pub fn new(notify: impl FnOnce() + Send + 'static) -> Self {
        Self { notify: Some(Box::new(notify)) }
    }
}

impl Drop for ScopedNotification {
    fn drop(&mut self) {
        if let Some(notify) = self.notify.take() {
            let _ = catch_unwind(AssertUnwindSafe(notify));
        }
    }
}

/// The three things that can occupy a pool slot, plus an empty marker used
/// by `try_pop`/`force_pop` when a queue has nothing to hand back.
pub enum TaskVariant {
    Simple(SimpleTask),
    Sleepy(SleepyTask),
    Notification(ScopedNotification),
    Empty,
}

impl From<SimpleTask> for TaskVariant {
    fn from(t: SimpleTask) -> Self {
        TaskVariant::Simple(t)
    }
}
