//! The thread pool itself: a grid of (priority, worker) queues plus a
//! per-worker sleepy queue, workers that scan their own queue column
//! highest-priority-first, and a submission path that cycles queues
//! before ever blocking.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use seraphis_types::PoolConfig;

use crate::queue::{QueueResult, SleepyTaskQueue, TaskQueue};
use crate::task::{SimpleTask, SleepyTask, TaskVariant, WakeTime};
use crate::waiter::WaiterManager;

thread_local! {
    static WORKER_ID: Cell<Option<usize>> = Cell::new(None);
    static CALL_STACK_DEPTH: Cell<u32> = Cell::new(0);
}

struct PoolInner {
    num_priority_levels: usize,
    num_workers: usize,
    /// `queues[priority][worker]`.
    queues: Vec<Vec<TaskQueue<SimpleTask>>>,
    sleepy_queues: Vec<SleepyTaskQueue>,
    waiter: WaiterManager,
    submission_counter: AtomicU64,
    shutting_down: AtomicBool,
    num_submit_cycle_attempts: usize,
    max_wait: Duration,
    in_line_executions: AtomicU64,
}

impl PoolInner {
    fn clamp_priority(&self, priority: u8) -> usize {
        (priority as usize).min(self.num_priority_levels - 1)
    }

    fn next_index(&self) -> usize {
        (self.submission_counter.fetch_add(1, Ordering::Relaxed) as usize) % self.num_workers
    }

    fn try_pop_any_priority(&self, worker_index: usize) -> Option<SimpleTask> {
        for priority in 0..self.num_priority_levels {
            let (result, task) = self.queues[priority][worker_index].try_pop();
            if result == QueueResult::Success {
                return task;
            }
        }
        None
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    fn all_queues_empty(&self, worker_index: usize) -> bool {
        (0..self.num_priority_levels).all(|p| self.queues[p][worker_index].is_empty())
    }

    /// Submits a ready-to-run task, cycling across worker queues with
    /// try-lock pushes before falling back to an in-line push-pop.
    fn submit_simple(&self, task: SimpleTask) {
        let priority = self.clamp_priority(task.priority);
        let attempts = self.num_submit_cycle_attempts * self.num_workers;
        let mut task = task;
        for _ in 0..attempts {
            let idx = self.next_index();
            match self.queues[priority][idx].try_push(task) {
                (QueueResult::Success, None) => {
                    self.waiter.notify_one();
                    return;
                }
                (_, Some(rejected)) => task = rejected,
                (_, None) => unreachable!(),
            }
        }
        // Every queue reported full/contended: execute in line rather than
        // drop the task, bounding recursion by running through a loop.
        self.in_line_executions.fetch_add(1, Ordering::Relaxed);
        let idx = self.next_index();
        let ready = self.queues[priority][idx].force_push_pop(task);
        CALL_STACK_DEPTH.with(|d| d.set(d.get() + 1));
        self.execute_and_chain(ready);
        CALL_STACK_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }

    fn submit_sleepy(&self, sleepy: SleepyTask) {
        if sleepy.wake_time.instant() <= Instant::now() {
            self.submit_simple(sleepy.task);
            return;
        }
        let idx = self.next_index();
        self.sleepy_queues[idx].push(sleepy);
        self.waiter.notify_sleepy();
    }

    /// Runs `task`, then loops on whatever continuation it returns instead
    /// of recursing, so a long continuation chain costs one stack frame.
    fn execute_and_chain(&self, task: SimpleTask) {
        let mut current = task;
        loop {
            match current.run() {
                TaskVariant::Simple(next) => current = next,
                TaskVariant::Sleepy(sleepy) => {
                    self.submit_sleepy(sleepy);
                    return;
                }
                TaskVariant::Notification(_) => return,
                TaskVariant::Empty => return,
            }
        }
    }

    /// Drops dead sleepy-task slots for `worker_index` and force-submits
    /// any that are due, bypassing the normal queue-full back-pressure.
    fn sleepy_maintenance(&self, worker_index: usize) {
        self.sleepy_queues[worker_index].retain_live();
    }

    fn worker_loop(&self, worker_index: usize) {
        WORKER_ID.with(|id| id.set(Some(worker_index)));
        loop {
            if let Some(task) = self.try_pop_any_priority(worker_index) {
                self.execute_and_chain(task);
                self.sleepy_maintenance(worker_index);
                continue;
            }

            if let Some((idx, wake)) = self.sleepy_queues[worker_index].claim_earliest() {
                if wake <= Instant::now() {
                    if let Some(handle) = self.sleepy_queues[worker_index].take(idx) {
                        self.execute_and_chain(handle.0);
                    }
                    continue;
                }
                self.waiter.wait_sleepy_until(wake);
                self.sleepy_queues[worker_index].release(idx);
                continue;
            }

            let woken = self.waiter.wait_normal(self.max_wait);
            if !woken && self.is_shutting_down() && self.all_queues_empty(worker_index) {
                return;
            }
            if self.is_shutting_down()
                && self.all_queues_empty(worker_index)
                && self.sleepy_queues[worker_index].next_wake_instant().is_none()
            {
                return;
            }
        }
    }
}

/// A fixed-size pool of worker threads serving priority-stratified task
/// queues. Construct with [`ThreadPool::new`], submit work with
/// [`ThreadPool::submit`], and call [`ThreadPool::shut_down`] to drain and
/// join every worker.
pub struct ThreadPool {
    inner: Arc<PoolInner>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    /// `num_workers` excludes the pool owner's own thread, which can also
    /// drain tasks via [`ThreadPool::work_while_waiting`] without being a
    /// dedicated worker.
    pub fn new(config: PoolConfig, num_workers: usize) -> Self {
        let num_workers = num_workers.max(1);
        let queues = (0..config.num_priority_levels)
            .map(|_| (0..num_workers).map(|_| TaskQueue::new(config.max_queue_size)).collect())
            .collect();
        let sleepy_queues = (0..num_workers).map(|_| SleepyTaskQueue::new()).collect();

        let inner = Arc::new(PoolInner {
            num_priority_levels: config.num_priority_levels,
            num_workers,
            queues,
            sleepy_queues,
            waiter: WaiterManager::new(num_workers.max(1)),
            submission_counter: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            num_submit_cycle_attempts: config.num_submit_cycle_attempts,
            max_wait: Duration::from_millis(200),
            in_line_executions: AtomicU64::new(0),
        });

        let workers = (0..num_workers)
            .map(|i| {
                let inner = Arc::clone(&inner);
                thread::Builder::new()
                    .name(format!("seraphis-pool-{i}"))
                    .spawn(move || inner.worker_loop(i))
                    .expect("failed to spawn pool worker thread")
            })
            .collect();

        Self { inner, workers: Mutex::new(workers) }
    }

    /// Default worker count: all cores but one, floored at one, matching
    /// the miner's own `num_cpus::get().saturating_sub(1)` convention.
    pub fn default_worker_count() -> usize {
        std::cmp::max(1, num_cpus::get().saturating_sub(1))
    }

    pub fn submit(&self, priority: u8, task: impl FnOnce() -> TaskVariant + Send + 'static) {
        self.inner.submit_simple(SimpleTask::new(priority, task));
    }

    pub fn submit_after(
        &self,
        priority: u8,
        delay: Duration,
        task: impl FnOnce() -> TaskVariant + Send + 'static,
    ) {
        let sleepy = SleepyTask::new(SimpleTask::new(priority, task), WakeTime::from_now(delay));
        self.inner.submit_sleepy(sleepy);
    }

    pub fn current_worker_id() -> Option<usize> {
        WORKER_ID.with(|id| id.get())
    }

    pub fn current_call_stack_depth() -> u32 {
        CALL_STACK_DEPTH.with(|d| d.get())
    }

    /// Number of tasks that took the queue-full in-line execution path
    /// (every worker queue reported full/contended on submission).
    pub fn in_line_execution_count(&self) -> u64 {
        self.inner.in_line_executions.load(Ordering::Relaxed)
    }

    /// Lets the caller's own thread drain queued tasks until `predicate`
    /// returns true, instead of blocking idle. This is the pool's
    /// cancellation surface: callers that need to abandon a wait check a
    /// shared `Arc<AtomicBool>` from inside `predicate`.
    pub fn work_while_waiting(&self, conditional_slot: usize, predicate: impl Fn() -> bool) {
        while !predicate() {
            let mut ran = false;
            for worker in 0..self.inner.num_workers {
                if let Some(task) = self.inner.try_pop_any_priority(worker) {
                    self.inner.execute_and_chain(task);
                    ran = true;
                    break;
                }
            }
            if ran {
                continue;
            }
            if self.inner.is_shutting_down() {
                return;
            }
            self.inner
                .waiter
                .conditional_wait(conditional_slot, Duration::from_millis(20), &predicate);
        }
    }

    /// Flags shutdown, force-wakes every sleeping sleepy claimant, and
    /// joins workers once their queues have drained.
    pub fn shut_down(&self) {
        self.inner.shutting_down.store(true, Ordering::Release);
        for priority in 0..self.inner.num_priority_levels {
            for worker in 0..self.inner.num_workers {
                self.inner.queues[priority][worker].shut_down();
            }
        }
        for sleepy in &self.inner.sleepy_queues {
            sleepy.force_wake_all();
        }
        self.inner.waiter.shut_down();

        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if !self.inner.is_shutting_down() {
            self.shut_down();
        }
    }
}
