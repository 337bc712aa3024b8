//! Condition-variable manager with three waiter classes: plain workers
//! waiting on "something got pushed", sleepy claimants waiting on a
//! specific wake time, and a fixed pool of indexed conditional waiters
//! used by callers blocked on a predicate (`work_while_waiting`).
//!
//! The original used a `boost::shared_mutex` so waiters could register in
//! shared mode while a shutdown broadcaster took the exclusive lock to
//! guarantee no waiter goes to sleep after shutdown starts. `std` has no
//! condvar-compatible shared lock, so this is rebuilt on a single `Mutex`
//! guarding a `shutting_down` flag plus three condvars — shutdown still
//! only needs to flip the flag and broadcast all three under one lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct Shared {
    shutting_down: bool,
}

pub struct WaiterManager {
    shared: Mutex<Shared>,
    normal_cv: Condvar,
    sleepy_cv: Condvar,
    conditional: Vec<Mutex<bool>>,
    conditional_cv: Vec<Condvar>,
    conditional_is_waiting: Vec<AtomicBool>,
    num_normal_waiters: AtomicUsize,
    num_sleepy_waiters: AtomicUsize,
}

impl WaiterManager {
    pub fn new(num_conditional_slots: usize) -> Self {
        Self {
            shared: Mutex::new(Shared { shutting_down: false }),
            normal_cv: Condvar::new(),
            sleepy_cv: Condvar::new(),
            conditional: (0..num_conditional_slots).map(|_| Mutex::new(false)).collect(),
            conditional_cv: (0..num_conditional_slots).map(|_| Condvar::new()).collect(),
            conditional_is_waiting: (0..num_conditional_slots).map(|_| AtomicBool::new(false)).collect(),
            num_normal_waiters: AtomicUsize::new(0),
            num_sleepy_waiters: AtomicUsize::new(0),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.lock().unwrap_or_else(|e| e.into_inner()).shutting_down
    }

    /// Prioritizes normal workers over sleepy claimants over conditional
    /// waiters, falling through each class only if it currently has no
    /// parked waiter: plain task throughput matters more than waking a
    /// delayed task early, but a notification must never be wasted on an
    /// empty class while another class is actually waiting.
    pub fn notify_one(&self) {
        if self.num_normal_waiters.load(Ordering::Relaxed) > 0 {
            self.normal_cv.notify_one();
            return;
        }
        if self.num_sleepy_waiters.load(Ordering::Relaxed) > 0 {
            self.sleepy_cv.notify_one();
            return;
        }
        for (idx, waiting) in self.conditional_is_waiting.iter().enumerate() {
            if waiting.load(Ordering::Relaxed) {
                self.conditional_cv[idx].notify_one();
                break;
            }
        }
    }

    pub fn notify_sleepy(&self) {
        self.sleepy_cv.notify_one();
    }

    pub fn notify_conditional(&self, idx: usize) {
        if let Some(flag) = self.conditional.get(idx) {
            *flag.lock().unwrap_or_else(|e| e.into_inner()) = true;
            self.conditional_cv[idx].notify_all();
        }
    }

    pub fn notify_all(&self) {
        self.normal_cv.notify_all();
        self.sleepy_cv.notify_all();
        for cv in &self.conditional_cv {
            cv.notify_all();
        }
    }

    /// Blocks a worker until woken or `max_wait` elapses. Returns `true`
    /// if woken by a notification, `false` on timeout.
    pub fn wait_normal(&self, max_wait: Duration) -> bool {
        let guard = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if guard.shutting_down {
            return true;
        }
        self.num_normal_waiters.fetch_add(1, Ordering::Relaxed);
        let (_, timeout) = self
            .normal_cv
            .wait_timeout(guard, max_wait)
            .unwrap_or_else(|e| e.into_inner());
        self.num_normal_waiters.fetch_sub(1, Ordering::Relaxed);
        !timeout.timed_out()
    }

    /// Blocks a sleepy claimant until `wake_at` or shutdown.
    pub fn wait_sleepy_until(&self, wake_at: Instant) {
        let guard = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        if guard.shutting_down {
            return;
        }
        let now = Instant::now();
        if wake_at <= now {
            return;
        }
        self.num_sleepy_waiters.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .sleepy_cv
            .wait_timeout(guard, wake_at - now)
            .unwrap_or_else(|e| e.into_inner());
        self.num_sleepy_waiters.fetch_sub(1, Ordering::Relaxed);
    }

    /// Re-checks `predicate` under the conditional slot's own lock before
    /// and after waiting, so a notification that lands between the
    /// caller's check and the wait is never missed.
    pub fn conditional_wait<F: Fn() -> bool>(&self, idx: usize, max_wait: Duration, predicate: F) {
        let Some(flag_lock) = self.conditional.get(idx) else { return };
        let mut guard = flag_lock.lock().unwrap_or_else(|e| e.into_inner());
        while !*guard && !predicate() {
            if self.is_shutting_down() {
                return;
            }
            self.conditional_is_waiting[idx].store(true, Ordering::Relaxed);
            let (g, timeout) = self.conditional_cv[idx]
                .wait_timeout(guard, max_wait)
                .unwrap_or_else(|e| e.into_inner());
            self.conditional_is_waiting[idx].store(false, Ordering::Relaxed);
            guard = g;
            if timeout.timed_out() {
                break;
            }
        }
        *guard = false;
    }

    pub fn shut_down(&self) {
        let mut guard = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        guard.shutting_down = true;
        drop(guard);
        self.notify_all();
    }
}
