//! A priority-stratified, multi-worker task pool: bounded per-(priority,
//! worker) queues with try-lock submission cycling, a per-worker sleepy
//! queue for delayed work, and a cancellation-flag based
//! `work_while_waiting` escape hatch for callers blocked on pool-driven
//! progress.

pub mod pool;
pub mod queue;
pub mod task;
pub mod waiter;

pub use pool::ThreadPool;
pub use queue::{QueueResult, SleepyTaskQueue, TaskQueue};
pub use task::{
    AtomicSleepyStatus, ScopedNotification, SimpleTask, SleepyTask, SleepyTaskStatus, TaskVariant,
    WakeTime,
};
pub use waiter::WaiterManager;

#[cfg(test)]
mod tests {
    use super::*;
    use seraphis_types::PoolConfig;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn submitted_tasks_all_run() {
        let pool = ThreadPool::new(PoolConfig::default(), 2);
        let counter = Arc::new(AtomicU32::new(0));
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(0, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                TaskVariant::Empty
            });
        }
        let done = Arc::clone(&counter);
        pool.work_while_waiting(0, move || done.load(Ordering::SeqCst) >= 50);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        pool.shut_down();
    }

    #[test]
    fn continuation_chain_runs_without_recursing() {
        let pool = ThreadPool::new(PoolConfig::default(), 1);
        let hops = Arc::new(AtomicU32::new(0));
        fn make_link(hops: Arc<AtomicU32>, remaining: u32) -> TaskVariant {
            hops.fetch_add(1, Ordering::SeqCst);
            if remaining == 0 {
                TaskVariant::Empty
            } else {
                TaskVariant::Simple(SimpleTask::new(0, move || make_link(hops, remaining - 1)))
            }
        }
        let hops_clone = Arc::clone(&hops);
        pool.submit(0, move || make_link(hops_clone, 100));
        let done = Arc::clone(&hops);
        pool.work_while_waiting(0, move || done.load(Ordering::SeqCst) >= 101);
        assert_eq!(hops.load(Ordering::SeqCst), 101);
        pool.shut_down();
    }

    #[test]
    fn sleepy_task_runs_only_after_its_delay() {
        let pool = ThreadPool::new(PoolConfig::default(), 1);
        let ran = Arc::new(AtomicU32::new(0));
        let ran_clone = Arc::clone(&ran);
        pool.submit_after(0, Duration::from_millis(30), move || {
            ran_clone.store(1, Ordering::SeqCst);
            TaskVariant::Empty
        });
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(ran.load(Ordering::SeqCst), 0, "must not fire before its delay elapses");
        let done = Arc::clone(&ran);
        pool.work_while_waiting(0, move || done.load(Ordering::SeqCst) == 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        pool.shut_down();
    }

    #[test]
    fn scoped_notification_fires_exactly_once_even_on_panic() {
        let fired = Arc::new(AtomicU32::new(0));
        {
            let fired = Arc::clone(&fired);
            let notification = ScopedNotification::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            drop(notification);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shut_down_lets_workers_join_cleanly() {
        let pool = ThreadPool::new(PoolConfig::default(), 3);
        pool.shut_down();
    }

    #[test]
    fn stress_submission_completes_without_deadlock_and_spills_in_line() {
        let config = PoolConfig { num_priority_levels: 2, max_queue_size: 4, num_submit_cycle_attempts: 3 };
        let pool = ThreadPool::new(config, 4);
        let completed = Arc::new(AtomicU32::new(0));
        for i in 0..10_000u32 {
            let completed = Arc::clone(&completed);
            pool.submit(u8::from(i % 2 == 0), move || {
                std::thread::sleep(Duration::from_millis(1));
                completed.fetch_add(1, Ordering::SeqCst);
                TaskVariant::Empty
            });
        }
        let done = Arc::clone(&completed);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while done.load(Ordering::SeqCst) < 10_000 {
            assert!(std::time::Instant::now() < deadline, "stress submission did not complete within 5s");
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(completed.load(Ordering::SeqCst), 10_000);
        assert!(pool.in_line_execution_count() > 0, "queue-full in-line execution path was never exercised");
        pool.shut_down();
    }

    #[test]
    fn sleepy_tasks_wake_in_wake_time_order() {
        let pool = ThreadPool::new(PoolConfig::default(), 1);
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay_ms) in [(3u32, 30), (1, 10), (2, 20)] {
            let order = Arc::clone(&order);
            pool.submit_after(0, Duration::from_millis(delay_ms), move || {
                order.lock().unwrap().push(label);
                TaskVariant::Empty
            });
        }
        let done = Arc::clone(&order);
        pool.work_while_waiting(0, move || done.lock().unwrap().len() >= 3);
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
        pool.shut_down();
    }
}
