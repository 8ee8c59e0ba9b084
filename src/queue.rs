use std::cell::Cell;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering::*};

use crossbeam::channel;

use crate::error::SyncError;

mod concurrent;
mod serial;

pub use concurrent::ConcurrentQueue;
pub use serial::SerialQueue;

/// Unit of work handed to a queue worker.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Smallest pool a [`ConcurrentQueue`] is given by default, so that reads can
/// overlap even on a single core.
pub const MIN_WORKERS: usize = 4;

/// Settings applied when a queue spawns its workers.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub label: Option<String>,
    pub workers: usize,
}

impl QueueConfig {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { label: None, workers: num_cpus::get().max(MIN_WORKERS) }
    }
}

/// What a worker thread is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Running {
    Read,
    Write,
}

thread_local! {
    // (queue id, kind of the operation on this worker's stack)
    static CURRENT: Cell<Option<(usize, Running)>> = Cell::new(None);
}

static NEXT_QUEUE_ID: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn next_queue_id() -> usize {
    NEXT_QUEUE_ID.fetch_add(1, Relaxed)
}

/// Kind of operation the calling thread is running for queue `id`, if it is
/// one of that queue's workers.
pub(crate) fn running_on(id: usize) -> Option<Running> {
    CURRENT.with(|current| match current.get() {
        Some((queue, running)) if queue == id => Some(running),
        _ => None,
    })
}

/// Marks the calling thread as a worker of queue `id` until the returned
/// guard drops.
pub(crate) fn enter(id: usize, running: Running) -> CurrentGuard {
    let previous = CURRENT.with(|current| current.replace(Some((id, running))));
    CurrentGuard { previous }
}

pub(crate) struct CurrentGuard { previous: Option<(usize, Running)> }

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.previous));
    }
}

/// Drops the borrow checker's view of `job`'s lifetime.
///
/// # Safety
///
/// The caller must not return (or unwind) past `'a` until the job has either
/// run to completion or been dropped.
unsafe fn erase<'a>(job: Box<dyn FnOnce() + Send + 'a>) -> Job {
    unsafe { mem::transmute::<Box<dyn FnOnce() + Send + 'a>, Job>(job) }
}

/// Hands `operation` to `submit` and blocks until a worker has run it.
///
/// Panics raised by `operation` are caught on the worker and resumed here.
pub(crate) fn execute<'a, T, F>(operation: F, submit: impl FnOnce(Job)) -> T
where F: FnOnce() -> T + Send + 'a, T: Send + 'a {
    let (done, wait) = channel::bounded(1);
    let job: Box<dyn FnOnce() + Send + 'a> = Box::new(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(operation));
        let _ = done.send(result);
    });
    // SAFETY: `recv` below returns only once the job has sent its result or
    // been dropped (taking `done` with it), so nothing borrowed by
    // `operation` outlives this call.
    let job = unsafe { erase(job) };
    submit(job);
    match wait.recv() {
        Ok(Ok(value)) => value,
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_) => panic!("{}", SyncError::Abandoned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_runs_on_submitter() {
        let mut local = vec![1, 2, 3];
        let sum = execute(|| { local.push(4); local.iter().sum::<i32>() }, |job| job());
        assert_eq!(sum, 10);
        assert_eq!(local.len(), 4);
    }

    #[test]
    #[should_panic(expected = "queued operation was dropped")]
    fn execute_reports_dropped_job() {
        execute(|| 1, drop);
    }

    #[test]
    fn current_marker_restored() {
        assert_eq!(running_on(7), None);
        {
            let _outer = enter(7, Running::Write);
            assert_eq!(running_on(7), Some(Running::Write));
            {
                let _inner = enter(7, Running::Read);
                assert_eq!(running_on(7), Some(Running::Read));
            }
            assert_eq!(running_on(7), Some(Running::Write));
            assert_eq!(running_on(8), None);
        }
        assert_eq!(running_on(7), None);
    }

    #[test]
    fn config_never_zero_workers() {
        assert_eq!(QueueConfig::default().workers(0).workers, 1);
        assert!(QueueConfig::default().workers >= MIN_WORKERS);
    }
}
