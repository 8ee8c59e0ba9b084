use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, trace};
use parking_lot::{Condvar, Mutex};
use uuid::Uuid;

use crate::error::SyncError;
use crate::sync::Synchronizer;

use super::{enter, execute, next_queue_id, running_on, Job, QueueConfig, Running};

struct Task {
    job: Job,
    kind: Running,
}

#[derive(Default)]
struct State {
    pending: VecDeque<Task>,
    // reads currently executing
    readers: usize,
    // a barrier is executing
    writer: bool,
    closed: bool,
}

impl State {
    /// Pops the head of the queue if it may start now.
    fn next_runnable(&mut self) -> Option<Task> {
        let runnable = match self.pending.front()?.kind {
            Running::Read => !self.writer,
            Running::Write => !self.writer && self.readers == 0,
        };
        if !runnable {
            return None;
        }
        let task = self.pending.pop_front()?;
        match task.kind {
            Running::Read => self.readers += 1,
            Running::Write => self.writer = true,
        }
        Some(task)
    }

    fn finish(&mut self, kind: Running) {
        match kind {
            Running::Read => self.readers -= 1,
            Running::Write => self.writer = false,
        }
    }
}

struct Shared {
    id: usize,
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn push(&self, job: Job, kind: Running) {
        let mut state = self.state.lock();
        if state.closed {
            // dropping the job here is reported by `execute` as abandoned
            return;
        }
        state.pending.push_back(Task { job, kind });
        drop(state);
        self.changed.notify_all();
    }
}

/// A pool of workers on which reads run concurrently and writes run as
/// barriers.
///
/// Tasks start in submission order. A read starts once no barrier is
/// running; a barrier starts once nothing at all is running and holds back
/// everything queued after it until it is done. Every completion wakes all
/// idle workers to re-check the head of the queue, so the bookkeeping cost
/// per task grows with the submission rate and the pool size. Under heavy
/// write traffic this strategy is markedly slower than the others (see
/// `benches/strategies.rs`).
pub struct ConcurrentQueue {
    shared: Arc<Shared>,
    label: String,
    workers: Vec<JoinHandle<()>>,
}

impl ConcurrentQueue {
    /// Panics if a worker thread cannot be spawned; see [`ConcurrentQueue::try_new`].
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(queue) => queue,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new() -> Result<Self, SyncError> {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Result<Self, SyncError> {
        let shared = Arc::new(Shared {
            id: next_queue_id(),
            state: Mutex::new(State::default()),
            changed: Condvar::new(),
        });
        let label = config.label
            .unwrap_or_else(|| format!("concurrent-queue-{}", Uuid::new_v4()));
        let mut queue = ConcurrentQueue { shared, label, workers: Vec::new() };
        // on error, dropping `queue` shuts down the workers spawned so far
        for n in 0..config.workers.max(1) {
            let shared = Arc::clone(&queue.shared);
            let worker = thread::Builder::new()
                .name(format!("{}-{}", queue.label, n))
                .spawn(move || run(&shared))?;
            queue.workers.push(worker);
        }
        debug!("spawned concurrent queue {} with {} workers", queue.label, queue.workers.len());
        Ok(queue)
    }

    pub fn label(&self) -> &str { &self.label }

    pub fn workers(&self) -> usize { self.workers.len() }

    /// Enqueues `operation` as a barrier and returns without waiting for it.
    ///
    /// A panic inside `operation` is logged and otherwise swallowed, as
    /// there is no caller left to receive it.
    pub fn write_async<F>(&self, operation: F)
    where F: FnOnce() + Send + 'static {
        let label = self.label.clone();
        let job: Job = Box::new(move || {
            if panic::catch_unwind(AssertUnwindSafe(operation)).is_err() {
                error!("asynchronous write on {} panicked", label);
            }
        });
        self.shared.push(job, Running::Write);
    }
}

fn run(shared: &Shared) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            loop {
                if let Some(task) = state.next_runnable() {
                    break task;
                }
                if state.closed && state.pending.is_empty() {
                    debug!("concurrent queue {} worker exiting", shared.id);
                    return;
                }
                shared.changed.wait(&mut state);
            }
        };
        trace!("concurrent queue {} running {:?} task", shared.id, task.kind);
        {
            let _current = enter(shared.id, task.kind);
            (task.job)();
        }
        shared.state.lock().finish(task.kind);
        shared.changed.notify_all();
    }
}

impl Default for ConcurrentQueue {
    fn default() -> Self { Self::new() }
}

impl Synchronizer for ConcurrentQueue {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        // already inside a read or a barrier of this queue: the access is
        // covered by the outer operation
        if running_on(self.shared.id).is_some() {
            return operation();
        }
        execute(operation, |job| self.shared.push(job, Running::Read))
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        match running_on(self.shared.id) {
            Some(Running::Write) => operation(),
            Some(Running::Read) => panic!("{}", SyncError::WriteInsideRead),
            None => execute(operation, |job| self.shared.push(job, Running::Write)),
        }
    }
}

impl Drop for ConcurrentQueue {
    fn drop(&mut self) {
        self.shared.state.lock().closed = true;
        self.shared.changed.notify_all();
        if running_on(self.shared.id).is_some() {
            debug!("concurrent queue {} dropped on its own worker, detaching", self.label);
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                debug!("concurrent queue {} worker panicked", self.label);
            }
        }
    }
}
