use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, trace};
use uuid::Uuid;

use crate::error::SyncError;
use crate::sync::Synchronizer;

use super::{enter, execute, next_queue_id, running_on, Job, QueueConfig, Running};

/// A single worker thread running operations one at a time, in the order
/// they were submitted.
///
/// Operations submitted from inside a running operation of the same queue
/// run inline on the worker instead of being queued behind themselves.
pub struct SerialQueue {
    id: usize,
    label: String,
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialQueue {
    /// Panics if the worker thread cannot be spawned; see [`SerialQueue::try_new`].
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(queue) => queue,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new() -> Result<Self, SyncError> {
        Self::with_config(QueueConfig::default())
    }

    /// Only `config.label` is used; a serial queue always has one worker.
    pub fn with_config(config: QueueConfig) -> Result<Self, SyncError> {
        let id = next_queue_id();
        let label = config.label
            .unwrap_or_else(|| format!("serial-queue-{}", Uuid::new_v4()));
        let (sender, receiver) = channel::unbounded();
        let worker = thread::Builder::new()
            .name(format!("{}-0", label))
            .spawn(move || run(id, receiver))?;
        debug!("spawned serial queue {}", label);
        Ok(SerialQueue { id, label, sender: Some(sender), worker: Some(worker) })
    }

    pub fn label(&self) -> &str { &self.label }

    fn submit(&self, job: Job) {
        if let Some(sender) = &self.sender {
            // a failed send hands the job back and drops it, which `execute`
            // reports as abandoned
            let _ = sender.send(job);
        }
    }
}

fn run(id: usize, receiver: Receiver<Job>) {
    for job in receiver.iter() {
        let _current = enter(id, Running::Write);
        trace!("serial queue {} running task", id);
        job();
    }
    debug!("serial queue {} worker exiting", id);
}

impl Default for SerialQueue {
    fn default() -> Self { Self::new() }
}

impl Synchronizer for SerialQueue {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        if running_on(self.id).is_some() {
            return operation();
        }
        execute(operation, |job| self.submit(job))
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        if running_on(self.id).is_some() {
            return operation();
        }
        execute(operation, |job| self.submit(job))
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        // closing the channel lets the worker drain what is left and exit
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if running_on(self.id).is_some() {
                debug!("serial queue {} dropped on its own worker, detaching", self.label);
            } else if worker.join().is_err() {
                debug!("serial queue {} worker panicked", self.label);
            }
        }
    }
}
