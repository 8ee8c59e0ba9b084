use std::sync::Arc;

use crate::lock::{ExclusiveLock, ReentrantLock};
use crate::queue::{ConcurrentQueue, SerialQueue};

/// Arbitration policy for access to shared state.
///
/// Both operations block the caller until `operation` has run exactly once.
/// A panic raised by `operation` is propagated to the caller after the
/// strategy has released whatever it was holding, so the synchronizer stays
/// usable.
///
/// `operation` may run on another thread (queue strategies), hence the
/// `Send` bounds. It may still borrow from the caller: the call does not
/// return before the closure has finished. Anything the closure captures by
/// reference must be owned by the caller for the duration of the call, or be
/// protected by other means.
pub trait Synchronizer: Sync {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send;

    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send;
}

impl<S: Synchronizer> Synchronizer for &S {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        (**self).read(operation)
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        (**self).write(operation)
    }
}

impl<S: Synchronizer + Send> Synchronizer for Arc<S> {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        (**self).read(operation)
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        (**self).write(operation)
    }
}

impl<S: Synchronizer> Synchronizer for Box<S> {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        (**self).read(operation)
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        (**self).write(operation)
    }
}

/// One of the built-in strategies, picked at runtime.
pub enum Strategy {
    Exclusive(ExclusiveLock),
    Reentrant(ReentrantLock),
    Serial(SerialQueue),
    Concurrent(ConcurrentQueue),
}

impl Synchronizer for Strategy {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        match self {
            Strategy::Exclusive(s) => s.read(operation),
            Strategy::Reentrant(s) => s.read(operation),
            Strategy::Serial(s) => s.read(operation),
            Strategy::Concurrent(s) => s.read(operation),
        }
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        match self {
            Strategy::Exclusive(s) => s.write(operation),
            Strategy::Reentrant(s) => s.write(operation),
            Strategy::Serial(s) => s.write(operation),
            Strategy::Concurrent(s) => s.write(operation),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self { Strategy::Exclusive(ExclusiveLock::new()) }
}

impl From<ExclusiveLock> for Strategy {
    fn from(s: ExclusiveLock) -> Self { Strategy::Exclusive(s) }
}

impl From<ReentrantLock> for Strategy {
    fn from(s: ReentrantLock) -> Self { Strategy::Reentrant(s) }
}

impl From<SerialQueue> for Strategy {
    fn from(s: SerialQueue) -> Self { Strategy::Serial(s) }
}

impl From<ConcurrentQueue> for Strategy {
    fn from(s: ConcurrentQueue) -> Self { Strategy::Concurrent(s) }
}
