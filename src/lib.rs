//! A value guarded by a swappable synchronization strategy.
//!
//! [`Guarded`] routes every access to its value through a [`Synchronizer`].
//! Four strategies are provided:
//!
//! - [`ExclusiveLock`]: one mutex for reads and writes.
//! - [`ReentrantLock`]: as above, but the owning thread may nest operations.
//! - [`SerialQueue`]: one worker thread running operations in FIFO order.
//! - [`ConcurrentQueue`]: a worker pool where reads overlap and writes run
//!   as barriers.
//!
//! Every operation blocks its caller until it has run. There is no
//! cancellation and no timeout.
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod lock;
pub mod queue;
pub mod sync;

mod guard;
mod guarded;
mod slot;

pub use error::SyncError;
pub use guarded::Guarded;
pub use lock::{ExclusiveLock, ReentrantLock};
pub use queue::{ConcurrentQueue, QueueConfig, SerialQueue};
pub use sync::{Strategy, Synchronizer};
