mod exclusive;
mod reentrant;

pub use exclusive::ExclusiveLock;
pub use reentrant::ReentrantLock;
