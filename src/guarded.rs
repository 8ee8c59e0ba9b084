use std::fmt;

use crate::lock::ExclusiveLock;
use crate::slot::Slot;
use crate::sync::Synchronizer;

/// A value that is only ever touched through its synchronizer.
///
/// The synchronizer defaults to a fresh [`ExclusiveLock`]. Passing `&S` or
/// `Arc<S>` to [`Guarded::with_synchronizer`] lets several guarded values
/// share one synchronizer, which makes access to all of them mutually
/// exclusive.
///
/// `get` followed by `set` is two separate operations and another writer may
/// run in between. Use [`Guarded::mutate`] to read-modify-write atomically.
///
/// Accessors need `T: Send + Sync`, whatever the strategy: reads hand out
/// shared borrows that may live on another thread, so `Send`-only values
/// such as `Cell<_>` or `mpsc::Receiver<_>` cannot be guarded, not even by
/// the lock strategies.
///
/// ```
/// use guarded_sync::Guarded;
///
/// let counter = Guarded::new(0);
/// counter.mutate(|n| n + 1);
/// assert_eq!(counter.get(), 1);
/// ```
pub struct Guarded<T, S = ExclusiveLock> {
    slot: Slot<T>,
    sync: S,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self::with_synchronizer(value, ExclusiveLock::new())
    }
}

impl<T, S> Guarded<T, S> {
    pub fn with_synchronizer(value: T, sync: S) -> Self {
        Guarded { slot: Slot::new(value), sync }
    }

    pub fn synchronizer(&self) -> &S { &self.sync }

    /// Direct access; `&mut self` already rules out any other user.
    pub fn get_mut(&mut self) -> &mut T { self.slot.get_mut() }

    pub fn into_inner(self) -> T { self.slot.into_inner() }
}

impl<T: Send + Sync, S: Synchronizer> Guarded<T, S> {
    pub fn get(&self) -> T
    where T: Clone {
        let slot = &self.slot;
        self.sync.read(move || slot.with(T::clone))
    }

    /// Runs `f` on the value under a read and returns its result.
    pub fn with<R, F>(&self, f: F) -> R
    where F: FnOnce(&T) -> R + Send, R: Send {
        let slot = &self.slot;
        self.sync.read(move || slot.with(f))
    }

    pub fn set(&self, value: T) {
        let slot = &self.slot;
        self.sync.write(move || slot.with_mut(|current| *current = value));
    }

    /// Replaces the value with `transform(&value)` inside a single write.
    ///
    /// `transform` works on a copy, so it may call back into this value on a
    /// reentrant strategy; whatever it returns is stored last. If it panics
    /// the value is left as it was.
    pub fn mutate<F>(&self, transform: F)
    where F: FnOnce(&T) -> T + Send, T: Clone {
        let slot = &self.slot;
        self.sync.write(move || {
            let current = slot.with(T::clone);
            let next = transform(&current);
            slot.with_mut(|value| *value = next);
        });
    }
}

impl<T: Default, S: Default> Default for Guarded<T, S> {
    fn default() -> Self {
        Self::with_synchronizer(T::default(), S::default())
    }
}

impl<T> From<T> for Guarded<T> {
    fn from(value: T) -> Self { Self::new(value) }
}

impl<T, S> fmt::Debug for Guarded<T, S>
where T: fmt::Debug + Send + Sync, S: Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.with(|value| format!("{:?}", value));
        f.debug_struct("Guarded").field("value", &format_args!("{}", value)).finish()
    }
}
