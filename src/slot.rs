use std::cell::UnsafeCell;

use crate::guard::BorrowFlag;

/// Storage cell of a [`Guarded`](crate::Guarded).
///
/// The synchronizer is what keeps accesses apart; the borrow flag only turns
/// an overlapping access (a nested `set` from inside `mutate` on a reentrant
/// strategy, say) into a panic instead of aliased references.
pub(crate) struct Slot<T> {
    value: UnsafeCell<T>,
    flag: BorrowFlag,
}

// SAFETY: every access through `&Slot` holds a shared or exclusive borrow
// from `flag`, same as `RwLock<T>`.
unsafe impl<T: Send + Sync> Sync for Slot<T> {}

impl<T> Slot<T> {
    pub fn new(value: T) -> Self {
        Slot { value: UnsafeCell::new(value), flag: BorrowFlag::new() }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let _borrow = match self.flag.shared() {
            Ok(borrow) => borrow,
            Err(e) => panic!("{}", e),
        };
        // SAFETY: no exclusive borrow can exist while `_borrow` lives
        f(unsafe { &*self.value.get() })
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _borrow = match self.flag.exclusive() {
            Ok(borrow) => borrow,
            Err(e) => panic!("{}", e),
        };
        // SAFETY: `_borrow` is the only borrow of the value
        f(unsafe { &mut *self.value.get() })
    }

    pub fn get_mut(&mut self) -> &mut T { self.value.get_mut() }

    pub fn into_inner(self) -> T { self.value.into_inner() }
}
