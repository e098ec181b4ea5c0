use std::sync::PoisonError;

use super::{
    loom_compat::{Condvar, StateGuard, StateMutex},
    Mutex, SyncError,
};

/// Counting semaphore built from a mutex-protected count and a condition variable.
///
/// `acquire` blocks while the count is 0, `release` increments and wakes one
/// waiter. Which waiter wakes is left to the condition variable, so there is no
/// FIFO guarantee among blocked callers.
pub struct Semaphore {
    count: StateMutex<usize>,
    available: Condvar,
    bound: usize,
}

impl Semaphore {
    pub fn new(count: usize) -> Self {
        Self::bounded(count, usize::MAX)
    }

    /// A semaphore whose count may never exceed `bound`.
    ///
    /// # Panics
    /// If `count > bound`.
    pub fn bounded(count: usize, bound: usize) -> Self {
        assert!(
            count <= bound,
            "Expect initial count {count} <= bound={bound}"
        );
        Self {
            count: StateMutex::new(count),
            available: Condvar::new(),
            bound,
        }
    }

    pub fn acquire(&self) {
        let mut count = self.count();
        while *count == 0 {
            count = self
                .available
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *count -= 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut count = self.count();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    pub fn release(&self) -> Result<(), SyncError> {
        let mut count = self.count();
        if *count == self.bound {
            return Err(SyncError::Overflow { bound: self.bound });
        }
        *count += 1;
        self.available.notify_one();
        Ok(())
    }

    /// Current count, for diagnostics only.
    pub fn value(&self) -> usize {
        *self.count()
    }

    // Nothing panics while holding `count`, so a poisoned lock still holds a valid count.
    fn count(&self) -> StateGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Binary semaphore used as a lock.
///
/// Unlike `std::sync::Mutex`, a `Lock` may be released by a different thread
/// than the one that acquired it, which the readers-writers room and gate need.
pub struct Lock(Semaphore);

impl Lock {
    pub fn new() -> Self {
        Self(Semaphore::bounded(1, 1))
    }

    pub fn try_acquire(&self) -> bool {
        self.0.try_acquire()
    }

    pub fn is_locked(&self) -> bool {
        self.0.value() == 0
    }
}

impl Default for Lock {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutex for Lock {
    fn acquire(&self) {
        self.0.acquire()
    }
    fn release(&self) -> Result<(), SyncError> {
        self.0.release()
    }
}
