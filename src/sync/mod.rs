pub mod error;
pub(crate) mod loom_compat;
pub mod no_starve;
pub mod ordered_forks;
pub mod semaphore;
pub mod state_table;
pub mod writer_priority;


pub use error::{Role, SyncError};
pub use semaphore::{Lock, Semaphore};

/// Lock whose release is explicit and may happen on another thread.
///
/// `release` reports misuse (releasing a lock nobody holds) instead of
/// silently granting a second holder.
pub trait Mutex {
    fn acquire(&self);
    fn release(&self) -> Result<(), SyncError>;

    // Scoped use, when acquire and release happen in the same call
    fn lock(&self) -> MutexGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire();
        MutexGuard { mutex: self }
    }
}

pub struct MutexGuard<'a, M: Mutex> {
    mutex: &'a M,
}

impl<M: Mutex> Drop for MutexGuard<'_, M> {
    fn drop(&mut self) {
        // The guard holds the lock, so release cannot overflow
        if let Err(e) = self.mutex.release() {
            log::error!("guard release failed: {e}");
        }
    }
}

/// Shared resource accessed by readers and writers.
///
/// The requirements for that are
/// 1. Mutual Exclusion - a writer is never inside while readers or another writer are.
/// 2. Reader Concurrency - readers never exclude each other.
/// 3. Fairness - each implementation states which side it protects from starvation.
///
/// Ids are 0-based and fixed per participant. Each `begin_*` must be matched by
/// the corresponding `end_*` from the same id before that id begins again.
pub trait ReadersWriters: Send + Sync {
    fn begin_read(&self, id: usize) -> Result<(), SyncError>;
    fn end_read(&self, id: usize) -> Result<(), SyncError>;
    fn begin_write(&self, id: usize) -> Result<(), SyncError>;
    fn end_write(&self, id: usize) -> Result<(), SyncError>;
    fn readers(&self) -> usize;
    fn writers(&self) -> usize;
}

/// Ring of philosophers sharing one fork with each neighbor.
///
/// Between `take_forks(i)` and `put_forks(i)` philosopher `i` is eating, and
/// neither `(i - 1) mod N` nor `(i + 1) mod N` is.
pub trait DiningTable: Send + Sync {
    fn take_forks(&self, id: usize) -> Result<(), SyncError>;
    fn put_forks(&self, id: usize) -> Result<(), SyncError>;
    fn seats(&self) -> usize;
    /// Which philosophers are eating right now, read under the table's lock.
    fn eating(&self) -> Vec<bool>;
}

pub(crate) fn left_of(i: usize, n: usize) -> usize {
    (i + n - 1) % n
}

pub(crate) fn right_of(i: usize, n: usize) -> usize {
    (i + 1) % n
}

/// True when no two ring neighbors are eating.
pub fn adjacent_exclusion(eating: &[bool]) -> bool {
    let n = eating.len();
    (0..n).all(|i| !(eating[i] && eating[right_of(i, n)]))
}
