use std::sync::PoisonError;

use super::{
    error::check_id,
    loom_compat::{StateGuard, StateMutex},
    semaphore::Lock,
    Mutex, ReadersWriters, Role, SyncError,
};

/// Readers-writers where neither side starves.
///
/// Every entrant passes a turnstile. A writer keeps the turnstile for its
/// whole write, so readers arriving after it queue behind it and the writer
/// waits for at most the reader group already inside.
pub struct NoStarve {
    turnstile: Lock,
    room_empty: Lock,
    group: StateMutex<ReaderGroup>,
    writer: StateMutex<Option<usize>>,
    n_readers: usize,
    n_writers: usize,
}

struct ReaderGroup {
    count: usize,
    reading: Vec<bool>,
}

impl NoStarve {
    pub fn new(n_readers: usize, n_writers: usize) -> Result<Self, SyncError> {
        if n_readers == 0 {
            return Err(SyncError::EmptyPopulation { role: Role::Reader });
        }
        if n_writers == 0 {
            return Err(SyncError::EmptyPopulation { role: Role::Writer });
        }
        Ok(Self {
            turnstile: Lock::new(),
            room_empty: Lock::new(),
            group: StateMutex::new(ReaderGroup {
                count: 0,
                reading: vec![false; n_readers],
            }),
            writer: StateMutex::new(None),
            n_readers,
            n_writers,
        })
    }

    fn group(&self) -> StateGuard<'_, ReaderGroup> {
        self.group.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn writer(&self) -> StateGuard<'_, Option<usize>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReadersWriters for NoStarve {
    fn begin_read(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Reader, id, self.n_readers)?;
        let already = SyncError::AlreadyHeld {
            role: Role::Reader,
            id,
        };
        // Checked before the turnstile, where a reader already inside would
        // wait behind a writer that waits for it
        if self.group().reading[id] {
            return Err(already);
        }

        drop(self.turnstile.lock());

        let mut group = self.group();
        // Another call with the same id may have joined while we were at the turnstile
        if group.reading[id] {
            return Err(already);
        }
        group.count += 1;
        group.reading[id] = true;
        if group.count == 1 {
            // Later readers wait on `group` until the room is ours
            self.room_empty.acquire();
            log::trace!("Reader {id} opened a reader group");
        }
        Ok(())
    }

    fn end_read(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Reader, id, self.n_readers)?;
        let mut group = self.group();
        if !group.reading[id] {
            return Err(SyncError::NotHeld {
                role: Role::Reader,
                id,
            });
        }
        group.reading[id] = false;
        group.count -= 1;
        if group.count == 0 {
            self.room_empty.release()?;
            log::trace!("Reader {id} closed the reader group");
        }
        Ok(())
    }

    fn begin_write(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Writer, id, self.n_writers)?;
        if *self.writer() == Some(id) {
            return Err(SyncError::AlreadyHeld {
                role: Role::Writer,
                id,
            });
        }

        self.turnstile.acquire();
        self.room_empty.acquire();
        *self.writer() = Some(id);
        Ok(())
    }

    fn end_write(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Writer, id, self.n_writers)?;
        {
            let mut writer = self.writer();
            if *writer != Some(id) {
                return Err(SyncError::NotHeld {
                    role: Role::Writer,
                    id,
                });
            }
            *writer = None;
        }
        self.turnstile.release()?;
        self.room_empty.release()
    }

    fn readers(&self) -> usize {
        self.n_readers
    }

    fn writers(&self) -> usize {
        self.n_writers
    }
}
