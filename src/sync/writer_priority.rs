use std::sync::PoisonError;

use super::{
    error::check_id,
    loom_compat::{StateGuard, StateMutex},
    semaphore::Lock,
    Mutex, ReadersWriters, Role, SyncError,
};

/// Readers-writers that lets writers overtake readers.
///
/// The first writer to queue closes `read_try`, so no reader can start until
/// the last queued writer has finished. Readers inside drain first. Among
/// writers queued on `resource` the wake order is unspecified.
pub struct WriterPriority {
    read_try: Lock,
    resource: Lock,
    readers: StateMutex<Participants>,
    writers: StateMutex<Participants>,
    // Writer currently holding `resource`
    writing: StateMutex<Option<usize>>,
    n_readers: usize,
    n_writers: usize,
}

/// Count of one side plus which ids are counted.
struct Participants {
    count: usize,
    inside: Vec<bool>,
}

impl Participants {
    fn new(population: usize) -> Self {
        Self {
            count: 0,
            inside: vec![false; population],
        }
    }
}

fn locked<T>(m: &StateMutex<T>) -> StateGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WriterPriority {
    pub fn new(n_readers: usize, n_writers: usize) -> Result<Self, SyncError> {
        if n_readers == 0 {
            return Err(SyncError::EmptyPopulation { role: Role::Reader });
        }
        if n_writers == 0 {
            return Err(SyncError::EmptyPopulation { role: Role::Writer });
        }
        Ok(Self {
            read_try: Lock::new(),
            resource: Lock::new(),
            readers: StateMutex::new(Participants::new(n_readers)),
            writers: StateMutex::new(Participants::new(n_writers)),
            writing: StateMutex::new(None),
            n_readers,
            n_writers,
        })
    }
}

impl ReadersWriters for WriterPriority {
    fn begin_read(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Reader, id, self.n_readers)?;
        let already = SyncError::AlreadyHeld {
            role: Role::Reader,
            id,
        };
        if locked(&self.readers).inside[id] {
            return Err(already);
        }

        self.read_try.acquire();
        {
            let mut readers = locked(&self.readers);
            // Another call with the same id may have joined while we waited at the gate
            if readers.inside[id] {
                drop(readers);
                self.read_try.release()?;
                return Err(already);
            }
            readers.count += 1;
            readers.inside[id] = true;
            if readers.count == 1 {
                self.resource.acquire();
                log::trace!("Reader {id} took the resource for readers");
            }
        }
        self.read_try.release()
    }

    fn end_read(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Reader, id, self.n_readers)?;
        let mut readers = locked(&self.readers);
        if !readers.inside[id] {
            return Err(SyncError::NotHeld {
                role: Role::Reader,
                id,
            });
        }
        readers.inside[id] = false;
        readers.count -= 1;
        if readers.count == 0 {
            self.resource.release()?;
        }
        Ok(())
    }

    fn begin_write(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Writer, id, self.n_writers)?;
        {
            let mut writers = locked(&self.writers);
            if writers.inside[id] {
                return Err(SyncError::AlreadyHeld {
                    role: Role::Writer,
                    id,
                });
            }
            writers.count += 1;
            writers.inside[id] = true;
            if writers.count == 1 {
                // Held until the last queued writer leaves
                self.read_try.acquire();
                log::trace!("Writer {id} closed the gate to new readers");
            }
        }

        self.resource.acquire();
        *locked(&self.writing) = Some(id);
        Ok(())
    }

    fn end_write(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Writer, id, self.n_writers)?;
        {
            let mut writing = locked(&self.writing);
            if *writing != Some(id) {
                return Err(SyncError::NotHeld {
                    role: Role::Writer,
                    id,
                });
            }
            *writing = None;
        }
        self.resource.release()?;

        let mut writers = locked(&self.writers);
        writers.inside[id] = false;
        writers.count -= 1;
        if writers.count == 0 {
            self.read_try.release()?;
            log::trace!("Writer {id} reopened the gate to readers");
        }
        Ok(())
    }

    fn readers(&self) -> usize {
        self.n_readers
    }

    fn writers(&self) -> usize {
        self.n_writers
    }
}
