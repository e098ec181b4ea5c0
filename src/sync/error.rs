use std::fmt;

/// Kind of participant an id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Reader,
    Writer,
    Philosopher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Reader => "Reader",
            Role::Writer => "Writer",
            Role::Philosopher => "Philosopher",
        })
    }
}

/// Caller misuse of a synchronization component.
///
/// Coordination itself never fails: entry points either succeed or block.
/// Every variant here is reported before any shared counter is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    OutOfRange {
        role: Role,
        id: usize,
        population: usize,
    },
    NotHeld {
        role: Role,
        id: usize,
    },
    AlreadyHeld {
        role: Role,
        id: usize,
    },
    /// Release of a bounded semaphore that is already at its bound.
    Overflow {
        bound: usize,
    },
    EmptyPopulation {
        role: Role,
    },
    TooFewPhilosophers {
        seats: usize,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::OutOfRange {
                role,
                id,
                population,
            } => write!(f, "{role} {id} is out of range (population {population})"),
            SyncError::NotHeld { role, id } => {
                write!(f, "{role} {id} released without a matching acquire")
            }
            SyncError::AlreadyHeld { role, id } => {
                write!(f, "{role} {id} acquired twice without releasing")
            }
            SyncError::Overflow { bound } => {
                write!(f, "semaphore released past its bound of {bound}")
            }
            SyncError::EmptyPopulation { role } => write!(f, "need at least one {role}"),
            SyncError::TooFewPhilosophers { seats } => {
                write!(f, "need at least 2 philosophers, got {seats}")
            }
        }
    }
}

impl std::error::Error for SyncError {}

/// Rejects ids outside `0..population`.
pub(crate) fn check_id(role: Role, id: usize, population: usize) -> Result<(), SyncError> {
    if id < population {
        Ok(())
    } else {
        Err(SyncError::OutOfRange {
            role,
            id,
            population,
        })
    }
}
