use std::sync::PoisonError;

use super::{
    error::check_id,
    left_of,
    loom_compat::{StateGuard, StateMutex},
    right_of,
    semaphore::Semaphore,
    DiningTable, Role, SyncError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhilosopherState {
    Thinking,
    Hungry,
    Eating,
}

/// Dining philosophers arbitrated by a single table lock.
///
/// A philosopher never holds one fork and waits for the other: under the
/// table lock it either goes straight to eating or stays hungry until a
/// neighbor's `put_forks` finds it eligible and wakes it. This rules out
/// deadlock, but a philosopher whose neighbors keep alternating can starve.
pub struct StateTable {
    states: StateMutex<Vec<PhilosopherState>>,
    // Raised at most once per meal, so bounded to 1
    signals: Vec<Semaphore>,
}

impl StateTable {
    pub fn new(seats: usize) -> Result<Self, SyncError> {
        if seats < 2 {
            return Err(SyncError::TooFewPhilosophers { seats });
        }
        Ok(Self {
            states: StateMutex::new(vec![PhilosopherState::Thinking; seats]),
            signals: (0..seats).map(|_| Semaphore::bounded(0, 1)).collect(),
        })
    }

    pub fn states(&self) -> Vec<PhilosopherState> {
        self.lock_states().clone()
    }

    fn lock_states(&self) -> StateGuard<'_, Vec<PhilosopherState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lets philosopher `i` eat if it is hungry and neither neighbor eats.
    ///
    /// Must be called with the table lock held, which `states` witnesses.
    fn test(&self, states: &mut [PhilosopherState], i: usize) -> Result<(), SyncError> {
        if serve(states, i) {
            self.signals[i].release()?;
        }
        Ok(())
    }
}

/// Moves philosopher `i` from hungry to eating when neither neighbor eats.
///
/// Returns whether it did, in which case `i` must be woken.
pub(crate) fn serve(states: &mut [PhilosopherState], i: usize) -> bool {
    let n = states.len();
    let eligible = states[i] == PhilosopherState::Hungry
        && states[left_of(i, n)] != PhilosopherState::Eating
        && states[right_of(i, n)] != PhilosopherState::Eating;
    if eligible {
        states[i] = PhilosopherState::Eating;
    }
    eligible
}

impl DiningTable for StateTable {
    fn take_forks(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Philosopher, id, self.signals.len())?;
        {
            let mut states = self.lock_states();
            if states[id] != PhilosopherState::Thinking {
                return Err(SyncError::AlreadyHeld {
                    role: Role::Philosopher,
                    id,
                });
            }
            states[id] = PhilosopherState::Hungry;
            log::trace!("Philosopher {id} is HUNGRY");
            self.test(&mut states, id)?;
        }
        self.signals[id].acquire();
        Ok(())
    }

    fn put_forks(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Philosopher, id, self.signals.len())?;
        let mut states = self.lock_states();
        if states[id] != PhilosopherState::Eating {
            return Err(SyncError::NotHeld {
                role: Role::Philosopher,
                id,
            });
        }
        states[id] = PhilosopherState::Thinking;
        let n = states.len();
        self.test(&mut states, left_of(id, n))?;
        self.test(&mut states, right_of(id, n))
    }

    fn seats(&self) -> usize {
        self.signals.len()
    }

    fn eating(&self) -> Vec<bool> {
        self.lock_states()
            .iter()
            .map(|s| *s == PhilosopherState::Eating)
            .collect()
    }
}
