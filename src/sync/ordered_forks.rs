use std::sync::PoisonError;

use super::{
    error::check_id,
    loom_compat::{StateGuard, StateMutex},
    right_of,
    semaphore::Lock,
    state_table::PhilosopherState,
    DiningTable, Mutex, Role, SyncError,
};

/// Dining philosophers with one lock per fork, taken in an id-dependent order.
///
/// Philosopher `i` shares fork `i` with its left neighbor and fork `i + 1`
/// with its right neighbor. Even ids take left then right, odd ids right then
/// left, so an odd philosopher and its even right neighbor contend for the
/// same first fork and a full cycle of waits cannot form. Starvation is
/// still possible.
pub struct OrderedForks {
    forks: Vec<Lock>,
    // Hungry from the misuse check until both forks are held
    states: StateMutex<Vec<PhilosopherState>>,
}

impl OrderedForks {
    pub fn new(seats: usize) -> Result<Self, SyncError> {
        if seats < 2 {
            return Err(SyncError::TooFewPhilosophers { seats });
        }
        Ok(Self {
            forks: (0..seats).map(|_| Lock::new()).collect(),
            states: StateMutex::new(vec![PhilosopherState::Thinking; seats]),
        })
    }

    fn lock_states(&self) -> StateGuard<'_, Vec<PhilosopherState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Forks philosopher `i` takes, first to second.
pub(crate) fn fork_order(i: usize, seats: usize) -> (usize, usize) {
    let (left, right) = (i, right_of(i, seats));
    if i % 2 == 0 {
        (left, right)
    } else {
        (right, left)
    }
}

impl DiningTable for OrderedForks {
    fn take_forks(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Philosopher, id, self.forks.len())?;
        {
            let mut states = self.lock_states();
            if states[id] != PhilosopherState::Thinking {
                return Err(SyncError::AlreadyHeld {
                    role: Role::Philosopher,
                    id,
                });
            }
            states[id] = PhilosopherState::Hungry;
        }

        let (first, second) = fork_order(id, self.forks.len());
        self.forks[first].acquire();
        log::trace!("Philosopher {id} picked up fork {first}");
        self.forks[second].acquire();
        self.lock_states()[id] = PhilosopherState::Eating;
        Ok(())
    }

    fn put_forks(&self, id: usize) -> Result<(), SyncError> {
        check_id(Role::Philosopher, id, self.forks.len())?;
        {
            let mut states = self.lock_states();
            if states[id] != PhilosopherState::Eating {
                return Err(SyncError::NotHeld {
                    role: Role::Philosopher,
                    id,
                });
            }
            states[id] = PhilosopherState::Thinking;
        }

        let (first, second) = fork_order(id, self.forks.len());
        self.forks[first].release()?;
        self.forks[second].release()
    }

    fn seats(&self) -> usize {
        self.forks.len()
    }

    fn eating(&self) -> Vec<bool> {
        self.lock_states()
            .iter()
            .map(|s| *s == PhilosopherState::Eating)
            .collect()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use crate::sync::{
        adjacent_exclusion,
        ordered_forks::{fork_order, OrderedForks},
        right_of, DiningTable, Mutex as _, Role, SyncError,
    };
    use rand::Rng;
    use std::{
        collections::{HashSet, VecDeque},
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    const N: usize = 5;

    #[test]
    fn parity_order() {
        assert_eq!(fork_order(0, N), (0, 1));
        assert_eq!(fork_order(1, N), (2, 1));
        assert_eq!(fork_order(3, N), (4, 3));
        assert_eq!(fork_order(4, N), (4, 0));
    }

    #[test]
    fn last_philosopher_waits_on_fork_zero() {
        let table = Arc::new(OrderedForks::new(N).unwrap());
        // 0 holds forks 0 and 1
        table.take_forks(0).unwrap();

        // 4 picks up fork 4, then blocks on fork 0
        let th4 = thread::spawn({
            let table = table.clone();
            move || {
                table.take_forks(4).unwrap();
                table.put_forks(4).unwrap();
            }
        });
        thread::sleep(Duration::from_millis(100));
        assert!(!th4.is_finished());
        assert!(table.forks[4].is_locked());

        // 2 eats right away, 1 waits for 0 to finish
        for id in [2, 1] {
            let th = thread::spawn({
                let table = table.clone();
                move || {
                    table.take_forks(id).unwrap();
                    table.put_forks(id).unwrap();
                }
            });
            if id == 1 {
                thread::sleep(Duration::from_millis(100));
                assert!(!th.is_finished());
                table.put_forks(0).unwrap();
            }
            th.join().unwrap();
        }

        th4.join().unwrap();
        table.take_forks(3).unwrap();
        table.put_forks(3).unwrap();
        assert_eq!(table.eating(), vec![false; N]);
        assert!(table.forks.iter().all(|f| !f.is_locked()));
    }

    #[test]
    fn adjacent_never_eat() {
        const ROUNDS: usize = 100;
        let table = Arc::new(OrderedForks::new(N).unwrap());
        let violated = Arc::new(AtomicBool::new(false));
        let ths = (0..N)
            .map(|id| {
                let (table, violated) = (table.clone(), violated.clone());
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        rand_timeout();
                        table.take_forks(id).unwrap();
                        if !adjacent_exclusion(&table.eating()) {
                            violated.store(true, Ordering::SeqCst);
                        }
                        rand_timeout();
                        table.put_forks(id).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        ths.into_iter().for_each(|th| th.join().unwrap());
        assert!(!violated.load(Ordering::SeqCst));
    }

    #[test]
    fn no_reachable_deadlock() {
        for seats in 2..=7 {
            assert_eq!(stuck_states(seats, |i| fork_order(i, seats)), 0);
        }
    }

    #[test]
    fn symmetric_order_deadlocks() {
        // Everyone left-first reaches the all-hold-one state
        assert_eq!(stuck_states(N, |i| (i, right_of(i, N))), 1);
    }

    /// Explores every interleaving of philosophers that repeatedly take their
    /// forks in `order` and put them back, counting states where nobody can move.
    fn stuck_states(seats: usize, order: impl Fn(usize) -> (usize, usize)) -> usize {
        // Per philosopher: 0 thinking, 1 holding first fork, 2 eating
        let start = vec![0u8; seats];
        let mut seen = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);
        let mut stuck = 0;
        while let Some(s) = queue.pop_front() {
            let mut held = vec![false; seats];
            for (i, &pc) in s.iter().enumerate() {
                let (first, second) = order(i);
                if pc >= 1 {
                    held[first] = true;
                }
                if pc == 2 {
                    held[second] = true;
                }
            }
            let mut moved = false;
            for i in 0..seats {
                let (first, second) = order(i);
                let next = match s[i] {
                    0 if !held[first] => 1,
                    1 if !held[second] => 2,
                    2 => 0,
                    _ => continue,
                };
                moved = true;
                let mut t = s.clone();
                t[i] = next;
                // Two eating neighbors would mean a fork held twice
                let eating = t.iter().map(|&pc| pc == 2).collect::<Vec<_>>();
                assert!(adjacent_exclusion(&eating));
                if seen.insert(t.clone()) {
                    queue.push_back(t);
                }
            }
            if !moved {
                stuck += 1;
            }
        }
        stuck
    }

    #[test]
    fn misuse() {
        let table = OrderedForks::new(N).unwrap();
        assert_eq!(
            table.put_forks(2),
            Err(SyncError::NotHeld {
                role: Role::Philosopher,
                id: 2
            })
        );
        table.take_forks(2).unwrap();
        assert_eq!(
            table.take_forks(2),
            Err(SyncError::AlreadyHeld {
                role: Role::Philosopher,
                id: 2
            })
        );
        // 3 does not own fork 3 even though its neighbor holds it
        assert_eq!(
            table.put_forks(3),
            Err(SyncError::NotHeld {
                role: Role::Philosopher,
                id: 3
            })
        );
        table.put_forks(2).unwrap();
        assert_eq!(
            table.take_forks(7),
            Err(SyncError::OutOfRange {
                role: Role::Philosopher,
                id: 7,
                population: N
            })
        );
        assert!(matches!(
            OrderedForks::new(0),
            Err(SyncError::TooFewPhilosophers { seats: 0 })
        ));
    }

    #[test]
    fn same_philosopher_racing_for_forks() {
        let table = Arc::new(OrderedForks::new(N).unwrap());
        // Hold philosopher 0's first fork so any call that gets past the check blocks
        table.forks[0].acquire();
        let ths = (0..2)
            .map(|_| {
                let table = table.clone();
                thread::spawn(move || table.take_forks(0))
            })
            .collect::<Vec<_>>();
        thread::sleep(Duration::from_millis(100));
        // One call was turned away without waiting on a fork
        assert_eq!(ths.iter().filter(|th| th.is_finished()).count(), 1);
        table.forks[0].release().unwrap();

        let mut results = ths
            .into_iter()
            .map(|th| th.join().unwrap())
            .collect::<Vec<_>>();
        results.sort_by_key(|r| r.is_err());
        assert_eq!(
            results,
            vec![
                Ok(()),
                Err(SyncError::AlreadyHeld {
                    role: Role::Philosopher,
                    id: 0
                })
            ]
        );
        table.put_forks(0).unwrap();
        assert!(table.forks.iter().all(|f| !f.is_locked()));
    }

    fn rand_timeout() {
        let mut rng = rand::thread_rng();
        let t = rng.gen_range(0..=2);
        thread::sleep(Duration::from_millis(t));
    }
}
