use std::time::Duration;

use rand::Rng;

use super::Problem;
use crate::sync::Role;

/// Point in a participant's loop where the driver may pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Once, before the first round.
    Startup,
    /// Outside the resource: not interested, or thinking.
    Idle,
    /// Inside the resource: reading, writing, or eating.
    Critical,
}

/// Chooses how long a participant spends in each phase.
///
/// Delays only make interleavings observable; correctness never depends on them.
pub trait Pacing: Send + Sync {
    fn delay(&self, problem: Problem, role: Role, id: usize, phase: Phase) -> Duration;
}

/// Runs every phase back to back.
pub struct NoDelay;

impl Pacing for NoDelay {
    fn delay(&self, _: Problem, _: Role, _: usize, _: Phase) -> Duration {
        Duration::ZERO
    }
}

/// The classic demo timings, measured in `unit`s.
///
/// Readers rest 2 and read 1. Writers are staggered by their id, rest 6 and
/// write 2 (writer-priority writers: staggered by twice their id, rest 12).
/// Philosophers think for a random 5 to 7 and eat 2.
pub struct Textbook {
    pub unit: Duration,
}

impl Textbook {
    fn units(&self, problem: Problem, role: Role, id: usize, phase: Phase) -> u32 {
        // Staggers use 1-based ids so the first writer also waits
        let nth = u32::try_from(id + 1).unwrap_or(u32::MAX);
        match (role, phase) {
            (Role::Reader, Phase::Startup) => 0,
            (Role::Reader, Phase::Idle) => 2,
            (Role::Reader, Phase::Critical) => 1,
            (Role::Writer, Phase::Startup) => match problem {
                Problem::WriterPriority => nth.saturating_mul(2),
                _ => nth,
            },
            (Role::Writer, Phase::Idle) => match problem {
                Problem::WriterPriority => 12,
                _ => 6,
            },
            (Role::Writer, Phase::Critical) => 2,
            (Role::Philosopher, Phase::Startup) => 0,
            (Role::Philosopher, Phase::Idle) => rand::thread_rng().gen_range(5..=7),
            (Role::Philosopher, Phase::Critical) => 2,
        }
    }
}

impl Pacing for Textbook {
    fn delay(&self, problem: Problem, role: Role, id: usize, phase: Phase) -> Duration {
        self.unit.saturating_mul(self.units(problem, role, id, phase))
    }
}
