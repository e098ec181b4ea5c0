//! Runs one thread per participant against a chosen synchronization component.

pub mod pacing;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};

use crate::sync::{
    no_starve::NoStarve, ordered_forks::OrderedForks, state_table::StateTable,
    writer_priority::WriterPriority, DiningTable, ReadersWriters, Role, SyncError,
};
use pacing::{Pacing, Phase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Problem {
    NoStarve,
    WriterPriority,
    StateTable,
    OrderedForks,
}

impl Problem {
    pub const ALL: [Problem; 4] = [
        Problem::NoStarve,
        Problem::WriterPriority,
        Problem::StateTable,
        Problem::OrderedForks,
    ];

    pub fn from_number(n: u8) -> Result<Self> {
        match n {
            1..=4 => Ok(Self::ALL[usize::from(n) - 1]),
            _ => bail!("Invalid problem number {n}. Choose 1-4."),
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Problem::NoStarve => 1,
            Problem::WriterPriority => 2,
            Problem::StateTable => 3,
            Problem::OrderedForks => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Problem::NoStarve => "No-starve Readers-Writers",
            Problem::WriterPriority => "Writer-priority Readers-Writers",
            Problem::StateTable => "Dining Philosophers #1",
            Problem::OrderedForks => "Dining Philosophers #2",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.number(), self.title())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub problem: Problem,
    pub readers: usize,
    pub writers: usize,
    pub philosophers: usize,
    /// Rounds per participant; `None` runs until stopped.
    pub rounds: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            problem: Problem::NoStarve,
            readers: 5,
            writers: 5,
            philosophers: 5,
            rounds: None,
        }
    }
}

pub struct Driver {
    config: Config,
    pacing: Arc<dyn Pacing>,
}

impl Driver {
    pub fn new<P: Pacing + 'static>(config: Config, pacing: P) -> Self {
        Self {
            config,
            pacing: Arc::new(pacing),
        }
    }

    /// Builds the selected component and spawns its participants.
    ///
    /// If a spawn fails, participants already started are stopped and joined
    /// before the error is returned.
    pub fn start(&self) -> Result<Running> {
        let mut running = Running {
            stop: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        };
        if let Err(e) = self.spawn_all(&mut running) {
            running.abort();
            return Err(e);
        }
        log::debug!(
            "started {} participants for {}",
            running.workers.len(),
            self.config.problem
        );
        Ok(running)
    }

    fn spawn_all(&self, running: &mut Running) -> Result<()> {
        let problem = self.config.problem;
        let stop = running.stop.clone();
        let worker = |role, id| Worker {
            problem,
            role,
            id,
            pacing: self.pacing.clone(),
            stop: stop.clone(),
            rounds: self.config.rounds,
        };

        match problem {
            Problem::NoStarve | Problem::WriterPriority => {
                let (readers, writers) = (self.config.readers, self.config.writers);
                let rw: Arc<dyn ReadersWriters> = if problem == Problem::NoStarve {
                    Arc::new(NoStarve::new(readers, writers)?)
                } else {
                    Arc::new(WriterPriority::new(readers, writers)?)
                };
                for id in 0..readers {
                    let rw = rw.clone();
                    running.spawn(worker(Role::Reader, id), move |w| w.read(&*rw))?;
                }
                for id in 0..writers {
                    let rw = rw.clone();
                    running.spawn(worker(Role::Writer, id), move |w| w.write(&*rw))?;
                }
            }
            Problem::StateTable | Problem::OrderedForks => {
                let seats = self.config.philosophers;
                let table: Arc<dyn DiningTable> = if problem == Problem::StateTable {
                    Arc::new(StateTable::new(seats)?)
                } else {
                    Arc::new(OrderedForks::new(seats)?)
                };
                for id in 0..seats {
                    let table = table.clone();
                    running.spawn(worker(Role::Philosopher, id), move |w| w.dine(&*table))?;
                }
            }
        }
        Ok(())
    }
}

struct Worker {
    problem: Problem,
    role: Role,
    id: usize,
    pacing: Arc<dyn Pacing>,
    stop: Arc<AtomicBool>,
    rounds: Option<usize>,
}

impl Worker {
    fn pause(&self, phase: Phase) {
        let d = self.pacing.delay(self.problem, self.role, self.id, phase);
        if !d.is_zero() {
            thread::sleep(d);
        }
    }

    fn keep_going(&self, done: usize) -> bool {
        !self.stop.load(Ordering::Relaxed) && self.rounds.map_or(true, |max| done < max)
    }

    fn read(&self, rw: &dyn ReadersWriters) -> Result<usize, SyncError> {
        let id = self.id;
        self.pause(Phase::Startup);
        let mut done = 0;
        while self.keep_going(done) {
            self.pause(Phase::Idle);
            rw.begin_read(id)?;
            log::info!("Reader {id} is reading...");
            self.pause(Phase::Critical);
            rw.end_read(id)?;
            done += 1;
        }
        Ok(done)
    }

    fn write(&self, rw: &dyn ReadersWriters) -> Result<usize, SyncError> {
        let id = self.id;
        self.pause(Phase::Startup);
        let mut done = 0;
        while self.keep_going(done) {
            self.pause(Phase::Idle);
            rw.begin_write(id)?;
            log::info!("Writer {id} is writing...");
            self.pause(Phase::Critical);
            rw.end_write(id)?;
            done += 1;
        }
        Ok(done)
    }

    fn dine(&self, table: &dyn DiningTable) -> Result<usize, SyncError> {
        let id = self.id;
        self.pause(Phase::Startup);
        let mut done = 0;
        while self.keep_going(done) {
            log::info!("Philosopher {id} is THINKING...");
            self.pause(Phase::Idle);
            log::info!("Philosopher {id} is HUNGRY...");
            table.take_forks(id)?;
            log::info!("Philosopher {id} is EATING...");
            self.pause(Phase::Critical);
            table.put_forks(id)?;
            done += 1;
        }
        Ok(done)
    }
}

/// Participants started by [`Driver::start`].
pub struct Running {
    stop: Arc<AtomicBool>,
    workers: Vec<(Role, usize, JoinHandle<Result<usize, SyncError>>)>,
}

impl Running {
    fn spawn<F>(&mut self, worker: Worker, body: F) -> Result<()>
    where
        F: FnOnce(&Worker) -> Result<usize, SyncError> + Send + 'static,
    {
        let (role, id) = (worker.role, worker.id);
        let handle = thread::Builder::new()
            .name(format!("{role}-{id}").to_lowercase())
            .spawn(move || body(&worker))
            .with_context(|| format!("Failed to spawn {role} {id}"))?;
        self.workers.push((role, id, handle));
        Ok(())
    }

    /// Asks every participant to leave after its current round.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stops and joins whatever has been started, discarding the results.
    fn abort(&mut self) {
        self.stop();
        for (role, id, handle) in self.workers.drain(..) {
            match handle.join() {
                Ok(Err(e)) => log::warn!("{role} {id} failed while aborting: {e}"),
                Err(_) => log::warn!("{role} {id} panicked while aborting"),
                Ok(Ok(_)) => {}
            }
        }
    }

    /// Waits for all participants and reports their completed rounds.
    pub fn join(self) -> Result<Report> {
        let mut rounds = Vec::with_capacity(self.workers.len());
        for (role, id, handle) in self.workers {
            let done = handle
                .join()
                .map_err(|_| anyhow!("{role} {id} panicked"))?
                .with_context(|| format!("{role} {id} failed"))?;
            rounds.push((role, id, done));
        }
        Ok(Report { rounds })
    }
}

#[derive(Debug)]
pub struct Report {
    pub rounds: Vec<(Role, usize, usize)>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.rounds.iter().map(|(_, _, n)| n).sum()
    }

    pub fn rounds_of(&self, role: Role, id: usize) -> Option<usize> {
        self.rounds
            .iter()
            .find(|(r, i, _)| *r == role && *i == id)
            .map(|(_, _, n)| *n)
    }
}
