use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use classic_sync::{
    console,
    driver::{pacing::Textbook, Config, Driver, Problem},
};

/// Runs one of the classic synchronization problems until interrupted.
///
/// Problems:
///   1: No-starve Readers-Writers
///   2: Writer-priority Readers-Writers
///   3: Dining Philosophers #1
///   4: Dining Philosophers #2
#[derive(Parser)]
#[command(name = "classic-sync", verbatim_doc_comment)]
struct Cli {
    /// Problem number (1-4)
    problem: u8,

    /// Number of readers (problems 1 and 2)
    #[arg(long, default_value_t = 5)]
    readers: usize,

    /// Number of writers (problems 1 and 2)
    #[arg(long, default_value_t = 5)]
    writers: usize,

    /// Number of philosophers (problems 3 and 4)
    #[arg(long, default_value_t = 5)]
    philosophers: usize,

    /// Length of one delay unit in milliseconds
    #[arg(long, default_value_t = 1000)]
    unit_ms: u64,

    /// Stop each participant after this many rounds (default: run forever)
    #[arg(long)]
    rounds: Option<usize>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    console::init(cli.log_level)?;
    let problem = Problem::from_number(cli.problem)?;

    let banner = format!("Running {} solution", problem.title());
    println!("{banner}");
    println!("{}\n", "=".repeat(banner.len()));

    let config = Config {
        problem,
        readers: cli.readers,
        writers: cli.writers,
        philosophers: cli.philosophers,
        rounds: cli.rounds,
    };
    let pacing = Textbook {
        unit: Duration::from_millis(cli.unit_ms),
    };
    let report = Driver::new(config, pacing).start()?.join()?;
    println!("Main: {} rounds completed. Exiting.", report.total());
    Ok(())
}
