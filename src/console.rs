//! Line-at-a-time stdout logger for the demo binary.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = std::io::stdout().lock();
        // Transitions print bare, like the classic demo; everything else is tagged
        let written = if record.level() == log::Level::Info {
            writeln!(out, "{}", record.args())
        } else {
            writeln!(out, "[{:<5} {}] {}", record.level(), record.target(), record.args())
        };
        if written.is_ok() {
            let _ = out.flush();
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Installs [`ConsoleLogger`] as the global logger.
pub fn init(level: LevelFilter) -> anyhow::Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init;
    use log::LevelFilter;

    #[test]
    fn installs_once() {
        init(LevelFilter::Warn).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Warn);
        assert!(init(LevelFilter::Info).is_err());
        log::warn!("logger installed");
    }
}
