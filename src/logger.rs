use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Writes `LEVEL - message` lines to stderr.
pub struct StderrLogger {}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // nowhere left to report a failed stderr write
            let _ = writeln!(std::io::stderr().lock(), "{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger {};

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
