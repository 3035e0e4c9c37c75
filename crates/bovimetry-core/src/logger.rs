//! Minimal stderr logger.
//!
//! Prints `[elapsed LEVEL target] message` with an elapsed-time prefix so
//! pipeline stages can be timed from the log alone. Records can be scoped
//! to a target prefix, which keeps dependency chatter out of measurement
//! runs while `-vv` still surfaces everything. Install once at startup.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
    level: LevelFilter,
    /// Only targets starting with this prefix are emitted.
    scope: Option<&'static str>,
    started: Instant,
}

impl StderrLogger {
    fn admits(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && self
                .scope
                .map_or(true, |prefix| metadata.target().starts_with(prefix))
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.admits(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.admits(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

fn install(level: LevelFilter, scope: Option<&'static str>) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            scope,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the stderr logger with the provided level filter, emitting
/// records from every crate.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    install(level, None)
}

/// Install the stderr logger restricted to targets under `prefix`
/// (module-path match, e.g. `"bovimetry"`).
pub fn init_scoped(
    level: LevelFilter,
    prefix: &'static str,
) -> Result<(), log::SetLoggerError> {
    install(level, Some(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn meta(target: &str) -> Metadata<'_> {
        Metadata::builder().level(Level::Info).target(target).build()
    }

    #[test]
    fn scope_admits_matching_targets_only() {
        let logger = StderrLogger {
            level: LevelFilter::Debug,
            scope: Some("bovimetry"),
            started: Instant::now(),
        };
        assert!(logger.admits(&meta("bovimetry::calibrate")));
        assert!(logger.admits(&meta("bovimetry_core::landmark")));
        assert!(!logger.admits(&meta("imageproc::drawing")));
    }

    #[test]
    fn level_filter_applies_before_scope() {
        let logger = StderrLogger {
            level: LevelFilter::Warn,
            scope: None,
            started: Instant::now(),
        };
        assert!(!logger.admits(&meta("bovimetry::pipeline")));
    }
}
