//! Logger initialisation for the simulator binaries

use log::info;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

pub use log::LevelFilter;

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

/// Initialise the logger for this execution.
///
/// `min_level` must be `Info` or more verbose so that race notifications are never hidden. If a
/// log file is given, all records are written there as well.
///
/// Must only be called once per process.
pub fn logger_init(min_level: LevelFilter, log_file: Option<&Path>) -> Result<(), LoggerInitError> {
    if min_level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let epoch = Instant::now();
    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            // targets are only interesting when debugging
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.3} {}] {}: {}",
                    epoch.elapsed().as_secs_f64(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.3} {}] {}",
                    epoch.elapsed().as_secs_f64(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path).map_err(LoggerInitError::LogFileInitError)?);
    }

    dispatch.apply().map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Log level: {:?}", min_level);
    if let Some(path) = log_file {
        info!("    Log file path: {:?}", path);
    }

    Ok(())
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_quiet_levels() {
        assert!(matches!(
            logger_init(LevelFilter::Warn, None),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
    }
}
