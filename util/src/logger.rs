//! Logger initialisation
//!
//! Log lines go to stdout and to the session's log file. Each line carries the seconds elapsed
//! since the session epoch and a coloured level tag. Records from threads other than the main
//! thread are tagged with the thread name, since the executables run their control loop and
//! render loop on named threads.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Level};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

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

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be at least `Info`, the per-cycle diagnostics of the control loop are logged
/// at that level.
///
/// Can only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            let elapsed_s = session::try_get_elapsed_seconds().unwrap_or(0.0);
            let thread = std::thread::current();

            let source = match (record.level() > Level::Info, thread.name()) {
                (true, _) => format!(" {}", record.target()),
                (false, Some(name)) if name != "main" => format!(" <{}>", name),
                _ => String::new(),
            };

            out.finish(format_args!(
                "[{:10.6} {}]{} {}",
                elapsed_s,
                level_tag(record.level()),
                source,
                message
            ))
        })
        .level(min_level)
        // The line editor is very chatty below info
        .level_for("rustyline", LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::try_get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_quiet_levels() {
        let root = std::env::temp_dir().join("mearm_util_logger_test");
        let session = session::Session::in_dir(&root, "logger_test").unwrap();

        match logger_init(LevelFilter::Warn, &session) {
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn)) => (),
            r => panic!("Expected an invalid level error, got {:?}", r),
        }

        std::fs::remove_dir_all(&root).ok();
    }
}
