//! Session logger
//!
//! Every message is prefixed with the seconds elapsed since the session started.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::info;
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
    #[error("Expected a log level of at least `ERROR`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

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
/// Messages go to stdout with coloured level tags, and to the session's log file without any
/// colour codes. Debug and trace messages also show the module they came from, with the crate
/// name stripped.
///
/// # Notes
///
/// - `min_level` must not be `LevelFilter::Off`, use `LevelFilter::Error` to only log errors.
/// - Only one logger can be set per process, a second call returns `FernInitError`.
pub fn logger_init(
    min_level: self::LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level == LevelFilter::Off {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                source(record.level(), record.target()),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}{}",
                session::get_elapsed_seconds(),
                level_name(record.level()),
                source(record.level(), record.target()),
                message
            ))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Coloured three letter tag for the terminal.
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => level_name(level).dimmed().italic(),
        log::Level::Debug => level_name(level).dimmed(),
        log::Level::Info => level_name(level).normal(),
        log::Level::Warn => level_name(level).yellow(),
        log::Level::Error => level_name(level).red().bold(),
    }
}

/// Plain three letter tag for the log file.
fn level_name(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

/// Prefix naming the source module of debug and trace messages, empty for other levels.
///
/// The crate name is dropped, so `breadcrumbs_lib::nav::router` becomes `nav::router: `. Messages
/// from a crate root keep the crate name.
fn source(level: log::Level, target: &str) -> String {
    if level <= log::Level::Info {
        return String::new();
    }

    match target.split_once("::") {
        Some((_, module)) => format!("{}: ", module),
        None => format!("{}: ", target),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
