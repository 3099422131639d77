//! Diagnostic logging to a file.
//!
//! The terminal belongs to the UI while the chat runs, so `tracing` output
//! always goes to a file, never to stdout or stderr.

use std::error::Error as StdError;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GENIE_LOG";
const DEFAULT_FILTER: &str = "info";
pub const LOG_FILE_NAME: &str = "genie.log";

#[derive(Debug)]
pub enum LoggingError {
    Open { path: PathBuf, source: io::Error },
    Init(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Open { path, source } => {
                write!(f, "cannot open log file {}: {source}", path.display())
            }
            LoggingError::Init(reason) => write!(f, "cannot install logger: {reason}"),
        }
    }
}

impl StdError for LoggingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LoggingError::Open { source, .. } => Some(source),
            LoggingError::Init(_) => None,
        }
    }
}

/// `GENIE_LOG` when it parses, `info` otherwise.
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    value
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_error = |source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)
}

/// Install the global subscriber, appending to `path`.
pub fn init_logging(path: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(path)?;
    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))
}
