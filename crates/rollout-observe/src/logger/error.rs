use thiserror::Error;

use crate::logger::format::LoggerFormat;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text, json or journald)")]
    InvalidFormat(String),

    #[error("{0} output is unavailable in this build")]
    Unsupported(LoggerFormat),

    #[error("a global logger is already installed")]
    AlreadyInitialized,

    #[error("logger setup failed: {0}")]
    InitializationFailed(String),

    #[error("invalid log filter {0:?}")]
    InvalidLogLevel(String),
}
