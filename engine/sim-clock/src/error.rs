//! Error types for SimClock

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock is already running")]
    AlreadyRunning,

    #[error("Clock is not running")]
    NotRunning,

    #[error("Configuration error: {0}")]
    Config(String),
}
