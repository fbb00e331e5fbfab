//! Error types for availability-engine operations.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Empty recurrence: {0}")]
    EmptyRecurrence(String),

    #[error("Window too large: {requested_days} days requested, at most {max_days} allowed")]
    WindowTooLarge { requested_days: i64, max_days: u32 },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Machine-readable error kind, reported next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRule,
    EmptyRecurrence,
    WindowTooLarge,
    InvalidTimezone,
    InvalidWindow,
    InvalidDatetime,
    Config,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidRule(_) => ErrorKind::InvalidRule,
            EngineError::EmptyRecurrence(_) => ErrorKind::EmptyRecurrence,
            EngineError::WindowTooLarge { .. } => ErrorKind::WindowTooLarge,
            EngineError::InvalidTimezone(_) => ErrorKind::InvalidTimezone,
            EngineError::InvalidWindow(_) => ErrorKind::InvalidWindow,
            EngineError::InvalidDatetime(_) => ErrorKind::InvalidDatetime,
            EngineError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
