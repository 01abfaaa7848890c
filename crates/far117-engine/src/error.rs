//! Error types for far117-engine operations.
//!
//! The rule evaluators themselves are total and never fail. These errors only
//! come out of the strict parsing entry points (schedule files, timezone
//! names, clock strings, preset names).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Far117Error {
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unknown pickup preset: {0}")]
    InvalidPreset(String),
}

pub type Result<T> = std::result::Result<T, Far117Error>;
