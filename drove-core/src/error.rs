use crate::outcome::{ErrorClass, Outcome};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Think time minimum ({min:?}) exceeds maximum ({max:?})")]
    InvalidThinkTime { min: Duration, max: Duration },

    #[error("Think time bound is not a valid number of seconds: {0}")]
    InvalidSeconds(f64),

    #[error("Spawn rate must be a positive, finite number of users per second (got {0})")]
    InvalidSpawnRate(f64),

    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// A session seed (`onStart`) that did not produce a session.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Session seed failed ({class}): {detail}")]
pub struct SeedError {
    pub class: ErrorClass,
    pub detail: String,
}

impl SeedError {
    pub fn new(class: ErrorClass, detail: impl Into<String>) -> Self {
        Self {
            class,
            detail: detail.into(),
        }
    }

    /// Returns the seed error carried by a failed outcome, `None` on success.
    pub fn from_outcome(outcome: &Outcome) -> Option<Self> {
        let class = outcome.error_class()?;
        Some(Self::new(class, outcome.detail().unwrap_or_default()))
    }
}
