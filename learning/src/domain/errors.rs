// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Learning Errors
//!
//! Typed failures surfaced by the learning subsystem. Validation and
//! not-tracked errors indicate caller or configuration mistakes and are
//! never retried. Persistence errors are only raised once the atomic write
//! has exhausted its retry budget.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LearningError {
    /// Bad input: wrong confirmation token, threshold out of range,
    /// pattern type rejected by the target agent, confidence too low to share.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Atomic write gave up after the configured number of attempts
    #[error("Persistence failed for {} after {attempts} attempts: {reason}", .path.display())]
    Persistence {
        path: PathBuf,
        attempts: u32,
        reason: String,
    },

    /// No open tracking record exists for the investigation
    #[error("Investigation not tracked: {0}")]
    NotTracked(String),

    /// A tracking record is already open for the investigation
    #[error("Investigation already tracked: {0}")]
    AlreadyTracked(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LearningError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_tracked(&self) -> bool {
        matches!(self, Self::NotTracked(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

pub type Result<T, E = LearningError> = std::result::Result<T, E>;

/// Reject values outside `[0, 1]`. NaN is rejected too.
pub fn ensure_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LearningError::Validation(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_interval_bounds() {
        assert!(ensure_unit_interval("threshold", 0.0).is_ok());
        assert!(ensure_unit_interval("threshold", 1.0).is_ok());
        assert!(ensure_unit_interval("threshold", 1.01).unwrap_err().is_validation());
        assert!(ensure_unit_interval("threshold", -0.1).unwrap_err().is_validation());
        assert!(ensure_unit_interval("threshold", f64::NAN).is_err());
    }

    #[test]
    fn test_persistence_error_message() {
        let err = LearningError::Persistence {
            path: PathBuf::from("/tmp/TAN/patterns.json"),
            attempts: 10,
            reason: "permission denied".to_string(),
        };
        assert!(err.is_persistence());
        assert_eq!(
            err.to_string(),
            "Persistence failed for /tmp/TAN/patterns.json after 10 attempts: permission denied"
        );
    }
}
