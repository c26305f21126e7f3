//! Types for the season-pack service.

use std::fmt::Display;

use thiserror::Error;

use crate::status::Status;

/// A request that ended without a successful match or hardlink.
///
/// Domain rejections (no matches, mismatches, below threshold) are failures
/// too: the caller receives their status code together with the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub status: Status,
    pub message: String,
}

impl Failure {
    /// Failure carrying only the status message.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: status.message().to_string(),
        }
    }

    /// Failure whose message is the status message followed by the cause.
    pub fn with_cause(status: Status, cause: impl Display) -> Self {
        Self {
            status,
            message: format!("{}: {}", status.message(), cause),
        }
    }

    pub fn code(&self) -> u16 {
        self.status.code()
    }
}

impl From<Status> for Failure {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}
