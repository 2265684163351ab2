//! Error types for ingest operations

use std::fmt;

/// Errors reported synchronously to a publisher
#[derive(Debug, PartialEq, Eq)]
pub enum PublishError {
    /// An escalation was published without a (non-empty) channel key
    MissingChannel,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::MissingChannel => {
                write!(f, "escalation snapshot is missing a channel key")
            }
        }
    }
}

impl std::error::Error for PublishError {}
