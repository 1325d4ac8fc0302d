//! Error types for wakeguard

use thiserror::Error;

/// Core error type for wakeguard operations
#[derive(Debug, Error)]
pub enum WakeguardError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Another instance holds '{0}'")]
    StartupConflict(String),

    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    #[error("Host error: {0}")]
    HostError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WakeguardError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn conflict(name: impl Into<String>) -> Self {
        Self::StartupConflict(name.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::HostError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, WakeguardError>;
