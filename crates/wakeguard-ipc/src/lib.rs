//! Activation socket for wakeguard
//!
//! Provides:
//! - The primary instance's Unix domain socket server
//! - NDJSON (newline-delimited JSON) request/response exchange
//! - Peer UID authentication
//! - The client a duplicate launch uses to reach the primary

mod client;
mod server;

pub use client::*;
pub use server::*;

use thiserror::Error;

/// IPC errors
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out waiting for the primary instance")]
    Timeout,

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

pub type IpcResult<T> = Result<T, IpcError>;
