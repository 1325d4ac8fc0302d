//! Shared types for wakeguard
//!
//! This crate defines the data model every other crate speaks:
//! - Suppression modes, validated tick intervals and suppression state
//! - Tray presence and status prompt content
//! - The activation protocol a duplicate launch uses to reach the primary
//! - Versioning

mod commands;
mod types;

pub use commands::*;
pub use types::*;

/// Current activation protocol version
pub const API_VERSION: u32 = 1;
