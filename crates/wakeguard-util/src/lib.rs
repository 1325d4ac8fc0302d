//! Shared utilities for wakeguard
//!
//! This crate provides:
//! - Error types
//! - Instance names (one per suppression kind)
//! - Default runtime paths for the instance lock and activation socket

mod error;
mod ids;
mod paths;

pub use error::*;
pub use ids::*;
pub use paths::*;
