//! Host adapter trait interfaces for wakeguard
//!
//! This crate defines the capability-based interface between the suppression
//! core and platform-specific implementations. It contains no platform code itself.

mod capabilities;
mod execution;
mod input;
mod mock;
mod surface;
mod traits;

pub use capabilities::*;
pub use execution::*;
pub use input::*;
pub use mock::*;
pub use surface::*;
pub use traits::*;
