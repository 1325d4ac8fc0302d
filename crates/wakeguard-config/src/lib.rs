//! Launch argument parsing and validation for wakeguard
//!
//! The whole configuration is a single positional token:
//! - nothing: the build's default mode
//! - an integer in 10..=3600: synthetic input at that interval (seconds)
//! - `/s` or `/p`: declarative suppression
//! - `/c`: about dialog, no suppression
//!
//! Anything else is rejected before a suppression engine exists.

mod plan;
mod validation;

pub use plan::*;
pub use validation::*;
