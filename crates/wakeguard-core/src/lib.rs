//! Suppression engine and lifecycle state machine for wakeguard
//!
//! This crate is the heart of wakeguard, containing:
//! - The suppression engine (declarative power request or synthetic input ticks)
//! - The non-overlapping tick scheduler
//! - Lifecycle state machine (Starting -> Running <-> ShowingStatus -> Exiting -> Terminal)
//! - The de-duplicated status notifier

mod engine;
mod events;
mod lifecycle;
mod notifier;
mod scheduler;

pub use engine::*;
pub use events::*;
pub use lifecycle::*;
pub use notifier::*;
pub use scheduler::*;
