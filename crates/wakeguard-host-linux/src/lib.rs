//! Linux host adapter for wakeguard
//!
//! Provides:
//! - Declarative suppression through the freedesktop screensaver and logind inhibitors
//! - Synthetic input through XTest, or a D-Bus activity ping where X is unavailable
//! - The flock-based instance lock
//! - A console tray with zenity dialogs when a desktop is present

mod adapter;
mod input;
mod instance;
mod power;
mod surface;

pub use adapter::*;
pub use input::*;
pub use instance::*;
pub use power::*;
pub use surface::*;
