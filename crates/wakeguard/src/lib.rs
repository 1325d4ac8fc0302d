//! wakeguard service wiring
//!
//! The binary parses the launch token, takes the instance lock and hands
//! over to [`Service`]. Everything here runs against the [`Host`] traits so
//! it can be driven by a mock host in tests.
//!
//! [`Host`]: wakeguard_host_api::Host

mod cli;
mod guard;
mod service;
mod shutdown;

pub use cli::*;
pub use guard::*;
pub use service::*;
pub use shutdown::*;

/// Body of the about dialog shown for `/c`
pub fn about_text() -> String {
    format!(
        "wakeguard {}\n\n\
         Keeps the screensaver and display sleep away while it runs.\n\n\
         Usage:\n  \
         wakeguard            start with the default mode\n  \
         wakeguard <seconds>  synthetic input every 10..3600 seconds\n  \
         wakeguard /s         declarative stay-awake request\n  \
         wakeguard /c         this dialog",
        env!("CARGO_PKG_VERSION")
    )
}
