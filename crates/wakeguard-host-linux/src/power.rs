//! Declarative suppression over D-Bus
//!
//! `DISPLAY_REQUIRED` is an `org.freedesktop.ScreenSaver` inhibit cookie on the
//! session bus. `SYSTEM_REQUIRED` is a logind `idle:sleep` block inhibitor on
//! the system bus, held as a file descriptor. Both are dropped by the bus if
//! the process dies, so nothing outlives the process.

use std::sync::Mutex;
use tracing::{debug, info, warn};
use wakeguard_host_api::{ExecutionState, HostError, HostResult, PowerRequest};
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::OwnedFd;

const SCREENSAVER_BUS: &str = "org.freedesktop.ScreenSaver";
const SCREENSAVER_PATH: &str = "/org/freedesktop/ScreenSaver";
const SCREENSAVER_INTERFACE: &str = "org.freedesktop.ScreenSaver";

const LOGIN1_BUS: &str = "org.freedesktop.login1";
const LOGIN1_PATH: &str = "/org/freedesktop/login1";
const LOGIN1_INTERFACE: &str = "org.freedesktop.login1.Manager";

const APP_NAME: &str = "wakeguard";
const INHIBIT_REASON: &str = "Screensaver suppression requested by the user";

pub(crate) fn dbus_error(e: zbus::Error) -> HostError {
    HostError::DBus(e.to_string())
}

/// Screensaver inhibit cookie, valid only on the connection that took it
struct ScreensaverInhibit {
    connection: Connection,
    cookie: u32,
}

#[derive(Default)]
struct PowerInner {
    state: ExecutionState,
    screensaver: Option<ScreensaverInhibit>,
    sleep_inhibitor: Option<OwnedFd>,
}

/// Power request backed by freedesktop inhibitors
#[derive(Default)]
pub struct LinuxPowerRequest {
    inner: Mutex<PowerInner>,
}

impl LinuxPowerRequest {
    pub fn new() -> Self {
        Self::default()
    }

    fn inhibit_screensaver() -> HostResult<ScreensaverInhibit> {
        let connection = Connection::session().map_err(dbus_error)?;
        let proxy = Proxy::new(
            &connection,
            SCREENSAVER_BUS,
            SCREENSAVER_PATH,
            SCREENSAVER_INTERFACE,
        )
        .map_err(dbus_error)?;

        let cookie: u32 = proxy
            .call("Inhibit", &(APP_NAME, INHIBIT_REASON))
            .map_err(dbus_error)?;
        debug!(cookie, "Screensaver inhibited");

        Ok(ScreensaverInhibit { connection, cookie })
    }

    fn uninhibit_screensaver(inhibit: ScreensaverInhibit) {
        let result = Proxy::new(
            &inhibit.connection,
            SCREENSAVER_BUS,
            SCREENSAVER_PATH,
            SCREENSAVER_INTERFACE,
        )
        .and_then(|proxy| proxy.call::<_, _, ()>("UnInhibit", &(inhibit.cookie,)));

        match result {
            Ok(()) => debug!(cookie = inhibit.cookie, "Screensaver inhibit released"),
            // The bus drops the cookie with the connection anyway
            Err(e) => warn!(cookie = inhibit.cookie, error = %e, "UnInhibit failed"),
        }
    }

    fn inhibit_sleep() -> HostResult<OwnedFd> {
        let connection = Connection::system().map_err(dbus_error)?;
        let proxy = Proxy::new(&connection, LOGIN1_BUS, LOGIN1_PATH, LOGIN1_INTERFACE)
            .map_err(dbus_error)?;

        let fd: OwnedFd = proxy
            .call("Inhibit", &("idle:sleep", APP_NAME, INHIBIT_REASON, "block"))
            .map_err(dbus_error)?;
        debug!("Idle sleep inhibited");

        Ok(fd)
    }
}

impl PowerRequest for LinuxPowerRequest {
    fn set_state(&self, state: ExecutionState) -> HostResult<ExecutionState> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| HostError::Internal("power request lock poisoned".into()))?;
        let previous = inner.state;
        if previous == state {
            return Ok(previous);
        }

        if state.holds_display() {
            if inner.screensaver.is_none() {
                inner.screensaver = Some(Self::inhibit_screensaver()?);
            }
        } else if let Some(inhibit) = inner.screensaver.take() {
            Self::uninhibit_screensaver(inhibit);
        }

        if state.holds_system() {
            if inner.sleep_inhibitor.is_none() {
                match Self::inhibit_sleep() {
                    Ok(fd) => inner.sleep_inhibitor = Some(fd),
                    // Display suppression alone still keeps the screensaver off
                    Err(e) => warn!(error = %e, "Sleep inhibitor unavailable"),
                }
            }
        } else if inner.sleep_inhibitor.take().is_some() {
            debug!("Idle sleep inhibitor closed");
        }

        inner.state = state;
        info!(
            from = previous.bits(),
            to = state.bits(),
            "Execution state changed"
        );
        Ok(previous)
    }

    fn current(&self) -> ExecutionState {
        self.inner
            .lock()
            .map(|inner| inner.state)
            .unwrap_or_default()
    }
}
