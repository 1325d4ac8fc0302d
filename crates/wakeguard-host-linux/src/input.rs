//! Synthetic input delivery
//!
//! XTest is preferred: it feeds the events through the X server, which resets
//! every idle counter the server knows about. Without an X display the
//! session screensaver service is asked to treat the tick as user activity.

use std::ffi::{c_int, c_ulong};
use std::ptr;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use wakeguard_api::SuppressionMode;
use wakeguard_host_api::{
    HostError, HostResult, InputBackend, InputBatch, InputInjector, Key, SyntheticInput,
};
use x11_dl::keysym;
use x11_dl::xlib::{self, Xlib};
use x11_dl::xtest::Xf86vmode as XTest;
use zbus::blocking::{Connection, Proxy};

use crate::power::dbus_error;

const SCREENSAVER_BUS: &str = "org.freedesktop.ScreenSaver";
const SCREENSAVER_PATH: &str = "/org/freedesktop/ScreenSaver";
const SCREENSAVER_INTERFACE: &str = "org.freedesktop.ScreenSaver";

/// An open X display plus the libraries that talk to it
struct XConnection {
    xlib: Xlib,
    xtest: XTest,
    display: *mut xlib::Display,
    pause_keycode: xlib::KeyCode,
}

// The display pointer is only ever used behind the injector's mutex
unsafe impl Send for XConnection {}

impl Drop for XConnection {
    fn drop(&mut self) {
        unsafe {
            (self.xlib.XCloseDisplay)(self.display);
        }
    }
}

/// Injects through the XTest extension
pub struct XTestInjector {
    connection: Mutex<XConnection>,
}

impl XTestInjector {
    /// Open the default display. Fails if no X server is reachable.
    pub fn open() -> HostResult<Self> {
        let xlib = Xlib::open()
            .map_err(|e| HostError::Unavailable(format!("libX11: {}", e)))?;
        let xtest = XTest::open()
            .map_err(|e| HostError::Unavailable(format!("libXtst: {}", e)))?;

        let display = unsafe { (xlib.XOpenDisplay)(ptr::null()) };
        if display.is_null() {
            return Err(HostError::Unavailable("no X display".into()));
        }

        let pause_keycode =
            unsafe { (xlib.XKeysymToKeycode)(display, keysym::XK_Pause as xlib::KeySym) };
        if pause_keycode == 0 {
            unsafe {
                (xlib.XCloseDisplay)(display);
            }
            return Err(HostError::Unavailable("Pause key has no keycode".into()));
        }

        Ok(Self {
            connection: Mutex::new(XConnection {
                xlib,
                xtest,
                display,
                pause_keycode,
            }),
        })
    }
}

impl InputInjector for XTestInjector {
    /// Every event of the batch is sent and flushed together. XTest has no
    /// way to take back an event the server accepted, so a batch with a
    /// refused event is still flushed and reported as rejected.
    fn inject(&self, batch: &InputBatch) -> HostResult<usize> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| HostError::Internal("X connection lock poisoned".into()))?;

        const CURRENT_TIME: c_ulong = 0;
        // Relative motion on whichever screen the pointer is on
        const CURRENT_SCREEN: c_int = -1;

        let mut refused = Vec::new();
        for event in batch.events() {
            let status = unsafe {
                match event {
                    SyntheticInput::PointerMotion { dx, dy } => {
                        (conn.xtest.XTestFakeRelativeMotionEvent)(
                            conn.display,
                            CURRENT_SCREEN,
                            *dx,
                            *dy,
                            CURRENT_TIME,
                        )
                    }
                    SyntheticInput::KeyRelease { key: Key::Pause } => (conn.xtest.XTestFakeKeyEvent)(
                        conn.display,
                        u32::from(conn.pause_keycode),
                        xlib::False,
                        CURRENT_TIME,
                    ),
                }
            };
            if status == 0 {
                refused.push(*event);
            }
        }

        unsafe {
            (conn.xlib.XFlush)(conn.display);
        }
        settle_batch(batch, &refused)
    }
}

/// Delivered count for a batch, or the rejection naming every refused event
fn settle_batch(batch: &InputBatch, refused: &[SyntheticInput]) -> HostResult<usize> {
    if refused.is_empty() {
        return Ok(batch.len());
    }
    Err(HostError::InjectionRejected(format!(
        "XTest refused {} of {} events: {:?}",
        refused.len(),
        batch.len(),
        refused
    )))
}

/// Asks the session screensaver service to treat the tick as user activity
pub struct DbusActivityInjector {
    proxy: Proxy<'static>,
}

impl DbusActivityInjector {
    pub fn connect() -> HostResult<Self> {
        let connection = Connection::session().map_err(dbus_error)?;
        let proxy = Proxy::new(
            &connection,
            SCREENSAVER_BUS,
            SCREENSAVER_PATH,
            SCREENSAVER_INTERFACE,
        )
        .map_err(dbus_error)?;
        Ok(Self { proxy })
    }
}

impl InputInjector for DbusActivityInjector {
    fn inject(&self, batch: &InputBatch) -> HostResult<usize> {
        let pings = activity_pings(batch);
        if pings == 0 {
            return Ok(0);
        }
        let _: () = self
            .proxy
            .call("SimulateUserActivity", &())
            .map_err(|e| HostError::InjectionRejected(e.to_string()))?;
        Ok(pings)
    }
}

/// One activity ping stands in for the whole batch
fn activity_pings(batch: &InputBatch) -> usize {
    usize::from(!batch.is_empty())
}

/// Whichever injector this session supports
pub enum LinuxInputInjector {
    XTest(XTestInjector),
    DbusActivity(DbusActivityInjector),
    Unavailable,
}

impl LinuxInputInjector {
    /// Probe XTest first, then the session screensaver service
    pub fn detect() -> Self {
        match XTestInjector::open() {
            Ok(injector) => {
                info!("Synthetic input via XTest");
                return Self::XTest(injector);
            }
            Err(e) => debug!(error = %e, "XTest unavailable"),
        }

        match DbusActivityInjector::connect() {
            Ok(injector) => {
                info!("Synthetic input via D-Bus SimulateUserActivity");
                Self::DbusActivity(injector)
            }
            Err(e) => {
                warn!(error = %e, "No synthetic input backend available");
                Self::Unavailable
            }
        }
    }

    /// Only synthetic input needs a backend; declarative suppression never
    /// opens a display or a bus connection for input
    pub fn for_mode(mode: &SuppressionMode) -> Self {
        match mode {
            SuppressionMode::SyntheticInput { .. } => Self::detect(),
            SuppressionMode::Declarative => Self::Unavailable,
        }
    }

    pub fn backend(&self) -> InputBackend {
        match self {
            LinuxInputInjector::XTest(_) => InputBackend::XTest,
            LinuxInputInjector::DbusActivity(_) => InputBackend::DbusActivity,
            LinuxInputInjector::Unavailable => InputBackend::None,
        }
    }
}

impl InputInjector for LinuxInputInjector {
    fn inject(&self, batch: &InputBatch) -> HostResult<usize> {
        match self {
            LinuxInputInjector::XTest(injector) => injector.inject(batch),
            LinuxInputInjector::DbusActivity(injector) => injector.inject(batch),
            LinuxInputInjector::Unavailable => Err(HostError::Unavailable(
                "no synthetic input backend".into(),
            )),
        }
    }
}
