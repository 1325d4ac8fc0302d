//! Shared types for the wakeguard data model

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use wakeguard_util::InstanceName;

/// Interval requested for synthetic input is outside the accepted range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interval {value}s is outside {min}..={max}s")]
pub struct IntervalOutOfRange {
    pub value: i64,
    pub min: u32,
    pub max: u32,
}

/// Period between synthetic input ticks, always within
/// [`TickInterval::MIN_SECS`]..=[`TickInterval::MAX_SECS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TickInterval(u32);

impl TickInterval {
    pub const MIN_SECS: u32 = 10;
    pub const MAX_SECS: u32 = 3600;
    pub const DEFAULT_SECS: u32 = 10;

    pub const DEFAULT: Self = Self(Self::DEFAULT_SECS);

    pub fn from_secs(secs: i64) -> Result<Self, IntervalOutOfRange> {
        if (Self::MIN_SECS as i64..=Self::MAX_SECS as i64).contains(&secs) {
            Ok(Self(secs as u32))
        } else {
            Err(IntervalOutOfRange {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            })
        }
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }

    /// Whole minutes and leftover seconds, as shown in the status prompt
    pub fn minutes_and_seconds(&self) -> (u32, u32) {
        (self.0 / 60, self.0 % 60)
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for TickInterval {
    type Error = IntervalOutOfRange;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        Self::from_secs(i64::from(secs))
    }
}

impl From<TickInterval> for u32 {
    fn from(interval: TickInterval) -> Self {
        interval.0
    }
}

impl fmt::Display for TickInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (minutes, seconds) = self.minutes_and_seconds();
        write!(f, "{} min {} s", minutes, seconds)
    }
}

/// Kind tag for a suppression mode, used to pick the instance lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionKind {
    Declarative,
    SyntheticInput,
}

impl SuppressionKind {
    pub fn instance_name(&self) -> InstanceName {
        match self {
            SuppressionKind::Declarative => InstanceName::declarative(),
            SuppressionKind::SyntheticInput => InstanceName::synthetic_input(),
        }
    }
}

/// How the idle timer is kept from expiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SuppressionMode {
    /// One persistent "stay awake" declaration to the OS, no schedule
    Declarative,
    /// Periodic zero-effect input emission
    SyntheticInput { interval: TickInterval },
}

impl SuppressionMode {
    pub fn synthetic(interval: TickInterval) -> Self {
        Self::SyntheticInput { interval }
    }

    pub fn kind(&self) -> SuppressionKind {
        match self {
            SuppressionMode::Declarative => SuppressionKind::Declarative,
            SuppressionMode::SyntheticInput { .. } => SuppressionKind::SyntheticInput,
        }
    }

    pub fn interval(&self) -> Option<TickInterval> {
        match self {
            SuppressionMode::Declarative => None,
            SuppressionMode::SyntheticInput { interval } => Some(*interval),
        }
    }
}

impl fmt::Display for SuppressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressionMode::Declarative => write!(f, "declarative"),
            SuppressionMode::SyntheticInput { interval } => {
                write!(f, "synthetic input every {}", interval)
            }
        }
    }
}

/// Snapshot of what the suppression engine holds
///
/// A state is never updated in place: asserting produces an active state,
/// teardown produces a fresh baseline state for the same mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionState {
    active: bool,
    mode: SuppressionMode,
    since: Option<DateTime<Local>>,
}

impl SuppressionState {
    /// Suppression asserted at `since`
    pub fn active(mode: SuppressionMode, since: DateTime<Local>) -> Self {
        Self {
            active: true,
            mode,
            since: Some(since),
        }
    }

    /// Nothing asserted; the OS is at its own idle behavior
    pub fn baseline(mode: SuppressionMode) -> Self {
        Self {
            active: false,
            mode,
            since: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> SuppressionMode {
        self.mode
    }

    pub fn interval_secs(&self) -> Option<u32> {
        self.mode.interval().map(|i| i.as_secs())
    }

    pub fn since(&self) -> Option<DateTime<Local>> {
        self.since
    }
}

/// Tray menu item identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrayMenuId {
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayMenuItem {
    pub id: TrayMenuId,
    pub label: String,
}

/// What the tray shows for the current suppression state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayPresence {
    pub visible: bool,
    pub tooltip: String,
    pub menu: Vec<TrayMenuItem>,
}

impl TrayPresence {
    pub fn for_state(state: &SuppressionState) -> Self {
        let tooltip = match (state.is_active(), state.mode()) {
            (false, _) => "Screensaver suppression stopped".to_string(),
            (true, SuppressionMode::Declarative) => "Suppressing the screensaver".to_string(),
            (true, SuppressionMode::SyntheticInput { interval }) => {
                format!("Suppressing the screensaver (input every {})", interval)
            }
        };

        Self {
            visible: state.is_active(),
            tooltip,
            menu: vec![TrayMenuItem {
                id: TrayMenuId::Exit,
                label: "Exit".into(),
            }],
        }
    }
}

/// Content of a status prompt or informational message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub title: String,
    pub body: String,
    pub confirm_label: String,
    pub dismiss_label: String,
}
