//! Synthetic input model

use serde::{Deserialize, Serialize};

/// Keys the injector knows how to release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Bound to nothing in practice, so releasing it has no visible effect
    Pause,
}

/// One synthetic input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyntheticInput {
    /// Pointer motion relative to the current position
    PointerMotion { dx: i32, dy: i32 },
    /// Key release without a matching press
    KeyRelease { key: Key },
}

impl SyntheticInput {
    /// True if delivering this event cannot move the cursor or trigger a binding
    pub fn is_zero_effect(&self) -> bool {
        match self {
            SyntheticInput::PointerMotion { dx, dy } => *dx == 0 && *dy == 0,
            SyntheticInput::KeyRelease { .. } => true,
        }
    }
}

/// Marker attached to injected batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionTag {
    /// Injected only to reset the idle timer
    NoUiEffect,
}

/// Events injected together, in order, as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBatch {
    events: Vec<SyntheticInput>,
    tag: InjectionTag,
}

impl InputBatch {
    /// The batch sent on every suppression tick: a zero-magnitude pointer
    /// motion followed by a release of [`Key::Pause`]
    pub fn idle_reset() -> Self {
        Self {
            events: vec![
                SyntheticInput::PointerMotion { dx: 0, dy: 0 },
                SyntheticInput::KeyRelease { key: Key::Pause },
            ],
            tag: InjectionTag::NoUiEffect,
        }
    }

    pub fn events(&self) -> &[SyntheticInput] {
        &self.events
    }

    pub fn tag(&self) -> InjectionTag {
        self.tag
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
